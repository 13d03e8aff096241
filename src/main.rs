use anyhow::Result;
use healthmon::*;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    let identity = snapshot::WorkerIdentity::resolve(&app_config.agent).await;
    tracing::info!(
        worker = %identity.name,
        project = %identity.project,
        version = %identity.version,
        commit = %identity.commit,
        "healthmon starting"
    );

    let metrics_repo = Arc::new(metrics_repo::MetricsRepo::new());
    let builder = Arc::new(snapshot::SnapshotBuilder::new(metrics_repo, identity));
    let journal = journal::Journal::new(&app_config.journal.path, app_config.journal.max_entries);
    let delivery = Arc::new(delivery::DeliveryClient::new(&app_config.delivery)?);
    let logs = logbuf::LogBuffer::new();

    let monitor = monitor::HealthMonitor::new(monitor::MonitorDeps {
        builder,
        journal: journal.clone(),
        delivery,
        logs,
    });

    let interval = Duration::from_secs(app_config.monitoring.poll_interval_secs);
    monitor.start(interval, app_config.monitoring.max_captures);

    if app_config.monitoring.max_captures.is_some() {
        // Bounded run: wait until the capture ceiling stops the loop, then
        // read the journal back for a completion summary.
        let completion = async {
            while monitor.is_running() {
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
            monitor.wait_for_completion().await;
        };
        tokio::select! {
            _ = completion => {
                match journal.load().await {
                    Ok(entries) => tracing::info!(
                        captures = monitor.capture_count(),
                        journal_entries = entries.len(),
                        "monitoring completed"
                    ),
                    Err(e) => tracing::warn!(error = %e, "failed to read journal back"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received shutdown signal");
                monitor.stop().await;
            }
        }
    } else {
        tokio::signal::ctrl_c().await?;
        tracing::info!("Received shutdown signal");
        monitor.stop().await;
    }

    Ok(())
}
