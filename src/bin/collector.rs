// Standalone receiving collector: POST /health appends to a flat JSON
// array log file, GET /health returns it.

use anyhow::Result;
use healthmon::collector::{self, CollectorState};
use healthmon::config::AppConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let app_config = AppConfig::load()?;
    let state = CollectorState::new(PathBuf::from(&app_config.collector.log_file))?;
    let app = collector::app(state);

    let listener = tokio::net::TcpListener::bind(&app_config.collector.listen).await?;
    tracing::info!(
        log_file = %app_config.collector.log_file,
        "Collector listening on http://{}",
        app_config.collector.listen
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Received shutdown signal");
        })
        .await?;

    Ok(())
}
