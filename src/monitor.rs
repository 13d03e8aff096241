// Monitor loop: the only component with mutable run state. Drives
// build -> evaluate -> persist -> deliver once per tick on a background
// task; start/stop synchronize with the loop through the shared state
// mutex and a watch-channel shutdown flag.

use crate::anomaly;
use crate::delivery::{CycleReport, DeliveryClient};
use crate::journal::{Journal, JournalError};
use crate::logbuf::LogBuffer;
use crate::snapshot::{RunInfo, SnapshotBuilder, now_ms};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How long stop() waits for the in-flight tick before returning anyway.
const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Pause after a failed tick before trying again.
const TICK_FAILURE_BACKOFF: Duration = Duration::from_secs(5);

/// Everything a tick needs, injected explicitly (no process-wide state).
#[derive(Clone)]
pub struct MonitorDeps {
    pub builder: Arc<SnapshotBuilder>,
    pub journal: Journal,
    pub delivery: Arc<DeliveryClient>,
    pub logs: LogBuffer,
}

#[derive(Debug)]
struct MonitorState {
    running: bool,
    poll_interval: Duration,
    capture_count: u64,
    max_captures: Option<u64>,
    start_time_ms: u64,
    stop_time_ms: u64,
}

impl Default for MonitorState {
    fn default() -> Self {
        Self {
            running: false,
            poll_interval: Duration::from_secs(10),
            capture_count: 0,
            max_captures: None,
            start_time_ms: 0,
            stop_time_ms: 0,
        }
    }
}

/// Read-only view of the run state for callers.
#[derive(Debug, Clone)]
pub struct MonitorStatus {
    pub running: bool,
    pub captures_collected: u64,
    pub max_captures: Option<u64>,
    pub poll_interval: Duration,
}

/// What one tick produced. Each step's result is explicit so callers and
/// tests can see failure reasons instead of swallowed errors.
#[derive(Debug)]
pub struct TickReport {
    pub ct: u64,
    pub alerts: Vec<String>,
    pub journal: Result<(), JournalError>,
    pub delivery: CycleReport,
}

struct LoopHandle {
    join: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
}

pub struct HealthMonitor {
    deps: MonitorDeps,
    state: Arc<Mutex<MonitorState>>,
    handle: Mutex<Option<LoopHandle>>,
}

impl HealthMonitor {
    pub fn new(deps: MonitorDeps) -> Self {
        Self {
            deps,
            state: Arc::new(Mutex::new(MonitorState::default())),
            handle: Mutex::new(None),
        }
    }

    /// Spawn the tick loop. No-op (with a warning) when already running.
    /// Returns whether a new run was started.
    pub fn start(&self, interval: Duration, max_captures: Option<u64>) -> bool {
        {
            let mut state = lock(&self.state);
            if state.running {
                tracing::warn!("monitor is already running");
                return false;
            }
            state.running = true;
            state.poll_interval = interval;
            state.max_captures = max_captures;
            state.capture_count = 0;
            state.start_time_ms = now_ms();
            state.stop_time_ms = 0;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(run_loop(
            self.deps.clone(),
            self.state.clone(),
            shutdown_rx,
        ));
        *lock(&self.handle) = Some(LoopHandle { join, shutdown_tx });
        tracing::info!(
            interval_secs = interval.as_secs_f64(),
            max_captures = ?max_captures,
            "health monitor started"
        );
        true
    }

    /// Stop the loop and wait (bounded) for the in-flight tick. Returns
    /// false without touching state when the monitor is not running.
    pub async fn stop(&self) -> bool {
        let captures = {
            let mut state = lock(&self.state);
            if !state.running {
                tracing::info!("monitor is not running");
                return false;
            }
            state.running = false;
            state.stop_time_ms = now_ms();
            state.capture_count
        };

        let handle = lock(&self.handle).take();
        if let Some(handle) = handle {
            let _ = handle.shutdown_tx.send(true);
            if tokio::time::timeout(STOP_JOIN_TIMEOUT, handle.join)
                .await
                .is_err()
            {
                tracing::warn!("tick loop did not finish within the join timeout");
            }
        }
        tracing::info!(captures, "health monitor stopped");
        true
    }

    /// Wait for the loop to exit on its own (bounded runs).
    pub async fn wait_for_completion(&self) {
        let handle = lock(&self.handle).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.join.await {
                tracing::warn!(error = %e, "tick loop task failed");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).running
    }

    pub fn capture_count(&self) -> u64 {
        lock(&self.state).capture_count
    }

    pub fn status(&self) -> MonitorStatus {
        let state = lock(&self.state);
        MonitorStatus {
            running: state.running,
            captures_collected: state.capture_count,
            max_captures: state.max_captures,
            poll_interval: state.poll_interval,
        }
    }

    /// Run a single tick outside the loop (one-shot capture, tests).
    pub async fn tick_once(&self) -> TickReport {
        let run = {
            let state = lock(&self.state);
            RunInfo {
                running: state.running,
                starttime: state.start_time_ms,
                stoptime: state.stop_time_ms,
                poll_ms: state.poll_interval.as_millis() as u64,
            }
        };
        run_tick(self.deps.clone(), run).await
    }
}

/// Mutex poisoning only happens if a holder panicked mid-update; the state
/// is plain data, so recover the guard and keep going.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn run_loop(
    deps: MonitorDeps,
    state: Arc<Mutex<MonitorState>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let interval = lock(&state).poll_interval;
    tracing::info!(
        interval_secs = interval.as_secs_f64(),
        "starting health monitoring loop"
    );
    deps.logs.info("health monitor started");

    loop {
        let run = {
            let state = lock(&state);
            if !state.running || *shutdown_rx.borrow() {
                break;
            }
            RunInfo {
                running: true,
                starttime: state.start_time_ms,
                stoptime: 0,
                poll_ms: state.poll_interval.as_millis() as u64,
            }
        };

        // The tick runs as its own task so a panic in any step surfaces
        // here as an error: logged, tick skipped, short backoff.
        let sleep_for = match tokio::spawn(run_tick(deps.clone(), run)).await {
            Ok(report) => {
                log_report(&report, &deps.logs);
                let reached_ceiling = {
                    let mut state = lock(&state);
                    state.capture_count += 1;
                    tracing::info!(capture = state.capture_count, "health data collected");
                    match state.max_captures {
                        Some(max) if state.capture_count >= max => {
                            tracing::info!(
                                max_captures = max,
                                "reached max captures, stopping monitor"
                            );
                            state.running = false;
                            state.stop_time_ms = now_ms();
                            true
                        }
                        _ => false,
                    }
                };
                if reached_ceiling {
                    break;
                }
                interval
            }
            Err(e) => {
                tracing::error!(error = %e, "tick failed, backing off");
                deps.logs.error(format!("tick failed: {}", e));
                TICK_FAILURE_BACKOFF
            }
        };

        tokio::select! {
            _ = tokio::time::sleep(sleep_for) => {}
            _ = shutdown_rx.changed() => {
                tracing::debug!("shutdown observed during sleep");
                break;
            }
        }
    }
    tracing::debug!("tick loop exiting");
}

async fn run_tick(deps: MonitorDeps, run: RunInfo) -> TickReport {
    let snapshot = deps.builder.build(&run).await;
    let alerts = anomaly::evaluate(&snapshot);
    let journal = deps.journal.append(&snapshot).await;
    let wire_logs = deps.logs.flush();
    let delivery = deps.delivery.cycle(&snapshot, &alerts, wire_logs).await;
    TickReport {
        ct: snapshot.ct,
        alerts,
        journal,
        delivery,
    }
}

fn log_report(report: &TickReport, logs: &LogBuffer) {
    let fired: Vec<&String> = report
        .alerts
        .iter()
        .filter(|a| a.as_str() != anomaly::NO_ALERTS)
        .collect();
    if !fired.is_empty() {
        tracing::warn!(alerts = ?fired, "anomaly thresholds exceeded");
        for alert in fired {
            logs.warn(alert.clone());
        }
    }
    if let Err(e) = &report.journal {
        tracing::warn!(error = %e, operation = "journal_append", "journal write failed");
    }
    if !report.delivery.health.is_ok() {
        tracing::warn!(
            outcome = %report.delivery.health.describe(),
            operation = "send_health",
            "health delivery failed"
        );
    }
    if !report.delivery.alerts.is_ok() {
        tracing::debug!(
            outcome = %report.delivery.alerts.describe(),
            operation = "fetch_alerts",
            "alert fetch failed"
        );
    }
    if !report.delivery.notify.is_ok() {
        tracing::debug!(
            outcome = %report.delivery.notify.describe(),
            operation = "send_notification",
            "notification failed"
        );
    }
}
