// Threshold-based anomaly evaluation. Pure function of a snapshot; the
// check order (memory, cpu, disk) fixes the alert order.

use crate::models::Snapshot;

const MEMORY_USED_THRESHOLD: u64 = 90;
const CPU_USED_THRESHOLD: u32 = 85;
const DISK_USED_THRESHOLD: f64 = 95.0;

/// Sentinel returned when no threshold fires. Callers must not read this
/// as an empty or absent result.
pub const NO_ALERTS: &str = "No alerts detected";

pub fn evaluate(snapshot: &Snapshot) -> Vec<String> {
    let mut alerts = Vec::new();
    let health = &snapshot.health;

    if health.memory.used > MEMORY_USED_THRESHOLD {
        alerts.push(format!("High memory usage ({}%)", health.memory.used));
    }
    if health.cpu.us > CPU_USED_THRESHOLD {
        alerts.push(format!("High CPU usage ({}%)", health.cpu.us));
    }
    // Disk check reads the first partition only; a missing entry fails
    // this check alone, never the evaluation.
    match health.diskinfo.first() {
        Some(partition) => {
            if partition.used > DISK_USED_THRESHOLD {
                alerts.push(format!("High disk usage ({}%)", partition.used));
            }
        }
        None => {
            tracing::warn!(operation = "check_disk_usage", "no partition entry; disk check skipped");
        }
    }

    if alerts.is_empty() {
        alerts.push(NO_ALERTS.into());
    }
    alerts
}
