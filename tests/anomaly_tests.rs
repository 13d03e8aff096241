// Anomaly evaluation: fixed thresholds, fixed order, sentinel on no alerts

mod common;

use healthmon::anomaly::{self, NO_ALERTS};

#[test]
fn test_memory_alert_only() {
    let snapshot = common::snapshot_with_usage(1, 95, 50, 50.0);
    let alerts = anomaly::evaluate(&snapshot);
    assert_eq!(alerts, vec!["High memory usage (95%)".to_string()]);
}

#[test]
fn test_no_alerts_sentinel() {
    let snapshot = common::snapshot_with_usage(1, 50, 50, 50.0);
    let alerts = anomaly::evaluate(&snapshot);
    assert_eq!(alerts, vec![NO_ALERTS.to_string()]);
}

#[test]
fn test_all_three_alerts_in_memory_cpu_disk_order() {
    let snapshot = common::snapshot_with_usage(1, 95, 90, 99.0);
    let alerts = anomaly::evaluate(&snapshot);
    assert_eq!(
        alerts,
        vec![
            "High memory usage (95%)".to_string(),
            "High CPU usage (90%)".to_string(),
            "High disk usage (99%)".to_string(),
        ]
    );
}

#[test]
fn test_thresholds_are_exclusive() {
    // Exactly at the thresholds nothing fires
    let snapshot = common::snapshot_with_usage(1, 90, 85, 95.0);
    let alerts = anomaly::evaluate(&snapshot);
    assert_eq!(alerts, vec![NO_ALERTS.to_string()]);
}

#[test]
fn test_missing_partition_skips_disk_check_only() {
    let mut snapshot = common::snapshot_with_usage(1, 95, 50, 99.0);
    snapshot.health.diskinfo.clear();
    let alerts = anomaly::evaluate(&snapshot);
    assert_eq!(alerts, vec!["High memory usage (95%)".to_string()]);
}

#[test]
fn test_evaluate_is_deterministic() {
    let snapshot = common::snapshot_with_usage(1, 95, 90, 99.0);
    assert_eq!(anomaly::evaluate(&snapshot), anomaly::evaluate(&snapshot));
}
