// Wire model tests: field names, fallback defaults, JSON roundtrip

mod common;

use healthmon::models::*;

#[test]
fn test_snapshot_serializes_wire_field_names() {
    let snapshot = common::sample_snapshot(1_700_000_000_000);
    let json = serde_json::to_string(&snapshot).unwrap();
    assert!(json.contains("\"alivets\""));
    assert!(json.contains("\"starttime\""));
    assert!(json.contains("\"stoptime\""));
    assert!(json.contains("\"diskrw\""));
    assert!(json.contains("\"diskinfo\""));
    assert!(json.contains("\"txbytes\""));
    assert!(json.contains("\"rxbytes\""));
    assert!(json.contains("\"min15\""));
}

#[test]
fn test_partition_and_ip_serialize_type_key() {
    let partition = PartitionUsage::default();
    let json = serde_json::to_string(&partition).unwrap();
    assert!(json.contains("\"type\":\"unknown\""));
    assert!(!json.contains("type_"));

    let ip = PrimaryIp::loopback();
    let json = serde_json::to_string(&ip).unwrap();
    assert!(json.contains("\"type\":\"IPv4\""));
}

#[test]
fn test_snapshot_json_roundtrip() {
    let snapshot = common::snapshot_with_usage(42, 95, 90, 99.0);
    let json = serde_json::to_string_pretty(&snapshot).unwrap();
    let back: Snapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back.ct, 42);
    assert_eq!(back.health.memory.used, 95);
    assert_eq!(back.health.cpu.us, 90);
    assert_eq!(back.health.diskinfo[0].used, 99.0);
    assert_eq!(back.ip.ip, "127.0.0.1");
}

#[test]
fn test_cpu_breakdown_default_is_idle() {
    let cpu = CpuBreakdown::default();
    assert_eq!(cpu.sy, 0);
    assert_eq!(cpu.wa, 0);
    assert_eq!(cpu.id, 100);
    assert_eq!(cpu.us, 0);
}

#[test]
fn test_load_average_default() {
    let load = LoadAverage::default();
    assert_eq!(load.min1, "0.00");
    assert_eq!(load.min5, "0.00");
    assert_eq!(load.min15, "0.00");
    assert_eq!(load.uptime, "unknown");
}

#[test]
fn test_partition_default_is_synthetic_unknown() {
    let partition = PartitionUsage::default();
    assert_eq!(partition.total, 0);
    assert_eq!(partition.name, "/unknown");
    assert_eq!(partition.used, 0.0);
    assert_eq!(partition.type_, "unknown");
}

#[test]
fn test_primary_ip_loopback_fallback() {
    let ip = PrimaryIp::loopback();
    assert_eq!(ip.interface, "localhost");
    assert_eq!(ip.ip, "127.0.0.1");
    assert_eq!(ip.netmask.as_deref(), Some("255.0.0.0"));
    assert_eq!(ip.type_, "IPv4");
}

#[test]
fn test_counter_defaults_are_zero() {
    let diskrw = DiskCounters::default();
    assert_eq!((diskrw.reads, diskrw.writes), (0, 0));
    let network = NetworkCounters::default();
    assert_eq!((network.txbytes, network.rxbytes), (0, 0));
}
