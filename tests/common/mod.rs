// Shared test helpers

#![allow(dead_code)]

use healthmon::models::*;

/// Snapshot with chosen memory/cpu/disk usage figures; everything else is
/// fixed plausible data.
pub fn snapshot_with_usage(ct: u64, mem_used: u64, cpu_used: u32, disk_used: f64) -> Snapshot {
    Snapshot {
        id: "w1".into(),
        name: "worker-testhost-1".into(),
        stype: "worker".into(),
        project: "healthmon".into(),
        env: "test".into(),
        ct,
        mt: ct,
        alivets: ct,
        status: 1,
        running: true,
        starttime: ct,
        stoptime: 0,
        version: "v1.0.0".into(),
        user: "tester".into(),
        deploy: ct,
        commit: "unknown".into(),
        ip: PrimaryIp::loopback(),
        poll: 10_000,
        health: HealthMetrics {
            diskrw: DiskCounters {
                reads: 10,
                writes: 5,
            },
            core: 4,
            memory: MemoryUsage {
                total: 16_000,
                used: mem_used,
            },
            load: LoadAverage::default(),
            cpu: CpuBreakdown {
                sy: 5,
                wa: 0,
                id: 100u32.saturating_sub(cpu_used),
                us: cpu_used,
            },
            diskinfo: vec![PartitionUsage {
                total: 1_000_000,
                name: "/".into(),
                used: disk_used,
                type_: "ext4".into(),
            }],
            network: NetworkCounters {
                txbytes: 100,
                rxbytes: 200,
            },
        },
    }
}

pub fn sample_snapshot(ct: u64) -> Snapshot {
    snapshot_with_usage(ct, 50, 10, 40.0)
}
