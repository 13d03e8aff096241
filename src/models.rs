// Wire models (ported from the legacy Python agent's JSON shapes)

use serde::{Deserialize, Serialize};

/// Disk I/O counters since boot (completed read/write operations).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiskCounters {
    pub reads: u64,
    pub writes: u64,
}

/// Memory: total in MiB, used as a whole percent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryUsage {
    pub total: u64,
    pub used: u64,
}

/// Load averages as 2-decimal strings plus a human-readable uptime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadAverage {
    pub min1: String,
    pub min5: String,
    pub min15: String,
    pub uptime: String,
}

impl Default for LoadAverage {
    fn default() -> Self {
        Self {
            min1: "0.00".into(),
            min5: "0.00".into(),
            min15: "0.00".into(),
            uptime: "unknown".into(),
        }
    }
}

/// CPU time split in whole percents: system, io-wait, idle, user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuBreakdown {
    pub sy: u32,
    pub wa: u32,
    pub id: u32,
    pub us: u32,
}

impl Default for CpuBreakdown {
    fn default() -> Self {
        // Idle-assumed-healthy when the breakdown can't be read
        Self {
            sy: 0,
            wa: 0,
            id: 100,
            us: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionUsage {
    /// Capacity in KiB.
    pub total: u64,
    /// Mount point.
    pub name: String,
    /// Used percent, 2 decimals.
    pub used: f64,
    #[serde(rename = "type")]
    pub type_: String,
}

impl Default for PartitionUsage {
    fn default() -> Self {
        Self {
            total: 0,
            name: "/unknown".into(),
            used: 0.0,
            type_: "unknown".into(),
        }
    }
}

/// Whole-KiB transmit/receive totals across all interfaces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkCounters {
    pub txbytes: u64,
    pub rxbytes: u64,
}

/// The one resolved primary IPv4 address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryIp {
    pub interface: String,
    pub ip: String,
    pub netmask: Option<String>,
    #[serde(rename = "type")]
    pub type_: String,
}

impl PrimaryIp {
    pub fn primary(ip: String) -> Self {
        Self {
            interface: "primary".into(),
            ip,
            netmask: None,
            type_: "IPv4".into(),
        }
    }

    /// Loopback fallback when no interface can be resolved.
    pub fn loopback() -> Self {
        Self {
            interface: "localhost".into(),
            ip: "127.0.0.1".into(),
            netmask: Some("255.0.0.0".into()),
            type_: "IPv4".into(),
        }
    }
}

impl Default for PrimaryIp {
    fn default() -> Self {
        Self::loopback()
    }
}

/// The `health` metrics block of a snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthMetrics {
    pub diskrw: DiskCounters,
    /// Logical CPU core count.
    pub core: u32,
    pub memory: MemoryUsage,
    pub load: LoadAverage,
    pub cpu: CpuBreakdown,
    pub diskinfo: Vec<PartitionUsage>,
    pub network: NetworkCounters,
}

/// One immutable, timestamped measurement of host health.
///
/// Every field is present with a defined default even when the underlying
/// OS read fails; no component mutates a snapshot after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    pub name: String,
    pub stype: String,
    pub project: String,
    pub env: String,
    /// Creation timestamp, epoch ms. Strictly monotonic within one run.
    pub ct: u64,
    /// Last-modified timestamp, epoch ms.
    pub mt: u64,
    /// Alive timestamp, epoch ms.
    pub alivets: u64,
    /// 1 while the monitor runs, 0 otherwise.
    pub status: u8,
    pub running: bool,
    /// Monitor start time, epoch ms.
    pub starttime: u64,
    /// Monitor stop time, epoch ms; 0 while running.
    pub stoptime: u64,
    pub version: String,
    pub user: String,
    /// Deployment timestamp; mirrors starttime.
    pub deploy: u64,
    pub commit: String,
    pub ip: PrimaryIp,
    /// Poll interval in ms.
    pub poll: u64,
    pub health: HealthMetrics,
}

/// One buffered log record delivered alongside a health payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    /// Creation timestamp, epoch ms.
    pub ct: u64,
    pub level: u8,
    pub msg: String,
}
