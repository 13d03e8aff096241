// OS metric sources via sysinfo + /proc (psutil equivalent).
// Every accessor can fail on its own; the snapshot builder substitutes
// documented defaults instead of aborting the cycle.

use crate::models::{
    CpuBreakdown, DiskCounters, LoadAverage, MemoryUsage, NetworkCounters, PartitionUsage,
    PrimaryIp,
};
use std::net::UdpSocket;
use std::sync::Arc;
use std::time::Duration;
use sysinfo::{Disks, Networks, System};

mod linux;

/// Gap between the two /proc/stat samples used for the CPU time split.
const CPU_SAMPLE_WINDOW: Duration = Duration::from_millis(250);

pub struct MetricsRepo {
    sys: Arc<std::sync::Mutex<System>>,
    disks: Arc<std::sync::Mutex<Disks>>,
    networks: Arc<std::sync::Mutex<Networks>>,
}

impl Default for MetricsRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRepo {
    pub fn new() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();
        let disks = Disks::new_with_refreshed_list();
        let networks = Networks::new_with_refreshed_list();
        Self {
            sys: Arc::new(std::sync::Mutex::new(sys)),
            disks: Arc::new(std::sync::Mutex::new(disks)),
            networks: Arc::new(std::sync::Mutex::new(networks)),
        }
    }

    /// Logical CPU core count.
    pub async fn core_count(&self) -> anyhow::Result<u32> {
        let sys = self.sys.clone();
        tokio::task::spawn_blocking(move || {
            let sys = sys
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;
            Ok(sys.cpus().len() as u32)
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }

    /// Memory total in MiB and used as a whole percent.
    pub async fn memory(&self) -> anyhow::Result<MemoryUsage> {
        let sys = self.sys.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;
            sys.refresh_memory();

            let total = sys.total_memory();
            let available = sys.available_memory();
            let used = total.saturating_sub(available);
            let used_percent = if total > 0 {
                ((used as f64 / total as f64) * 100.0).round() as u64
            } else {
                0
            };

            Ok(MemoryUsage {
                total: total / (1024 * 1024),
                used: used_percent,
            })
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }

    /// CPU time split over a short sampling window. /proc/stat on Linux;
    /// elsewhere approximated from the aggregate usage figure.
    pub async fn cpu_breakdown(&self) -> anyhow::Result<CpuBreakdown> {
        let sys = self.sys.clone();
        tokio::task::spawn_blocking(move || {
            if let Some(split) = linux::read_cpu_breakdown(CPU_SAMPLE_WINDOW) {
                return Ok(split);
            }

            let mut sys = sys
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;
            sys.refresh_cpu_all();
            std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
            sys.refresh_cpu_all();

            let usage = (sys.global_cpu_usage() as f64).clamp(0.0, 100.0);
            Ok(CpuBreakdown {
                sy: (usage * 0.3).round() as u32,
                wa: 0,
                id: (100.0 - usage).round() as u32,
                us: (usage * 0.7).round() as u32,
            })
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }

    /// Completed read/write operations since boot, summed over block devices.
    pub async fn disk_io(&self) -> anyhow::Result<DiskCounters> {
        tokio::task::spawn_blocking(|| {
            linux::read_disk_counters()
                .ok_or_else(|| anyhow::anyhow!("disk I/O counters unavailable on this platform"))
        })
        .await
        .map_err(|e| anyhow::anyhow!("disk counters task join: {}", e))?
    }

    /// 1/5/15-minute load averages plus human-readable uptime.
    pub async fn load_average(&self) -> anyhow::Result<LoadAverage> {
        tokio::task::spawn_blocking(|| {
            let load = System::load_average();
            Ok(LoadAverage {
                min1: format!("{:.2}", load.one),
                min5: format!("{:.2}", load.five),
                min15: format!("{:.2}", load.fifteen),
                uptime: format_uptime(System::uptime()),
            })
        })
        .await
        .map_err(|e| anyhow::anyhow!("load average task join: {}", e))?
    }

    /// Usage for every readable partition, in mount order. May be empty.
    pub async fn partitions(&self) -> anyhow::Result<Vec<PartitionUsage>> {
        let disks = self.disks.clone();
        tokio::task::spawn_blocking(move || {
            let mut disks_guard = disks
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo disks lock poisoned: {}", e))?;
            disks_guard.refresh(false);
            let partitions: Vec<PartitionUsage> = disks_guard
                .list()
                .iter()
                .filter(|d| d.total_space() > 0)
                .map(|d| {
                    let total = d.total_space();
                    let used = total.saturating_sub(d.available_space());
                    let used_percent = (used as f64 / total as f64) * 100.0;
                    PartitionUsage {
                        total: total / 1024,
                        name: d.mount_point().to_string_lossy().into_owned(),
                        used: (used_percent * 100.0).round() / 100.0,
                        type_: d.file_system().to_string_lossy().into_owned(),
                    }
                })
                .collect();
            Ok(partitions)
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }

    /// Whole-KiB transmit/receive totals summed across interfaces.
    pub async fn network(&self) -> anyhow::Result<NetworkCounters> {
        let networks = self.networks.clone();
        tokio::task::spawn_blocking(move || {
            let mut networks_guard = networks
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo networks lock poisoned: {}", e))?;
            networks_guard.refresh(true);
            let (tx, rx) = networks_guard
                .list()
                .iter()
                .fold((0u64, 0u64), |(tx, rx), (_, data)| {
                    (
                        tx.saturating_add(data.total_transmitted()),
                        rx.saturating_add(data.total_received()),
                    )
                });
            Ok(NetworkCounters {
                txbytes: tx / 1024,
                rxbytes: rx / 1024,
            })
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }

    /// Resolve the primary IPv4 address via a connected UDP socket
    /// (no packet is sent; the OS just picks the outbound interface).
    pub fn primary_ip(&self) -> anyhow::Result<PrimaryIp> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))?;
        socket.connect(("8.8.8.8", 80))?;
        let addr = socket.local_addr()?;
        anyhow::ensure!(addr.is_ipv4(), "resolved address is not IPv4");
        Ok(PrimaryIp::primary(addr.ip().to_string()))
    }
}

/// "N days, H hours" / "H hours" / "< 1 hour".
fn format_uptime(uptime_secs: u64) -> String {
    let days = uptime_secs / 86_400;
    let hours = (uptime_secs % 86_400) / 3_600;
    if days > 0 {
        format!("{} days, {} hours", days, hours)
    } else if hours > 0 {
        format!("{} hours", hours)
    } else {
        "< 1 hour".into()
    }
}

#[cfg(test)]
mod tests {
    use super::format_uptime;

    #[test]
    fn uptime_formats_days_hours_and_sub_hour() {
        assert_eq!(format_uptime(30), "< 1 hour");
        assert_eq!(format_uptime(2 * 3600 + 120), "2 hours");
        assert_eq!(format_uptime(3 * 86_400 + 5 * 3600), "3 days, 5 hours");
    }
}
