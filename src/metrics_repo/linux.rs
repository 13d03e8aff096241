// Linux-specific readers: /proc/stat CPU time split, /proc/diskstats counters.

use crate::models::{CpuBreakdown, DiskCounters};
use std::time::Duration;

/// Sample /proc/stat twice `window` apart and convert the tick deltas to
/// whole percents. Blocking; callers run this on the blocking pool.
pub(super) fn read_cpu_breakdown(window: Duration) -> Option<CpuBreakdown> {
    #[cfg(target_os = "linux")]
    {
        sample_cpu_split(window)
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = window;
        None
    }
}

/// Sum completed read/write operations from /proc/diskstats, restricted to
/// whole devices listed under /sys/block (skips per-partition rows).
pub(super) fn read_disk_counters() -> Option<DiskCounters> {
    #[cfg(target_os = "linux")]
    {
        sum_disk_counters()
    }
    #[cfg(not(target_os = "linux"))]
    None
}

/// Aggregate CPU tick counters from the first line of /proc/stat.
#[cfg(target_os = "linux")]
#[derive(Clone, Copy)]
struct CpuTicks {
    user: u64,
    nice: u64,
    system: u64,
    idle: u64,
    iowait: u64,
    irq: u64,
    softirq: u64,
    steal: u64,
}

#[cfg(target_os = "linux")]
impl CpuTicks {
    fn total(&self) -> u64 {
        self.user
            + self.nice
            + self.system
            + self.idle
            + self.iowait
            + self.irq
            + self.softirq
            + self.steal
    }
}

#[cfg(target_os = "linux")]
fn read_cpu_ticks() -> Option<CpuTicks> {
    let content = std::fs::read_to_string("/proc/stat").ok()?;
    let line = content.lines().find(|l| l.starts_with("cpu "))?;
    let mut fields = line.split_whitespace().skip(1);
    let mut next = move || fields.next().and_then(|v| v.parse::<u64>().ok());
    Some(CpuTicks {
        user: next()?,
        nice: next()?,
        system: next()?,
        idle: next()?,
        iowait: next().unwrap_or(0),
        irq: next().unwrap_or(0),
        softirq: next().unwrap_or(0),
        steal: next().unwrap_or(0),
    })
}

#[cfg(target_os = "linux")]
fn sample_cpu_split(window: Duration) -> Option<CpuBreakdown> {
    let first = read_cpu_ticks()?;
    std::thread::sleep(window);
    let second = read_cpu_ticks()?;

    let total = second.total().saturating_sub(first.total());
    if total == 0 {
        return None;
    }
    let pct = |a: u64, b: u64| {
        let delta = b.saturating_sub(a);
        ((delta as f64 / total as f64) * 100.0).round() as u32
    };
    Some(CpuBreakdown {
        sy: pct(first.system, second.system),
        wa: pct(first.iowait, second.iowait),
        id: pct(first.idle, second.idle),
        us: pct(first.user + first.nice, second.user + second.nice),
    })
}

#[cfg(target_os = "linux")]
fn sum_disk_counters() -> Option<DiskCounters> {
    let devices: std::collections::HashSet<String> = std::fs::read_dir("/sys/block")
        .ok()?
        .filter_map(|entry| Some(entry.ok()?.file_name().to_string_lossy().into_owned()))
        .collect();

    let content = std::fs::read_to_string("/proc/diskstats").ok()?;
    let mut reads = 0u64;
    let mut writes = 0u64;
    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        // major minor name reads-completed ... writes-completed at index 7
        if fields.len() < 8 || !devices.contains(fields[2]) {
            continue;
        }
        reads = reads.saturating_add(fields[3].parse().unwrap_or(0));
        writes = writes.saturating_add(fields[7].parse().unwrap_or(0));
    }
    Some(DiskCounters { reads, writes })
}
