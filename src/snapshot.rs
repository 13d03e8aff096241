// Snapshot assembly: one-time identity resolution, per-tick build with
// per-field fallback defaults. build() never fails; a failed metric source
// degrades to its documented default.

use crate::config::AgentConfig;
use crate::metrics_repo::MetricsRepo;
use crate::models::{HealthMetrics, PartitionUsage, PrimaryIp, Snapshot};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use sysinfo::System;
use tokio::process::Command;
use uuid::Uuid;

/// Ceiling for each external `git` call during identity resolution.
const GIT_TIMEOUT: Duration = Duration::from_secs(5);

pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, operation = "get_timestamp", "system time error");
            0
        })
}

/// Stable per-process identity, resolved once at startup.
#[derive(Debug, Clone)]
pub struct WorkerIdentity {
    pub id: String,
    pub name: String,
    pub stype: String,
    pub project: String,
    pub env: String,
    pub version: String,
    pub commit: String,
    pub user: String,
}

impl WorkerIdentity {
    /// Resolve identity, filling anything the config leaves unset. External
    /// `git` lookups run under a bounded timeout and fall back to fixed
    /// tokens; resolution itself cannot fail.
    pub async fn resolve(cfg: &AgentConfig) -> Self {
        let id = short_uuid();
        let name = match &cfg.name {
            Some(name) => name.clone(),
            None => {
                let hostname = System::host_name().unwrap_or_else(|| "unknown-host".into());
                format!("worker-{}-{}", hostname, short_uuid())
            }
        };
        let project = match &cfg.project {
            Some(project) => project.clone(),
            None => project_from_git().await,
        };
        let version = match &cfg.version {
            Some(version) => version.clone(),
            None => version_from_git().await,
        };
        let commit = git_output(&["rev-parse", "HEAD"])
            .await
            .unwrap_or_else(|| "unknown".into());
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".into());

        Self {
            id,
            name,
            stype: cfg.stype.clone(),
            project,
            env: cfg.env.clone(),
            version,
            commit,
            user,
        }
    }
}

fn short_uuid() -> String {
    let mut s = Uuid::new_v4().simple().to_string();
    s.truncate(8);
    s
}

/// Run `git` with a bounded timeout; None on timeout, spawn failure,
/// non-zero exit, or empty output.
async fn git_output(args: &[&str]) -> Option<String> {
    let output = tokio::time::timeout(GIT_TIMEOUT, Command::new("git").args(args).output())
        .await
        .ok()?
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let out = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if out.is_empty() { None } else { Some(out) }
}

/// Repository name from the origin remote URL; current directory name
/// when there is no usable remote.
async fn project_from_git() -> String {
    let remote = git_output(&["remote", "get-url", "origin"]).await;
    if let Some(url) = remote
        && let Some(tail) = url.rsplit('/').next()
        && !tail.is_empty()
    {
        return tail.trim_end_matches(".git").to_string();
    }
    std::env::current_dir()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "unknown".into())
}

/// Latest tag, else `git-<short-hash>`, else a fixed fallback.
async fn version_from_git() -> String {
    if let Some(tag) = git_output(&["describe", "--tags", "--abbrev=0"]).await {
        return tag;
    }
    if let Some(hash) = git_output(&["rev-parse", "--short", "HEAD"]).await {
        return format!("git-{}", hash);
    }
    "v1.0.0".into()
}

/// Per-tick run state stamped into each snapshot by the monitor loop.
#[derive(Debug, Clone, Copy)]
pub struct RunInfo {
    pub running: bool,
    pub starttime: u64,
    pub stoptime: u64,
    pub poll_ms: u64,
}

pub struct SnapshotBuilder {
    repo: Arc<MetricsRepo>,
    identity: WorkerIdentity,
    /// Last issued ct; build() is called from the single tick task.
    last_ct: AtomicU64,
}

impl SnapshotBuilder {
    pub fn new(repo: Arc<MetricsRepo>, identity: WorkerIdentity) -> Self {
        Self {
            repo,
            identity,
            last_ct: AtomicU64::new(0),
        }
    }

    pub fn identity(&self) -> &WorkerIdentity {
        &self.identity
    }

    /// Assemble one immutable snapshot. Each metric source degrades to its
    /// documented default on failure; ct is strictly monotonic across calls.
    pub async fn build(&self, run: &RunInfo) -> Snapshot {
        let last = self.last_ct.load(Ordering::Acquire);
        let ct = now_ms().max(last + 1);
        self.last_ct.store(ct, Ordering::Release);

        let diskrw = or_default(self.repo.disk_io().await, "disk_io");
        let core = or_default(self.repo.core_count().await, "core_count");
        let memory = or_default(self.repo.memory().await, "memory");
        let load = or_default(self.repo.load_average().await, "load_average");
        let cpu = or_default(self.repo.cpu_breakdown().await, "cpu_breakdown");
        let network = or_default(self.repo.network().await, "network");
        let diskinfo = match self.repo.partitions().await {
            Ok(list) if !list.is_empty() => list,
            Ok(_) => vec![PartitionUsage::default()],
            Err(e) => {
                tracing::warn!(error = %e, operation = "partitions", "metric read failed, using default");
                vec![PartitionUsage::default()]
            }
        };
        let ip = match self.repo.primary_ip() {
            Ok(ip) => ip,
            Err(e) => {
                tracing::warn!(error = %e, operation = "primary_ip", "address resolution failed, using loopback");
                PrimaryIp::loopback()
            }
        };

        Snapshot {
            id: self.identity.id.clone(),
            name: self.identity.name.clone(),
            stype: self.identity.stype.clone(),
            project: self.identity.project.clone(),
            env: self.identity.env.clone(),
            ct,
            mt: ct,
            alivets: ct,
            status: if run.running { 1 } else { 0 },
            running: run.running,
            starttime: run.starttime,
            stoptime: run.stoptime,
            version: self.identity.version.clone(),
            user: self.identity.user.clone(),
            deploy: run.starttime,
            commit: self.identity.commit.clone(),
            ip,
            poll: run.poll_ms,
            health: HealthMetrics {
                diskrw,
                core,
                memory,
                load,
                cpu,
                diskinfo,
                network,
            },
        }
    }
}

fn or_default<T: Default>(result: anyhow::Result<T>, operation: &'static str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, operation, "metric read failed, using default");
            T::default()
        }
    }
}
