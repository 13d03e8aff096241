use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub agent: AgentConfig,
    pub delivery: DeliveryConfig,
    pub journal: JournalConfig,
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
}

/// Identity overrides. Anything left unset is resolved at startup
/// (worker id/name, git-derived project/version/commit, OS user).
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_env")]
    pub env: String,
    #[serde(default = "default_stype")]
    pub stype: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

fn default_env() -> String {
    "prod".into()
}

fn default_stype() -> String {
    "worker".into()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            env: default_env(),
            stype: default_stype(),
            name: None,
            project: None,
            version: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
    pub rpc_url: String,
    pub auth_token: String,
    pub service_id: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct JournalConfig {
    pub path: String,
    /// Oldest entries are evicted past this count.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_max_entries() -> usize {
    1000
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    pub poll_interval_secs: u64,
    /// Stop on its own after this many captures; unbounded when unset.
    #[serde(default)]
    pub max_captures: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectorConfig {
    #[serde(default = "default_collector_listen")]
    pub listen: String,
    #[serde(default = "default_collector_log_file")]
    pub log_file: String,
}

fn default_collector_listen() -> String {
    "0.0.0.0:5000".into()
}

fn default_collector_log_file() -> String {
    "health_logs.json".into()
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            listen: default_collector_listen(),
            log_file: default_collector_log_file(),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.delivery.rpc_url.is_empty(),
            "delivery.rpc_url must be non-empty"
        );
        anyhow::ensure!(
            !self.delivery.auth_token.is_empty(),
            "delivery.auth_token must be non-empty"
        );
        anyhow::ensure!(
            !self.delivery.service_id.is_empty(),
            "delivery.service_id must be non-empty"
        );
        anyhow::ensure!(
            self.delivery.request_timeout_secs > 0,
            "delivery.request_timeout_secs must be > 0, got {}",
            self.delivery.request_timeout_secs
        );
        anyhow::ensure!(
            !self.journal.path.is_empty(),
            "journal.path must be non-empty"
        );
        anyhow::ensure!(
            self.journal.max_entries > 0,
            "journal.max_entries must be > 0, got {}",
            self.journal.max_entries
        );
        anyhow::ensure!(
            self.monitoring.poll_interval_secs > 0,
            "monitoring.poll_interval_secs must be > 0, got {}",
            self.monitoring.poll_interval_secs
        );
        if let Some(max) = self.monitoring.max_captures {
            anyhow::ensure!(
                max > 0,
                "monitoring.max_captures must be > 0 when set, got {}",
                max
            );
        }
        anyhow::ensure!(
            !self.collector.listen.is_empty(),
            "collector.listen must be non-empty"
        );
        anyhow::ensure!(
            !self.collector.log_file.is_empty(),
            "collector.log_file must be non-empty"
        );
        Ok(())
    }
}
