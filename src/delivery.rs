// Remote delivery: JSON-RPC-shaped calls over HTTP POST. Every call is
// best-effort and returns an Outcome; transport failures become the
// NoResponse sentinel, never an error past this boundary.

use crate::config::DeliveryConfig;
use crate::models::{LogRecord, Snapshot};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Value, json};
use std::time::Duration;

pub const DEFAULT_NOTIFY_TAGS: [&str; 2] = ["health", "monitoring"];

/// The result of one remote call attempt.
#[derive(Debug, Clone)]
pub enum Outcome {
    Response { status: u16, body: String },
    NoResponse { reason: String },
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Response { status, .. } if (200..300).contains(status))
    }

    /// Short form for log lines.
    pub fn describe(&self) -> String {
        match self {
            Outcome::Response { status, .. } => format!("http {}", status),
            Outcome::NoResponse { reason } => format!("no response ({})", reason),
        }
    }
}

/// Outcomes of one full delivery cycle, in call order.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub health: Outcome,
    pub alerts: Outcome,
    pub notify: Outcome,
}

pub struct DeliveryClient {
    client: reqwest::Client,
    rpc_url: String,
    service_id: String,
}

impl DeliveryClient {
    pub fn new(cfg: &DeliveryConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("token", HeaderValue::from_str(&cfg.auth_token)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;
        Ok(Self {
            client,
            rpc_url: cfg.rpc_url.clone(),
            service_id: cfg.service_id.clone(),
        })
    }

    async fn post_rpc(&self, payload: &Value) -> Outcome {
        let response = match self.client.post(&self.rpc_url).json(payload).send().await {
            Ok(response) => response,
            Err(e) => {
                return Outcome::NoResponse {
                    reason: e.to_string(),
                };
            }
        };
        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => Outcome::Response { status, body },
            Err(e) => Outcome::NoResponse {
                reason: e.to_string(),
            },
        }
    }

    /// POST the snapshot as `service.health` params, stamped with the
    /// configured service id and carrying the evaluated alerts plus any
    /// drained log records.
    pub async fn send_health(
        &self,
        snapshot: &Snapshot,
        alerts: &[String],
        logs: Vec<LogRecord>,
    ) -> Outcome {
        let mut params = match serde_json::to_value(snapshot) {
            Ok(params) => params,
            Err(e) => {
                return Outcome::NoResponse {
                    reason: format!("encode snapshot: {}", e),
                };
            }
        };
        params["service"] = json!(self.service_id);
        params["alerts"] = json!(alerts);
        if !logs.is_empty() {
            params["logs"] = json!(logs);
        }
        let payload = json!({
            "jsonrpc": "2.0",
            "method": "service.health",
            "params": params,
        });
        self.post_rpc(&payload).await
    }

    /// Ask the collector for the alerts it currently knows for this service.
    pub async fn fetch_alerts(&self) -> Outcome {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": "service.alerts",
            "params": { "service": self.service_id },
        });
        self.post_rpc(&payload).await
    }

    /// Fire-and-forget notification. Defaults tags when none are given.
    pub async fn send_notification(&self, message: &str, tags: Option<Vec<String>>) -> Outcome {
        let tags =
            tags.unwrap_or_else(|| DEFAULT_NOTIFY_TAGS.iter().map(|t| t.to_string()).collect());
        let payload = json!({
            "jsonrpc": "2.0",
            "method": "service.notify",
            "params": {
                "service": self.service_id,
                "msg": message,
                "tags": tags,
            },
        });
        self.post_rpc(&payload).await
    }

    /// One full delivery cycle in fixed order: send health, fetch alerts,
    /// derive the status message, send the notification. Each step runs
    /// regardless of the previous step's outcome.
    pub async fn cycle(
        &self,
        snapshot: &Snapshot,
        alerts: &[String],
        logs: Vec<LogRecord>,
    ) -> CycleReport {
        let health = self.send_health(snapshot, alerts, logs).await;
        let alert_outcome = self.fetch_alerts().await;
        let message = derive_status_message(&alert_outcome);
        let notify = self.send_notification(&message, None).await;
        CycleReport {
            health,
            alerts: alert_outcome,
            notify,
        }
    }
}

/// Status message from a `service.alerts` outcome. Only a 200 response
/// whose body exposes `result.alerts` as a sequence yields a count;
/// everything else reads as unknown. Never fails.
pub fn derive_status_message(outcome: &Outcome) -> String {
    let alert_count = match outcome {
        Outcome::Response { status: 200, body } => parse_alert_count(body),
        _ => None,
    };
    match alert_count {
        Some(0) => "No alerts detected".into(),
        Some(n) => format!("Alerts detected: {}", n),
        None => "Alert status unknown".into(),
    }
}

fn parse_alert_count(body: &str) -> Option<usize> {
    let value: Value = serde_json::from_str(body).ok()?;
    let alerts = value.get("result")?.get("alerts")?.as_array()?;
    Some(alerts.len())
}
