// Receiving collector: accepts posted health snapshots, stamps a UTC
// timestamp, and appends them to a flat JSON-array log file. Deliberately
// trivial; no storage engine behind it.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct CollectorState {
    log_file: Arc<PathBuf>,
    /// Serializes the read-modify-write on the log file.
    write_lock: Arc<tokio::sync::Mutex<()>>,
}

impl CollectorState {
    /// Ensure the log file exists (seeded with an empty array) so reads
    /// never race its creation.
    pub fn new(log_file: PathBuf) -> anyhow::Result<Self> {
        if let Some(parent) = log_file.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        if !log_file.exists() {
            std::fs::write(&log_file, "[]")?;
        }
        Ok(Self {
            log_file: Arc::new(log_file),
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
        })
    }
}

pub fn app(state: CollectorState) -> Router {
    Router::new()
        .route("/health", get(get_health).post(receive_health))
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

/// POST /health — body must be a non-empty JSON object.
async fn receive_health(
    State(state): State<CollectorState>,
    body: String,
) -> (StatusCode, Json<Value>) {
    let mut data = match serde_json::from_str::<Value>(&body) {
        Ok(data @ Value::Object(_)) if data.as_object().is_some_and(|m| !m.is_empty()) => data,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "No JSON data received"})),
            );
        }
    };
    data["timestamp"] = json!(Utc::now().to_rfc3339());

    let _guard = state.write_lock.lock().await;
    let path = state.log_file.as_ref().clone();
    let stored = tokio::task::spawn_blocking(move || append_entry(&path, data))
        .await
        .map_err(|e| anyhow::anyhow!("store task join: {}", e))
        .and_then(|r| r);
    match stored {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({"message": "Health log received successfully"})),
        ),
        Err(e) => {
            tracing::error!(error = %e, operation = "store_health_log", "failed to store health log");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
        }
    }
}

/// GET /health — the full stored array.
async fn get_health(State(state): State<CollectorState>) -> (StatusCode, Json<Value>) {
    let path = state.log_file.as_ref().clone();
    let entries = tokio::task::spawn_blocking(move || read_entries(&path))
        .await
        .map_err(|e| anyhow::anyhow!("read task join: {}", e))
        .and_then(|r| r);
    match entries {
        Ok(entries) => {
            tracing::debug!(count = entries.len(), "returning health logs");
            (StatusCode::OK, Json(Value::Array(entries)))
        }
        Err(e) => {
            tracing::error!(error = %e, operation = "read_health_logs", "failed to read health logs");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
        }
    }
}

fn read_entries(path: &Path) -> anyhow::Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn append_entry(path: &Path, entry: Value) -> anyhow::Result<()> {
    let mut entries = read_entries(path)?;
    entries.push(entry);
    let body = serde_json::to_string_pretty(&entries)?;
    std::fs::write(path, body)?;
    Ok(())
}
