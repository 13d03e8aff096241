// Bounded local snapshot history: a pretty-printed JSON array file,
// read-modify-write per append, oldest entries evicted past the cap.
// Single-writer (the monitor loop); the swap-via-rename keeps readers
// from ever observing a torn sequence.

use crate::models::Snapshot;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_ENTRIES: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("journal io: {0}")]
    Io(#[from] std::io::Error),
    #[error("journal encode: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("journal task join: {0}")]
    Task(String),
}

#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
    max_entries: usize,
}

impl Journal {
    pub fn new(path: impl Into<PathBuf>, max_entries: usize) -> Self {
        Self {
            path: path.into(),
            max_entries,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one snapshot, truncating to the most recent `max_entries`.
    pub async fn append(&self, snapshot: &Snapshot) -> Result<(), JournalError> {
        let path = self.path.clone();
        let max_entries = self.max_entries;
        let entry = serde_json::to_value(snapshot)?;
        tokio::task::spawn_blocking(move || append_sync(&path, max_entries, entry))
            .await
            .map_err(|e| JournalError::Task(e.to_string()))?
    }

    /// Read back the persisted sequence (e.g. after a bounded run).
    pub async fn load(&self) -> Result<Vec<Snapshot>, JournalError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || load_sync(&path))
            .await
            .map_err(|e| JournalError::Task(e.to_string()))?
    }
}

/// Missing, empty, or unparsable files read as an empty sequence; a
/// non-array document is wrapped as a single-entry sequence.
fn read_entries(path: &Path) -> Vec<Value> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return Vec::new(),
    };
    if content.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Array(entries)) => entries,
        Ok(other) => vec![other],
        Err(_) => Vec::new(),
    }
}

fn append_sync(path: &Path, max_entries: usize, entry: Value) -> Result<(), JournalError> {
    let mut entries = read_entries(path);
    entries.push(entry);
    if entries.len() > max_entries {
        let excess = entries.len() - max_entries;
        entries.drain(..excess);
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string_pretty(&entries)?;
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, body)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn load_sync(path: &Path) -> Result<Vec<Snapshot>, JournalError> {
    let entries = read_entries(path);
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        out.push(serde_json::from_value(entry)?);
    }
    Ok(out)
}
