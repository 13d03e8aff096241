// Log-collection boundary: a small bounded buffer of recent log records,
// drained into each outgoing health payload. Cloneable handle; components
// that want their events on the wire record here in addition to tracing.

use crate::models::LogRecord;
use crate::snapshot::now_ms;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub const LEVEL_INFO: u8 = 2;
pub const LEVEL_WARN: u8 = 3;
pub const LEVEL_ERROR: u8 = 4;

/// Most recent records kept; older ones are dropped.
const BUFFER_CAP: usize = 256;

#[derive(Debug, Clone, Default)]
pub struct LogBuffer {
    inner: Arc<Mutex<VecDeque<LogRecord>>>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, level: u8, msg: impl Into<String>) {
        let entry = LogRecord {
            ct: now_ms(),
            level,
            msg: msg.into(),
        };
        let mut buffer = match self.inner.lock() {
            Ok(buffer) => buffer,
            // A poisoned buffer only loses wire logs; keep going.
            Err(poisoned) => poisoned.into_inner(),
        };
        if buffer.len() >= BUFFER_CAP {
            buffer.pop_front();
        }
        buffer.push_back(entry);
    }

    pub fn info(&self, msg: impl Into<String>) {
        self.record(LEVEL_INFO, msg);
    }

    pub fn warn(&self, msg: impl Into<String>) {
        self.record(LEVEL_WARN, msg);
    }

    pub fn error(&self, msg: impl Into<String>) {
        self.record(LEVEL_ERROR, msg);
    }

    /// Drain everything buffered so far, in arrival order.
    pub fn flush(&self) -> Vec<LogRecord> {
        let mut buffer = match self.inner.lock() {
            Ok(buffer) => buffer,
            Err(poisoned) => poisoned.into_inner(),
        };
        buffer.drain(..).collect()
    }
}
