//! Progress reporting for long-running analyses.
//!
//! The orchestrator emits a fractional progress value in `[0, 1]` after each
//! sample group; the transport (websocket message, channel, poll) is the
//! calling layer's concern. `ProgressLog` is a shareable in-memory sink the
//! caller can read from another thread while the analysis runs.

use parking_lot::RwLock;
use std::sync::Arc;

/// Receives fractional progress updates in `[0, 1]`.
pub trait ProgressSink {
    fn progress(&self, fraction: f64);
}

/// Discards progress updates.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn progress(&self, _fraction: f64) {}
}

/// A single progress update with its timestamp.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProgressEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub fraction: f64,
}

/// Shareable in-memory progress log.
#[derive(Clone, Default)]
pub struct ProgressLog {
    entries: Arc<RwLock<Vec<ProgressEntry>>>,
}

impl ProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest reported fraction, 0.0 before the first update.
    pub fn fraction(&self) -> f64 {
        self.entries.read().last().map(|e| e.fraction).unwrap_or(0.0)
    }

    /// Snapshot of all updates so far.
    pub fn entries(&self) -> Vec<ProgressEntry> {
        self.entries.read().clone()
    }
}

impl ProgressSink for ProgressLog {
    fn progress(&self, fraction: f64) {
        self.entries.write().push(ProgressEntry {
            timestamp: chrono::Utc::now(),
            fraction,
        });
    }
}
