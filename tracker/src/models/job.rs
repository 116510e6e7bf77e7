//! Job status models

use serde::{Deserialize, Serialize};

/// Severity of a single orchestrator log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Success,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Success => "SUCCESS",
            LogLevel::Error => "ERROR",
        }
    }
}

/// A single log line reported by the orchestrator
///
/// Index order in the containing list is chronological order; the client
/// never re-sorts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Seconds since the Unix epoch
    pub timestamp: f64,

    /// Log severity
    pub level: LogLevel,

    /// Log message
    pub message: String,
}

/// Job status snapshot returned by the status endpoint
///
/// `logs` is the full cumulative history, not a delta since the last poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    /// Progress in [-1, 100]; -1 is the failure sentinel. Advisory while
    /// the job is running and not guaranteed monotonic.
    pub progress: i32,

    /// Whether the job is still executing server-side
    pub is_running: bool,

    /// Cumulative log history, oldest first
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

impl JobStatus {
    /// Whether this snapshot reports a finished job
    pub fn is_terminal(&self) -> bool {
        !self.is_running
    }

    /// Whether this snapshot reports a successful completion
    pub fn is_success(&self) -> bool {
        !self.is_running && self.progress == 100
    }
}
