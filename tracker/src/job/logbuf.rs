//! Job log buffer

use std::sync::RwLock;

use crate::models::job::LogEntry;

/// Buffer over the orchestrator's cumulative log history
///
/// The orchestrator is the source of truth for ordering and content: each
/// poll returns the full history, so `replace` overwrites wholesale. No
/// client-side sorting, merging, or deduplication is performed.
pub struct LogBuffer {
    entries: RwLock<Vec<LogEntry>>,
}

impl LogBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Overwrite the buffer with the latest server-reported history
    pub fn replace(&self, entries: Vec<LogEntry>) {
        let mut guard = self.entries.write().unwrap_or_else(|e| e.into_inner());
        *guard = entries;
    }

    /// Read-only copy of the current contents
    pub fn snapshot(&self) -> Vec<LogEntry> {
        let guard = self.entries.read().unwrap_or_else(|e| e.into_inner());
        guard.clone()
    }

    /// Entries from `index` onward, for incremental rendering
    pub fn since(&self, index: usize) -> Vec<LogEntry> {
        let guard = self.entries.read().unwrap_or_else(|e| e.into_inner());
        guard.get(index..).map(<[LogEntry]>::to_vec).unwrap_or_default()
    }

    /// Drop all entries
    pub fn clear(&self) {
        let mut guard = self.entries.write().unwrap_or_else(|e| e.into_inner());
        guard.clear();
    }

    /// Number of buffered entries
    pub fn len(&self) -> usize {
        let guard = self.entries.read().unwrap_or_else(|e| e.into_inner());
        guard.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new()
    }
}
