//! In-memory log sink for testing.

use crate::error::CoreResult;
use crate::txlog::{LogRecord, LogSink};
use parking_lot::Mutex;
use std::sync::Arc;

/// Keeps rendered log lines in memory.
///
/// Clones share the same buffer, so a test can hand one clone to a
/// processor and read the log through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every line written so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Parses every line written so far.
    ///
    /// # Errors
    ///
    /// Returns an error if a line does not parse.
    pub fn records(&self) -> CoreResult<Vec<LogRecord>> {
        self.lines
            .lock()
            .iter()
            .map(|line| LogRecord::parse(line))
            .collect()
    }

    /// Number of lines written.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    /// Returns true if nothing was written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    /// Discards every line.
    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl LogSink for MemoryLog {
    fn append(&self, record: &LogRecord) -> CoreResult<()> {
        self.lines.lock().push(record.to_string());
        Ok(())
    }
}
