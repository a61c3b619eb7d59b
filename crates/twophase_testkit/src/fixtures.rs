//! Test fixtures and processor helpers.
//!
//! Provides convenience functions for setting up test processors and
//! reading back what they logged.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use twophase_core::{Config, LogRecord, MemoryLog, Processor};

/// Configuration used by fixtures unless a test supplies its own.
pub fn test_config() -> Config {
    Config::new()
        .object_count(16)
        .initial_value(10)
        .max_transactions(64)
}

/// A test processor with automatic cleanup.
pub struct TestProcessor {
    /// The processor instance.
    pub processor: Processor,
    log: Option<MemoryLog>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
    log_path: Option<PathBuf>,
}

impl TestProcessor {
    /// Creates a processor logging to memory.
    pub fn memory() -> Self {
        Self::memory_with(test_config())
    }

    /// Creates a processor logging to memory with the given configuration.
    pub fn memory_with(config: Config) -> Self {
        let log = MemoryLog::new();
        let processor = Processor::with_sink(config, Box::new(log.clone()))
            .expect("Failed to create processor");
        Self {
            processor,
            log: Some(log),
            _temp_dir: None,
            log_path: None,
        }
    }

    /// Creates a processor logging to a file in a temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let log_path = temp_dir.path().join("logs").join("tx.log");
        let processor =
            Processor::open(test_config().log_path(&log_path)).expect("Failed to open processor");
        Self {
            processor,
            log: None,
            _temp_dir: Some(temp_dir),
            log_path: Some(log_path),
        }
    }

    /// Returns the log file path if file-based, None if in-memory.
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Lines logged so far.
    pub fn lines(&self) -> Vec<String> {
        match (&self.log, &self.log_path) {
            (Some(log), _) => log.lines(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .expect("Failed to read log file")
                .lines()
                .map(str::to_string)
                .collect(),
            (None, None) => Vec::new(),
        }
    }

    /// Logged lines parsed back into records.
    pub fn records(&self) -> Vec<LogRecord> {
        self.lines()
            .iter()
            .map(|line| LogRecord::parse(line).expect("Unparseable log line"))
            .collect()
    }
}

impl std::ops::Deref for TestProcessor {
    type Target = Processor;

    fn deref(&self) -> &Self::Target {
        &self.processor
    }
}

/// Runs a test with a processor logging to memory.
///
/// # Example
///
/// ```rust,ignore
/// use twophase_testkit::with_processor;
///
/// #[test]
/// fn my_test() {
///     with_processor(|processor, log| {
///         // ... dispatch commands
///     });
/// }
/// ```
pub fn with_processor<F, R>(f: F) -> R
where
    F: FnOnce(&Processor, &MemoryLog) -> R,
{
    let log = MemoryLog::new();
    let processor =
        Processor::with_sink(test_config(), Box::new(log.clone())).expect("Failed to create processor");
    f(&processor, &log)
}

/// Runs a test with a processor logging to a temporary file.
pub fn with_file_processor<F, R>(f: F) -> R
where
    F: FnOnce(&Processor, &Path) -> R,
{
    let test = TestProcessor::file();
    let path = test.log_path().expect("File processor should have a log path");
    f(&test.processor, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use twophase_core::{OpTicket, TxType};

    #[test]
    fn memory_fixture_records() {
        let test = TestProcessor::memory();
        test.prime(1, 1).unwrap();
        test.begin(OpTicket::new(1, 1), TxType::ReadOnly, 0).unwrap();

        assert_eq!(test.lines(), vec!["T1\tR \tBeginTx".to_string()]);
        assert!(test.log_path().is_none());
    }

    #[test]
    fn file_fixture_reads_back() {
        let test = TestProcessor::file();
        test.prime(2, 1).unwrap();
        test.begin(OpTicket::new(2, 1), TxType::ReadWrite, 0).unwrap();

        assert_eq!(test.records().len(), 1);
        assert!(test.log_path().unwrap().exists());
    }
}
