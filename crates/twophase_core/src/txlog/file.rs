//! File-backed log sink.

use crate::error::CoreResult;
use crate::txlog::{LogRecord, LogSink};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Appends records to a text file.
///
/// The file is opened in append mode and never truncated, so several runs
/// can share one log. Every record is flushed as soon as it is written.
///
/// # Example
///
/// ```no_run
/// use twophase_core::{FileLog, LogRecord, LogSink, TransactionId};
/// use std::path::Path;
///
/// let log = FileLog::open(Path::new("tx.log")).unwrap();
/// log.append(&LogRecord::Commit { tid: TransactionId::new(1) }).unwrap();
/// ```
#[derive(Debug)]
pub struct FileLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileLog {
    /// Opens or creates the log file at `path` for appending.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path) -> CoreResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    /// Opens the log file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot be opened.
    pub fn open_with_create_dirs(path: &Path) -> CoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for FileLog {
    fn append(&self, record: &LogRecord) -> CoreResult<()> {
        let mut file = self.file.lock();
        writeln!(file, "{record}")?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TransactionId, TxType};
    use tempfile::tempdir;

    #[test]
    fn appends_one_line_per_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tx.log");
        let log = FileLog::open(&path).unwrap();

        log.append(&LogRecord::Begin {
            tid: TransactionId::new(1),
            tx_type: TxType::ReadOnly,
        })
        .unwrap();
        log.append(&LogRecord::Commit {
            tid: TransactionId::new(1),
        })
        .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "T1\tR \tBeginTx\nT1\t  \tCommitTx \t\n");
    }

    #[test]
    fn reopen_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("tx.log");

        for id in 1..=2 {
            let log = FileLog::open_with_create_dirs(&path).unwrap();
            log.append(&LogRecord::Abort {
                tid: TransactionId::new(id),
            })
            .unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn path_is_kept() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tx.log");
        let log = FileLog::open(&path).unwrap();
        assert_eq!(log.path(), path.as_path());
    }
}
