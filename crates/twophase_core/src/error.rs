//! Error types for the locking core.

use crate::types::{ObjectNo, TransactionId};
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations.
///
/// Conditions the simulator tolerates (unknown transaction ids, a vanished
/// lock holder) are logged and reported through
/// [`OpOutcome`](crate::OpOutcome) instead.
#[derive(Debug, Error)]
pub enum CoreError {
    /// I/O error while writing the text log.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transaction id does not fit the per-transaction resource pools.
    #[error("transaction id {tid} out of range (max {max})")]
    TransactionIdOutOfRange {
        /// The offending id.
        tid: TransactionId,
        /// Number of slots in the pools.
        max: usize,
    },

    /// Object number is outside the object store.
    #[error("object {object} out of range (store holds {count} objects)")]
    ObjectOutOfRange {
        /// The offending object number.
        object: ObjectNo,
        /// Number of objects in the store.
        count: usize,
    },

    /// A record for this transaction id already exists.
    #[error("transaction {tid} already exists")]
    TransactionExists {
        /// The duplicated id.
        tid: TransactionId,
    },

    /// No record for this transaction id exists.
    #[error("transaction {tid} does not exist")]
    TransactionNotFound {
        /// The missing id.
        tid: TransactionId,
    },

    /// No lock node matched a removal request.
    #[error("no lock held by {tid} on object {object}")]
    LockNotFound {
        /// Owner named in the request.
        tid: TransactionId,
        /// Object named in the request.
        object: ObjectNo,
    },

    /// Configuration rejected.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// A log line did not match any known record format.
    #[error("invalid log record: {line:?}")]
    InvalidLogRecord {
        /// The offending line.
        line: String,
    },
}

impl CoreError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates an invalid log record error.
    pub fn invalid_log_record(line: impl Into<String>) -> Self {
        Self::InvalidLogRecord { line: line.into() }
    }
}
