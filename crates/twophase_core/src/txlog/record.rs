//! Log record formats.

use crate::error::{CoreError, CoreResult};
use crate::types::{ObjectNo, TransactionId, TxStatus, TxType};
use std::fmt;

/// One line of the text log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    /// A transaction began.
    Begin {
        /// Transaction id.
        tid: TransactionId,
        /// Declared type.
        tx_type: TxType,
    },
    /// A shared lock was granted and the object decremented.
    Read {
        /// Transaction id.
        tid: TransactionId,
        /// Object read.
        object: ObjectNo,
        /// Value after the read.
        value: i64,
        /// Operation time of the transaction.
        op_time: u64,
        /// Status after the grant.
        status: TxStatus,
    },
    /// An exclusive lock was granted and the object incremented.
    Write {
        /// Transaction id.
        tid: TransactionId,
        /// Object written.
        object: ObjectNo,
        /// Value after the write.
        value: i64,
        /// Operation time of the transaction.
        op_time: u64,
        /// Status after the grant.
        status: TxStatus,
    },
    /// Locks released at commit or abort, with each object's final value.
    Released {
        /// `(object, value)` per released lock.
        locks: Vec<(ObjectNo, i64)>,
    },
    /// A transaction committed.
    Commit {
        /// Transaction id.
        tid: TransactionId,
    },
    /// A transaction aborted.
    Abort {
        /// Transaction id.
        tid: TransactionId,
    },
    /// A read or write named a transaction that is not live.
    Missing {
        /// Transaction id.
        tid: TransactionId,
    },
    /// A commit or abort named a transaction that is not live.
    MissingOnFinish {
        /// Transaction id.
        tid: TransactionId,
    },
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Begin { tid, tx_type } => write!(f, "{tid}\t{} \tBeginTx", tx_type.as_char()),
            Self::Read {
                tid,
                object,
                value,
                op_time,
                status,
            } => write!(
                f,
                "{tid}\t  \tReadTx \t\t {object}:{value}:{op_time}  \t\t ReadLock \t Granted \t{}",
                status.as_char()
            ),
            Self::Write {
                tid,
                object,
                value,
                op_time,
                status,
            } => write!(
                f,
                "{tid}\t  \tWriteTx \t {object}:{value}:{op_time}  \t\t WriteLock \t Granted \t{}",
                status.as_char()
            ),
            Self::Released { locks } => {
                for (object, value) in locks {
                    write!(f, "{object} : {value} \t")?;
                }
                Ok(())
            }
            Self::Commit { tid } => write!(f, "{tid}\t  \tCommitTx \t"),
            Self::Abort { tid } => write!(f, "{tid}\t  \tAbortTx \t"),
            Self::Missing { tid } => {
                write!(f, "\t Transaction {} doesn't exist or aborted.", tid.as_u64())
            }
            Self::MissingOnFinish { tid } => {
                write!(f, "\t Transaction {} doesn't exist.", tid.as_u64())
            }
        }
    }
}

impl LogRecord {
    /// Parses one log line (without its terminator).
    ///
    /// # Errors
    ///
    /// Returns `InvalidLogRecord` if the line matches no record format.
    pub fn parse(line: &str) -> CoreResult<Self> {
        let invalid = || CoreError::invalid_log_record(line);
        let fields: Vec<&str> = line
            .split('\t')
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .collect();

        if fields.iter().all(|field| field.contains(" : ")) {
            let locks = fields
                .iter()
                .map(|field| -> CoreResult<(ObjectNo, i64)> {
                    let (object, value) = field.split_once(" : ").ok_or_else(invalid)?;
                    Ok((
                        object.parse().map_err(|_| invalid())?,
                        value.parse().map_err(|_| invalid())?,
                    ))
                })
                .collect::<CoreResult<Vec<_>>>()?;
            return Ok(Self::Released { locks });
        }

        if let [message] = fields.as_slice() {
            if let Some(rest) = message.strip_prefix("Transaction ") {
                let (id, tail) = rest.split_once(' ').ok_or_else(invalid)?;
                let tid = TransactionId::new(id.parse().map_err(|_| invalid())?);
                return match tail {
                    "doesn't exist or aborted." => Ok(Self::Missing { tid }),
                    "doesn't exist." => Ok(Self::MissingOnFinish { tid }),
                    _ => Err(invalid()),
                };
            }
        }

        let tid = fields
            .first()
            .and_then(|field| field.strip_prefix('T'))
            .and_then(|id| id.parse().ok())
            .map(TransactionId::new)
            .ok_or_else(invalid)?;

        match fields[1..] {
            [tx_type, "BeginTx"] => {
                let mut chars = tx_type.chars();
                let tx_type = match (chars.next(), chars.next()) {
                    (Some(c), None) => TxType::from_char(c),
                    _ => None,
                }
                .ok_or_else(invalid)?;
                Ok(Self::Begin { tid, tx_type })
            }
            [kind @ ("ReadTx" | "WriteTx"), access, lock, "Granted", status] => {
                let mut parts = access.splitn(3, ':');
                let mut next = || parts.next().ok_or_else(invalid);
                let object: ObjectNo = next()?.parse().map_err(|_| invalid())?;
                let value: i64 = next()?.parse().map_err(|_| invalid())?;
                let op_time: u64 = next()?.parse().map_err(|_| invalid())?;
                let mut chars = status.chars();
                let status = match (chars.next(), chars.next()) {
                    (Some(c), None) => TxStatus::from_char(c),
                    _ => None,
                }
                .ok_or_else(invalid)?;
                match (kind, lock) {
                    ("ReadTx", "ReadLock") => Ok(Self::Read {
                        tid,
                        object,
                        value,
                        op_time,
                        status,
                    }),
                    ("WriteTx", "WriteLock") => Ok(Self::Write {
                        tid,
                        object,
                        value,
                        op_time,
                        status,
                    }),
                    _ => Err(invalid()),
                }
            }
            ["CommitTx"] => Ok(Self::Commit { tid }),
            ["AbortTx"] => Ok(Self::Abort { tid }),
            _ => Err(invalid()),
        }
    }

    /// Transaction the record is about, if any.
    #[must_use]
    pub fn tid(&self) -> Option<TransactionId> {
        match self {
            Self::Begin { tid, .. }
            | Self::Read { tid, .. }
            | Self::Write { tid, .. }
            | Self::Commit { tid }
            | Self::Abort { tid }
            | Self::Missing { tid }
            | Self::MissingOnFinish { tid } => Some(*tid),
            Self::Released { .. } => None,
        }
    }
}
