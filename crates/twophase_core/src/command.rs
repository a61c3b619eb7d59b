//! Commands handed to the processor by the workload driver.

use crate::types::{ObjectNo, Outcome, TransactionId, TxType};

/// Identifies one operation of one transaction.
///
/// `count` is the sequencer value the operation waits for: the driver
/// primes a transaction with its operation total and numbers the
/// operations down from there, so the first submitted operation carries
/// the total and the last carries 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpTicket {
    /// Transaction id.
    pub tid: TransactionId,
    /// Sequencer value this operation runs at.
    pub count: i64,
}

impl OpTicket {
    /// Creates a ticket.
    #[must_use]
    pub fn new(tid: impl Into<TransactionId>, count: i64) -> Self {
        Self {
            tid: tid.into(),
            count,
        }
    }
}

/// What a command does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Start a transaction.
    Begin {
        /// Declared type.
        tx_type: TxType,
        /// Operation time reported in read/write records.
        op_time: u64,
    },
    /// Take a shared lock and read.
    Read {
        /// Object to read.
        object: ObjectNo,
    },
    /// Take an exclusive lock and write.
    Write {
        /// Object to write.
        object: ObjectNo,
    },
    /// Release everything and commit.
    Commit,
    /// Release everything and abort.
    Abort,
}

/// One unit of dispatched work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    /// Which operation of which transaction.
    pub ticket: OpTicket,
    /// What to do.
    pub kind: CommandKind,
}

impl Command {
    /// Creates a command.
    #[must_use]
    pub fn new(ticket: OpTicket, kind: CommandKind) -> Self {
        Self { ticket, kind }
    }

    /// Transaction the command belongs to.
    #[must_use]
    pub fn tid(&self) -> TransactionId {
        self.ticket.tid
    }
}

/// Result of a completed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpOutcome {
    /// The transaction record was created.
    Begun,
    /// A lock was granted and the object updated.
    Accessed {
        /// Object accessed.
        object: ObjectNo,
        /// Value after the update.
        value: i64,
    },
    /// The transaction ended.
    Finished(Outcome),
    /// The named transaction is not live; nothing was done.
    MissingTransaction,
}
