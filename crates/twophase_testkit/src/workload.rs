//! Workload descriptions.
//!
//! A workload is a set of transaction scripts. Each script expands into the
//! commands the driver dispatches for one transaction: a Begin, one command
//! per access, then a Commit or Abort.

use serde::Serialize;
use twophase_core::{
    Command, CommandKind, ObjectNo, OpTicket, Outcome, TransactionId, TxType,
};

/// One data access of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Access {
    /// Shared-lock read.
    Read(ObjectNo),
    /// Exclusive-lock write.
    Write(ObjectNo),
}

impl Access {
    /// Object accessed.
    pub fn object(self) -> ObjectNo {
        match self {
            Self::Read(object) | Self::Write(object) => object,
        }
    }
}

/// The operations of one transaction, in submission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxScript {
    /// Transaction id.
    pub tid: TransactionId,
    /// Declared type.
    pub tx_type: TxType,
    /// Operation time logged with each access.
    pub op_time: u64,
    /// Accesses between Begin and the terminal command.
    pub accesses: Vec<Access>,
    /// How the transaction ends.
    pub outcome: Outcome,
}

impl TxScript {
    /// Creates a committing script with no accesses.
    pub fn new(tid: impl Into<TransactionId>, tx_type: TxType) -> Self {
        Self {
            tid: tid.into(),
            tx_type,
            op_time: 0,
            accesses: Vec::new(),
            outcome: Outcome::Commit,
        }
    }

    /// Appends a read.
    #[must_use]
    pub fn read(mut self, object: ObjectNo) -> Self {
        self.accesses.push(Access::Read(object));
        self
    }

    /// Appends a write.
    #[must_use]
    pub fn write(mut self, object: ObjectNo) -> Self {
        self.accesses.push(Access::Write(object));
        self
    }

    /// Ends the script with an abort instead of a commit.
    #[must_use]
    pub fn aborting(mut self) -> Self {
        self.outcome = Outcome::Abort;
        self
    }

    /// Sets the operation time.
    #[must_use]
    pub fn op_time(mut self, op_time: u64) -> Self {
        self.op_time = op_time;
        self
    }

    /// Number of commands the script expands into.
    pub fn op_count(&self) -> i64 {
        self.accesses.len() as i64 + 2
    }

    /// Expands the script into commands tagged with countdown tickets.
    pub fn commands(&self) -> Vec<Command> {
        let total = self.op_count();
        let mut kinds = Vec::with_capacity(total as usize);
        kinds.push(CommandKind::Begin {
            tx_type: self.tx_type,
            op_time: self.op_time,
        });
        kinds.extend(self.accesses.iter().map(|access| match *access {
            Access::Read(object) => CommandKind::Read { object },
            Access::Write(object) => CommandKind::Write { object },
        }));
        kinds.push(match self.outcome {
            Outcome::Commit => CommandKind::Commit,
            Outcome::Abort => CommandKind::Abort,
        });

        kinds
            .into_iter()
            .enumerate()
            .map(|(index, kind)| Command::new(OpTicket::new(self.tid, total - index as i64), kind))
            .collect()
    }
}

/// A set of transactions dispatched together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Workload {
    /// Transaction scripts. Ids must be distinct.
    pub transactions: Vec<TxScript>,
}

impl Workload {
    /// Creates a workload.
    pub fn new(transactions: Vec<TxScript>) -> Self {
        Self { transactions }
    }

    /// Total number of commands.
    pub fn op_count(&self) -> usize {
        self.transactions
            .iter()
            .map(|script| script.op_count() as usize)
            .sum()
    }

    /// Highest transaction id used, if any.
    pub fn max_tid(&self) -> Option<TransactionId> {
        self.transactions.iter().map(|script| script.tid).max()
    }

    /// Object values once every command has run, starting from `initial`.
    ///
    /// Each read decrements its object and each write increments it,
    /// whether or not the transaction commits.
    pub fn expected_values(&self, object_count: usize, initial: i64) -> Vec<i64> {
        let mut values = vec![initial; object_count];
        for access in self.transactions.iter().flat_map(|script| &script.accesses) {
            match *access {
                Access::Read(object) => values[object] -= 1,
                Access::Write(object) => values[object] += 1,
            }
        }
        values
    }
}
