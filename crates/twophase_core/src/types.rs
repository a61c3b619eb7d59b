//! Core type definitions.

use serde::Serialize;
use std::fmt;

/// Object number: index into the object store.
pub type ObjectNo = usize;

/// Segment identifier. Every object currently lives in segment 1.
pub type SegmentId = u32;

/// Identifier of a transaction.
///
/// Transaction ids are assigned by the caller (the workload driver) and
/// double as the index into every per-transaction resource pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Creates a new transaction ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the pool slot used by this id.
    pub(crate) const fn slot(self) -> usize {
        self.0 as usize
    }
}

impl From<u64> for TransactionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Declared access type of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TxType {
    /// Read-only: may share locks with other read-only transactions.
    ReadOnly,
    /// Read-write: every lock it takes is effectively exclusive.
    ReadWrite,
}

impl TxType {
    /// Log character for this type.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::ReadOnly => 'R',
            Self::ReadWrite => 'W',
        }
    }

    /// Parses a log character.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'R' => Some(Self::ReadOnly),
            'W' => Some(Self::ReadWrite),
            _ => None,
        }
    }
}

/// Lifecycle status of a transaction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TxStatus {
    /// Begun, no lock granted yet.
    Active,
    /// At least one lock granted.
    PartialGranted,
    /// Blocked on another transaction's release.
    Waiting,
    /// Committing or aborting.
    Ended,
}

impl TxStatus {
    /// Log character for this status.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Active => 'A',
            Self::PartialGranted => 'P',
            Self::Waiting => 'W',
            Self::Ended => 'E',
        }
    }

    /// Parses a log character.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'A' => Some(Self::Active),
            'P' => Some(Self::PartialGranted),
            'W' => Some(Self::Waiting),
            'E' => Some(Self::Ended),
            _ => None,
        }
    }
}

/// Lock mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LockMode {
    /// Shared (read) lock.
    Shared,
    /// Exclusive (write) lock.
    Exclusive,
}

impl LockMode {
    /// Single-character tag used in diagnostics.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Shared => 'S',
            Self::Exclusive => 'X',
        }
    }
}

/// Terminal outcome of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Outcome {
    /// Commit.
    Commit,
    /// Abort. Applied mutations are not rolled back.
    Abort,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_id_display() {
        assert_eq!(TransactionId::new(7).to_string(), "T7");
    }

    #[test]
    fn status_chars_round_trip() {
        for status in [
            TxStatus::Active,
            TxStatus::PartialGranted,
            TxStatus::Waiting,
            TxStatus::Ended,
        ] {
            assert_eq!(TxStatus::from_char(status.as_char()), Some(status));
        }
        assert_eq!(TxStatus::from_char('?'), None);
    }

    #[test]
    fn tx_type_chars() {
        assert_eq!(TxType::ReadOnly.as_char(), 'R');
        assert_eq!(TxType::from_char('W'), Some(TxType::ReadWrite));
        assert_eq!(TxType::from_char('X'), None);
    }
}
