//! Transaction registry.

use crate::error::{CoreError, CoreResult};
use crate::transaction::TransactionRecord;
use crate::types::TransactionId;

/// Set of live transaction records, addressed by transaction id.
///
/// Records live in a fixed arena with one slot per id, so a record is
/// reachable only through its id and never through a stored reference.
///
/// The registry is not synchronized. Every call must happen while the
/// processor's global gate is held.
#[derive(Debug)]
pub struct TransactionRegistry {
    slots: Vec<Option<TransactionRecord>>,
    live: usize,
}

impl TransactionRegistry {
    /// Creates a registry with `capacity` id slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            live: 0,
        }
    }

    /// Number of id slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns true if no record is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Inserts a record.
    ///
    /// # Errors
    ///
    /// - `TransactionIdOutOfRange` if the id has no slot
    /// - `TransactionExists` if a record with the same id is live
    pub fn insert(&mut self, record: TransactionRecord) -> CoreResult<()> {
        let tid = record.id();
        let max = self.slots.len();
        let slot = self
            .slots
            .get_mut(tid.slot())
            .ok_or(CoreError::TransactionIdOutOfRange { tid, max })?;
        if slot.is_some() {
            return Err(CoreError::TransactionExists { tid });
        }
        *slot = Some(record);
        self.live += 1;
        Ok(())
    }

    /// Looks up a record by id.
    #[must_use]
    pub fn lookup(&self, tid: TransactionId) -> Option<&TransactionRecord> {
        self.slots.get(tid.slot()).and_then(Option::as_ref)
    }

    /// Looks up a record by id for mutation.
    pub fn lookup_mut(&mut self, tid: TransactionId) -> Option<&mut TransactionRecord> {
        self.slots.get_mut(tid.slot()).and_then(Option::as_mut)
    }

    /// Unlinks and returns a record.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` if no record with that id is live.
    pub fn remove(&mut self, tid: TransactionId) -> CoreResult<TransactionRecord> {
        let record = self
            .slots
            .get_mut(tid.slot())
            .and_then(Option::take)
            .ok_or(CoreError::TransactionNotFound { tid })?;
        self.live -= 1;
        Ok(record)
    }

    /// Counts the records currently blocked on `tid`.
    #[must_use]
    pub fn waiters_on(&self, tid: TransactionId) -> usize {
        self.iter()
            .filter(|record| record.wait_target() == Some(tid))
            .count()
    }

    /// Iterates over live records in id order.
    pub fn iter(&self) -> impl Iterator<Item = &TransactionRecord> {
        self.slots.iter().filter_map(Option::as_ref)
    }
}
