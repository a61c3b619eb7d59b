//! Per-transaction operation sequencing.
//!
//! Every command runs on its own thread, so two operations of the same
//! transaction may reach the processor in any order. The sequencer keeps a
//! countdown per transaction id: the driver primes it with the number of
//! operations it will submit for that id, tags each operation with the
//! counter value it must observe (first operation = total, last = 1), and
//! each finished operation decrements the counter.
//!
//! Operations of different transactions are never ordered against each
//! other.

use crate::error::{CoreError, CoreResult};
use crate::types::TransactionId;
use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct Slot {
    counter: Mutex<i64>,
    turn: Condvar,
}

/// Countdown gates, one per transaction id slot.
#[derive(Debug)]
pub struct Sequencer {
    slots: Vec<Slot>,
}

impl Sequencer {
    /// Creates `capacity` slots, every counter at zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| Slot::default()).collect(),
        }
    }

    fn slot(&self, tid: TransactionId) -> CoreResult<&Slot> {
        self.slots
            .get(tid.slot())
            .ok_or(CoreError::TransactionIdOutOfRange {
                tid,
                max: self.slots.len(),
            })
    }

    /// Sets `tid`'s counter to the number of operations about to be
    /// submitted for it.
    pub fn prime(&self, tid: TransactionId, total: i64) -> CoreResult<()> {
        let slot = self.slot(tid)?;
        *slot.counter.lock() = total;
        slot.turn.notify_all();
        Ok(())
    }

    /// Blocks until `tid`'s counter equals `expected`.
    ///
    /// The returned permit ends the operation when dropped, letting the
    /// next operation of the same transaction proceed.
    pub fn begin_op(&self, tid: TransactionId, expected: i64) -> CoreResult<OpPermit<'_>> {
        let slot = self.slot(tid)?;
        let mut counter = slot.counter.lock();
        while *counter != expected {
            slot.turn.wait(&mut counter);
        }
        Ok(OpPermit {
            sequencer: self,
            tid,
        })
    }

    /// Decrements `tid`'s counter and wakes every operation waiting on it.
    pub(crate) fn end_op(&self, tid: TransactionId) {
        if let Ok(slot) = self.slot(tid) {
            *slot.counter.lock() -= 1;
            slot.turn.notify_all();
        }
    }

    /// Current counter for `tid`.
    #[must_use]
    pub fn counter(&self, tid: TransactionId) -> Option<i64> {
        self.slot(tid).ok().map(|slot| *slot.counter.lock())
    }
}

/// Proof that an operation holds its transaction's turn.
#[must_use = "dropping the permit immediately ends the operation"]
#[derive(Debug)]
pub struct OpPermit<'a> {
    sequencer: &'a Sequencer,
    tid: TransactionId,
}

impl OpPermit<'_> {
    /// Transaction this permit belongs to.
    #[must_use]
    pub fn tid(&self) -> TransactionId {
        self.tid
    }
}

impl Drop for OpPermit<'_> {
    fn drop(&mut self) {
        self.sequencer.end_op(self.tid);
    }
}
