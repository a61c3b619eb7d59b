//! Per-transaction wait gates.
//!
//! A transaction that cannot get a lock blocks on the gate of the
//! transaction holding it. When the holder commits or aborts it raises its
//! gate once per recorded waiter. Gates count permits, so a signal raised
//! between a waiter recording itself and actually blocking is not lost.

use crate::error::{CoreError, CoreResult};
use crate::types::TransactionId;
use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct WaitGate {
    permits: Mutex<usize>,
    raised: Condvar,
}

/// Pool of counting gates, one per transaction id slot.
#[derive(Debug)]
pub struct WaitGates {
    gates: Vec<WaitGate>,
}

impl WaitGates {
    /// Creates `capacity` gates with no permits.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            gates: (0..capacity).map(|_| WaitGate::default()).collect(),
        }
    }

    fn gate(&self, tid: TransactionId) -> CoreResult<&WaitGate> {
        self.gates
            .get(tid.slot())
            .ok_or(CoreError::TransactionIdOutOfRange {
                tid,
                max: self.gates.len(),
            })
    }

    /// Adds one permit to `tid`'s gate and wakes one blocked thread.
    pub fn signal(&self, tid: TransactionId) -> CoreResult<()> {
        let gate = self.gate(tid)?;
        let mut permits = gate.permits.lock();
        *permits += 1;
        gate.raised.notify_one();
        Ok(())
    }

    /// Blocks until a permit is available on `tid`'s gate, then consumes it.
    ///
    /// Must not be called while holding the processor's global gate.
    pub fn wait(&self, tid: TransactionId) -> CoreResult<()> {
        let gate = self.gate(tid)?;
        let mut permits = gate.permits.lock();
        while *permits == 0 {
            gate.raised.wait(&mut permits);
        }
        *permits -= 1;
        Ok(())
    }

    /// Permits currently available on `tid`'s gate.
    #[must_use]
    pub fn permits(&self, tid: TransactionId) -> usize {
        self.gate(tid).map(|gate| *gate.permits.lock()).unwrap_or(0)
    }
}
