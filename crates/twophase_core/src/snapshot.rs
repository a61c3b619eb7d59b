//! Consistent copies of the processor's shared state.

use crate::processor::CoreState;
use crate::types::{LockMode, ObjectNo, SegmentId, TransactionId, TxStatus, TxType};
use serde::Serialize;

/// A live transaction as seen in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionSnapshot {
    /// Transaction id.
    pub tid: TransactionId,
    /// Declared type.
    pub tx_type: TxType,
    /// Status.
    pub status: TxStatus,
    /// Objects in the held set, most recent first.
    pub held: Vec<ObjectNo>,
    /// Transaction this one is blocked on.
    pub wait_target: Option<TransactionId>,
}

/// A granted lock as seen in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LockSnapshot {
    /// Segment.
    pub segment: SegmentId,
    /// Object.
    pub object: ObjectNo,
    /// Owner.
    pub owner: TransactionId,
    /// Mode.
    pub mode: LockMode,
}

/// Registry, lock table and object store captured under one hold of the
/// global gate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Live transactions in id order.
    pub transactions: Vec<TransactionSnapshot>,
    /// Granted locks.
    pub locks: Vec<LockSnapshot>,
    /// Object values.
    pub values: Vec<i64>,
}

impl Snapshot {
    pub(crate) fn capture(state: &CoreState) -> Self {
        let transactions = state
            .registry
            .iter()
            .map(|record| TransactionSnapshot {
                tid: record.id(),
                tx_type: record.tx_type(),
                status: record.status(),
                held: record
                    .held()
                    .filter_map(|handle| state.locks.node(handle))
                    .map(|node| node.object)
                    .collect(),
                wait_target: record.wait_target(),
            })
            .collect();
        let locks = state
            .locks
            .iter()
            .map(|(_, node)| LockSnapshot {
                segment: node.segment,
                object: node.object,
                owner: node.owner,
                mode: node.mode,
            })
            .collect();
        Self {
            transactions,
            locks,
            values: state.store.values().to_vec(),
        }
    }

    /// The live transaction with id `tid`.
    #[must_use]
    pub fn transaction(&self, tid: TransactionId) -> Option<&TransactionSnapshot> {
        self.transactions.iter().find(|txn| txn.tid == tid)
    }

    /// Locks granted on `object`.
    pub fn locks_on(&self, object: ObjectNo) -> impl Iterator<Item = &LockSnapshot> {
        self.locks.iter().filter(move |lock| lock.object == object)
    }

    /// Locks owned by `tid`.
    pub fn locks_owned_by(&self, tid: TransactionId) -> impl Iterator<Item = &LockSnapshot> {
        self.locks.iter().filter(move |lock| lock.owner == tid)
    }
}
