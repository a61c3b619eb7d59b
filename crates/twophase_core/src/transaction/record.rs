//! Transaction record.

use crate::lock::NodeHandle;
use crate::types::{LockMode, ObjectNo, SegmentId, TransactionId, TxStatus, TxType};
use std::collections::VecDeque;
use std::thread::{self, ThreadId};

/// The lock request a waiting transaction is blocked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRequest {
    /// Requested object.
    pub object: ObjectNo,
    /// Requested mode.
    pub mode: LockMode,
}

/// Per-transaction state.
#[derive(Debug)]
pub struct TransactionRecord {
    id: TransactionId,
    tx_type: TxType,
    status: TxStatus,
    segment: SegmentId,
    /// Only meaningful while `status == Waiting`.
    pending: Option<PendingRequest>,
    thread: ThreadId,
    /// Held set, most recently granted first.
    held: VecDeque<NodeHandle>,
    /// Id of the transaction this one is blocked on.
    wait_target: Option<TransactionId>,
    op_time: u64,
}

impl TransactionRecord {
    /// Creates an active record owned by the calling thread.
    #[must_use]
    pub fn new(id: TransactionId, tx_type: TxType, segment: SegmentId, op_time: u64) -> Self {
        Self {
            id,
            tx_type,
            status: TxStatus::Active,
            segment,
            pending: None,
            thread: thread::current().id(),
            held: VecDeque::new(),
            wait_target: None,
            op_time,
        }
    }

    /// Transaction id.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Declared type.
    #[must_use]
    pub fn tx_type(&self) -> TxType {
        self.tx_type
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> TxStatus {
        self.status
    }

    /// Segment this transaction locks in.
    #[must_use]
    pub fn segment(&self) -> SegmentId {
        self.segment
    }

    /// Request this transaction is waiting on, if any.
    #[must_use]
    pub fn pending(&self) -> Option<PendingRequest> {
        self.pending
    }

    /// Thread that began the transaction.
    #[must_use]
    pub fn thread(&self) -> ThreadId {
        self.thread
    }

    /// Handles of the locks this transaction holds, most recent first.
    pub fn held(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        self.held.iter().copied()
    }

    /// Number of locks held.
    #[must_use]
    pub fn held_count(&self) -> usize {
        self.held.len()
    }

    /// Transaction this one is blocked on, if any.
    #[must_use]
    pub fn wait_target(&self) -> Option<TransactionId> {
        self.wait_target
    }

    /// Operation time reported in read/write log records.
    #[must_use]
    pub fn op_time(&self) -> u64 {
        self.op_time
    }

    pub(crate) fn set_status(&mut self, status: TxStatus) {
        self.status = status;
    }

    /// Marks a lock as granted: the wait state is cleared.
    pub(crate) fn mark_granted(&mut self) {
        self.status = TxStatus::PartialGranted;
        self.pending = None;
        self.wait_target = None;
    }

    pub(crate) fn mark_waiting(&mut self, object: ObjectNo, mode: LockMode) {
        self.status = TxStatus::Waiting;
        self.pending = Some(PendingRequest { object, mode });
    }

    pub(crate) fn set_wait_target(&mut self, target: Option<TransactionId>) {
        self.wait_target = target;
    }

    pub(crate) fn held_mut(&mut self) -> &mut VecDeque<NodeHandle> {
        &mut self.held
    }
}
