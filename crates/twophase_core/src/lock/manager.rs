//! Two-phase lock admission.

use crate::error::CoreResult;
use crate::lock::LockNode;
use crate::processor::CoreState;
use crate::transaction::TransactionRecord;
use crate::types::{LockMode, ObjectNo, SegmentId, TransactionId, TxStatus, TxType};
use crate::wait::WaitGates;
use parking_lot::MutexGuard;
use tracing::{debug, error, warn};

/// How a lock request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Grant {
    /// Nobody held the key.
    Fresh,
    /// The requester already held a lock on the key.
    AlreadyHeld,
    /// Shared with other read-only holders.
    Shared,
    /// The holder's record was gone; granted without waiting.
    HolderVanished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    Granted(Grant),
    Wait { holder: TransactionId },
    RequesterGone,
}

/// Acquires a lock for `tid`, blocking on the holder's gate as long as the
/// request conflicts.
///
/// The global gate is held on entry and on return. It is released only
/// around the blocking wait, and every wake-up re-runs admission from
/// scratch: a released lock is never handed to a particular waiter.
///
/// Returns `None` if the requester's own record disappeared.
pub(crate) fn acquire(
    state: &mut MutexGuard<'_, CoreState>,
    gates: &WaitGates,
    tid: TransactionId,
    segment: SegmentId,
    object: ObjectNo,
    mode: LockMode,
) -> CoreResult<Option<Grant>> {
    loop {
        match admit(state, tid, segment, object, mode) {
            Admission::Granted(grant) => {
                debug!("{tid} granted {:?} on object {object} ({grant:?})", mode);
                return Ok(Some(grant));
            }
            Admission::RequesterGone => return Ok(None),
            Admission::Wait { holder } => {
                debug!("{tid} waiting on {holder} for object {object}");
                MutexGuard::unlocked(state, || gates.wait(holder))?;
                match state.registry.lookup_mut(tid) {
                    Some(record) => record.set_wait_target(None),
                    None => return Ok(None),
                }
                debug!("{tid} woke, retrying object {object}");
            }
        }
    }
}

/// One admission attempt, run under the global gate.
pub(crate) fn admit(
    state: &mut CoreState,
    tid: TransactionId,
    segment: SegmentId,
    object: ObjectNo,
    mode: LockMode,
) -> Admission {
    let CoreState {
        registry, locks, ..
    } = state;

    let Some(requester_type) = registry.lookup(tid).map(TransactionRecord::tx_type) else {
        return Admission::RequesterGone;
    };
    let chain: Vec<LockNode> = locks.find(segment, object).copied().collect();

    let Some(head) = chain.first() else {
        if let Some(record) = registry.lookup_mut(tid) {
            locks.add(record, segment, object, mode);
            record.mark_granted();
        }
        return Admission::Granted(Grant::Fresh);
    };

    // Re-acquiring a key already held is a grant, whatever the modes.
    if chain.iter().any(|node| node.owner == tid) {
        if let Some(record) = registry.lookup_mut(tid) {
            record.mark_granted();
        }
        return Admission::Granted(Grant::AlreadyHeld);
    }

    let holder = head.owner;
    let Some(holder_type) = registry.lookup(holder).map(TransactionRecord::tx_type) else {
        warn!("{tid}: holder {holder} of object {object} no longer exists, granting");
        if let Some(record) = registry.lookup_mut(tid) {
            locks.add(record, segment, object, mode);
            record.mark_granted();
        }
        return Admission::Granted(Grant::HolderVanished);
    };

    let writer_present = chain.iter().any(|node| node.mode == LockMode::Exclusive);
    let writer_waiting = registry.iter().any(|record| {
        record.id() != tid
            && record.status() == TxStatus::Waiting
            && record
                .pending()
                .is_some_and(|pending| pending.object == object && pending.mode == LockMode::Exclusive)
    });
    let compatible = mode == LockMode::Shared
        && requester_type == TxType::ReadOnly
        && holder_type == TxType::ReadOnly
        && !writer_present
        && !writer_waiting;

    let Some(record) = registry.lookup_mut(tid) else {
        return Admission::RequesterGone;
    };
    if compatible {
        locks.add(record, segment, object, LockMode::Shared);
        record.mark_granted();
        return Admission::Granted(Grant::Shared);
    }

    record.mark_waiting(object, mode);
    set_wait_target(record, holder);
    Admission::Wait { holder }
}

/// Records that `record` is about to block on `holder`.
///
/// A record already blocked on a different transaction means the locking
/// state is corrupt; the process is terminated rather than continuing.
fn set_wait_target(record: &mut TransactionRecord, holder: TransactionId) {
    match record.wait_target() {
        Some(current) if current != holder => {
            error!(
                "{} wants to wait on {holder} but is already waiting on {current}",
                record.id()
            );
            std::process::abort();
        }
        _ => record.set_wait_target(Some(holder)),
    }
}
