//! Lock-state invariants.
//!
//! Checks a [`Snapshot`] for the properties two-phase locking must keep at
//! every point a processor can be observed:
//!
//! - an exclusive lock is the only lock on its key
//! - a key with more than one lock has only shared locks, all owned by
//!   read-only transactions
//! - a transaction holds at most one lock per key
//! - every lock is owned by a live transaction and appears in its held set
//! - a waiting transaction has a wait target

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use twophase_core::{
    LockMode, ObjectNo, Processor, SegmentId, Snapshot, TransactionId, TxStatus, TxType,
};

/// A broken invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// An exclusive lock shares its key with another lock.
    ExclusiveShared {
        /// Object.
        object: ObjectNo,
        /// Locks on the key.
        holders: Vec<TransactionId>,
    },
    /// Several locks on a key, not all shared by read-only transactions.
    IncompatibleSharing {
        /// Object.
        object: ObjectNo,
        /// Locks on the key.
        holders: Vec<TransactionId>,
    },
    /// A transaction has two locks on one key.
    DuplicateLock {
        /// Owner.
        tid: TransactionId,
        /// Object.
        object: ObjectNo,
    },
    /// A lock's owner is not in the registry.
    OrphanLock {
        /// Owner named by the lock.
        tid: TransactionId,
        /// Object.
        object: ObjectNo,
    },
    /// A transaction's held set does not match the locks it owns.
    HeldSetMismatch {
        /// Transaction.
        tid: TransactionId,
        /// Objects in the held set.
        held: Vec<ObjectNo>,
        /// Objects locked in the table.
        owned: Vec<ObjectNo>,
    },
    /// A waiting transaction has no wait target.
    WaitingWithoutTarget {
        /// Transaction.
        tid: TransactionId,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExclusiveShared { object, holders } => {
                write!(f, "exclusive lock on object {object} shared by {holders:?}")
            }
            Self::IncompatibleSharing { object, holders } => {
                write!(f, "object {object} shared by {holders:?} incompatibly")
            }
            Self::DuplicateLock { tid, object } => {
                write!(f, "{tid} holds two locks on object {object}")
            }
            Self::OrphanLock { tid, object } => {
                write!(f, "lock on object {object} owned by missing {tid}")
            }
            Self::HeldSetMismatch { tid, held, owned } => {
                write!(f, "{tid} held set {held:?} differs from owned locks {owned:?}")
            }
            Self::WaitingWithoutTarget { tid } => write!(f, "{tid} waiting without a target"),
        }
    }
}

/// Returns every invariant `snapshot` breaks.
pub fn check_snapshot(snapshot: &Snapshot) -> Vec<Violation> {
    let mut violations = Vec::new();

    let mut keys: HashMap<(SegmentId, ObjectNo), Vec<(TransactionId, LockMode)>> = HashMap::new();
    for lock in &snapshot.locks {
        keys.entry((lock.segment, lock.object))
            .or_default()
            .push((lock.owner, lock.mode));
    }

    for (&(_, object), nodes) in &keys {
        let holders: Vec<TransactionId> = nodes.iter().map(|(tid, _)| *tid).collect();

        let mut seen = holders.clone();
        seen.sort_unstable();
        for pair in seen.windows(2) {
            if pair[0] == pair[1] {
                violations.push(Violation::DuplicateLock {
                    tid: pair[0],
                    object,
                });
            }
        }

        if nodes.len() < 2 {
            continue;
        }
        if nodes.iter().any(|(_, mode)| *mode == LockMode::Exclusive) {
            violations.push(Violation::ExclusiveShared {
                object,
                holders: holders.clone(),
            });
            continue;
        }
        let all_read_only = holders.iter().all(|tid| {
            snapshot
                .transaction(*tid)
                .is_some_and(|txn| txn.tx_type == TxType::ReadOnly)
        });
        if !all_read_only {
            violations.push(Violation::IncompatibleSharing { object, holders });
        }
    }

    for lock in &snapshot.locks {
        if snapshot.transaction(lock.owner).is_none() {
            violations.push(Violation::OrphanLock {
                tid: lock.owner,
                object: lock.object,
            });
        }
    }

    for txn in &snapshot.transactions {
        let mut held = txn.held.clone();
        held.sort_unstable();
        let mut owned: Vec<ObjectNo> = snapshot
            .locks_owned_by(txn.tid)
            .map(|lock| lock.object)
            .collect();
        owned.sort_unstable();
        if held != owned {
            violations.push(Violation::HeldSetMismatch {
                tid: txn.tid,
                held,
                owned,
            });
        }
        if txn.status == TxStatus::Waiting && txn.wait_target.is_none() {
            violations.push(Violation::WaitingWithoutTarget { tid: txn.tid });
        }
    }

    violations
}

/// Runs `f` while another thread repeatedly snapshots `processor` and
/// checks every snapshot. Returns `f`'s result with all violations seen.
pub fn watch_invariants<F, R>(processor: &Processor, f: F) -> (R, Vec<Violation>)
where
    F: FnOnce() -> R,
{
    let done = AtomicBool::new(false);
    thread::scope(|scope| {
        let watcher = scope.spawn(|| {
            let mut violations = Vec::new();
            while !done.load(Ordering::Acquire) {
                violations.extend(check_snapshot(&processor.snapshot()));
                thread::sleep(Duration::from_micros(200));
            }
            violations.extend(check_snapshot(&processor.snapshot()));
            violations
        });
        let result = f();
        done.store(true, Ordering::Release);
        let violations = watcher.join().expect("Invariant watcher panicked");
        (result, violations)
    })
}
