//! Commit/abort coordination.

use crate::command::OpOutcome;
use crate::error::CoreResult;
use crate::lock::LockTable;
use crate::processor::CoreState;
use crate::store::ObjectStore;
use crate::transaction::TransactionRecord;
use crate::txlog::{LogRecord, LogSink};
use crate::types::{ObjectNo, Outcome, TransactionId, TxStatus};
use crate::wait::WaitGates;
use tracing::{debug, warn};

/// Ends `tid`: releases its locks, wakes every transaction blocked on it,
/// unlinks its record and logs the outcome. Runs under the global gate.
///
/// Commit and abort differ only in the record logged at the end. Abort
/// does not roll back applied reads or writes.
pub(crate) fn finish(
    state: &mut CoreState,
    gates: &WaitGates,
    log: &dyn LogSink,
    tid: TransactionId,
    outcome: Outcome,
) -> CoreResult<OpOutcome> {
    let CoreState {
        registry,
        locks,
        store,
    } = state;

    let Some(record) = registry.lookup_mut(tid) else {
        warn!("{outcome:?} for {tid}, which does not exist");
        log.append(&LogRecord::MissingOnFinish { tid })?;
        return Ok(OpOutcome::MissingTransaction);
    };
    record.set_status(TxStatus::Ended);

    let released = free_locks(locks, store, record);
    log.append(&LogRecord::Released { locks: released })?;

    gates.signal(tid)?;
    let waiters = registry.waiters_on(tid);
    for _ in 0..waiters {
        gates.signal(tid)?;
    }
    debug!("{tid} ended, woke {waiters} waiter(s)");

    if let Err(err) = registry.remove(tid) {
        warn!("removing {tid}: {err}");
    }

    let terminal = match outcome {
        Outcome::Commit => LogRecord::Commit { tid },
        Outcome::Abort => LogRecord::Abort { tid },
    };
    log.append(&terminal)?;
    Ok(OpOutcome::Finished(outcome))
}

/// Releases every lock in `record`'s held set, most recent first, and
/// returns each released object with its final value.
pub(crate) fn free_locks(
    locks: &mut LockTable,
    store: &ObjectStore,
    record: &mut TransactionRecord,
) -> Vec<(ObjectNo, i64)> {
    let objects: Vec<ObjectNo> = record
        .held()
        .filter_map(|handle| locks.node(handle))
        .map(|node| node.object)
        .collect();

    let mut released = Vec::with_capacity(objects.len());
    for object in objects {
        if let Ok(value) = store.get(object) {
            released.push((object, value));
        }
        if let Err(err) = locks.remove(record, object) {
            warn!("releasing object {object}: {err}");
        }
    }
    released
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TransactionRegistry;
    use crate::txlog::MemoryLog;
    use crate::types::{LockMode, TxType};

    fn tid(id: u64) -> TransactionId {
        TransactionId::new(id)
    }

    fn state() -> CoreState {
        let mut registry = TransactionRegistry::new(8);
        let mut locks = LockTable::new();
        for id in 1..=3 {
            registry
                .insert(TransactionRecord::new(tid(id), TxType::ReadWrite, 1, 0))
                .unwrap();
        }
        let holder = registry.lookup_mut(tid(1)).unwrap();
        locks.add(holder, 1, 2, LockMode::Exclusive);
        locks.add(holder, 1, 4, LockMode::Exclusive);
        CoreState {
            registry,
            locks,
            store: ObjectStore::new(8, 10),
        }
    }

    #[test]
    fn commit_releases_and_unlinks() {
        let mut state = state();
        let gates = WaitGates::new(8);
        let log = MemoryLog::new();

        let outcome = finish(&mut state, &gates, &log, tid(1), Outcome::Commit).unwrap();

        assert_eq!(outcome, OpOutcome::Finished(Outcome::Commit));
        assert_eq!(state.locks.owned_by(tid(1)), 0);
        assert!(state.registry.lookup(tid(1)).is_none());
        assert_eq!(
            log.records().unwrap(),
            vec![
                LogRecord::Released {
                    locks: vec![(4, 10), (2, 10)]
                },
                LogRecord::Commit { tid: tid(1) },
            ]
        );
    }

    #[test]
    fn abort_logs_abort() {
        let mut state = state();
        let gates = WaitGates::new(8);
        let log = MemoryLog::new();

        finish(&mut state, &gates, &log, tid(1), Outcome::Abort).unwrap();

        assert_eq!(log.lines().last().unwrap(), "T1\t  \tAbortTx \t");
        assert!(state.locks.is_empty());
    }

    #[test]
    fn one_signal_per_waiter_plus_own() {
        let mut state = state();
        let gates = WaitGates::new(8);
        let log = MemoryLog::new();
        for waiter in [2, 3] {
            let record = state.registry.lookup_mut(tid(waiter)).unwrap();
            record.mark_waiting(2, LockMode::Exclusive);
            record.set_wait_target(Some(tid(1)));
        }

        finish(&mut state, &gates, &log, tid(1), Outcome::Commit).unwrap();

        assert_eq!(gates.permits(tid(1)), 3);
    }

    #[test]
    fn missing_transaction_is_logged() {
        let mut state = state();
        let gates = WaitGates::new(8);
        let log = MemoryLog::new();

        let outcome = finish(&mut state, &gates, &log, tid(7), Outcome::Commit).unwrap();

        assert_eq!(outcome, OpOutcome::MissingTransaction);
        assert_eq!(log.lines(), vec!["\t Transaction 7 doesn't exist.".to_string()]);
        assert_eq!(state.locks.len(), 2);
    }
}
