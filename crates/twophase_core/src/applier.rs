//! Read/write application.
//!
//! The simulator gives reads and writes an observable effect on the
//! object store: a read decrements the object by one and a write
//! increments it by one.

use crate::error::CoreResult;
use crate::processor::CoreState;
use crate::txlog::{LogRecord, LogSink};
use crate::types::{LockMode, ObjectNo, TransactionId};
use tracing::error;

/// Applies an access for `tid`, which must already hold a lock on
/// `object`. Runs under the global gate.
///
/// Returns the object's new value, or `None` if nothing was applied
/// (no mode given, or the transaction is not live).
pub(crate) fn apply(
    state: &mut CoreState,
    log: &dyn LogSink,
    tid: TransactionId,
    object: ObjectNo,
    mode: Option<LockMode>,
) -> CoreResult<Option<i64>> {
    let Some(mode) = mode else {
        error!("no lock mode set for {tid} on object {object}");
        return Ok(None);
    };
    let Some(record) = state.registry.lookup(tid) else {
        error!("{tid} vanished before its access to object {object} was applied");
        return Ok(None);
    };
    let (status, op_time) = (record.status(), record.op_time());

    let value = match mode {
        LockMode::Shared => state.store.adjust(object, -1)?,
        LockMode::Exclusive => state.store.adjust(object, 1)?,
    };
    let record = match mode {
        LockMode::Shared => LogRecord::Read {
            tid,
            object,
            value,
            op_time,
            status,
        },
        LockMode::Exclusive => LogRecord::Write {
            tid,
            object,
            value,
            op_time,
            status,
        },
    };
    log.append(&record)?;
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::LockTable;
    use crate::store::ObjectStore;
    use crate::transaction::{TransactionRecord, TransactionRegistry};
    use crate::txlog::MemoryLog;
    use crate::types::{TxStatus, TxType};

    fn state() -> CoreState {
        let mut registry = TransactionRegistry::new(4);
        let mut record = TransactionRecord::new(TransactionId::new(1), TxType::ReadWrite, 1, 4);
        record.mark_granted();
        registry.insert(record).unwrap();
        CoreState {
            registry,
            locks: LockTable::new(),
            store: ObjectStore::new(8, 10),
        }
    }

    #[test]
    fn shared_decrements() {
        let mut state = state();
        let log = MemoryLog::new();

        let value = apply(&mut state, &log, TransactionId::new(1), 5, Some(LockMode::Shared)).unwrap();

        assert_eq!(value, Some(9));
        assert_eq!(state.store.get(5).unwrap(), 9);
        assert_eq!(
            log.records().unwrap(),
            vec![LogRecord::Read {
                tid: TransactionId::new(1),
                object: 5,
                value: 9,
                op_time: 4,
                status: TxStatus::PartialGranted,
            }]
        );
    }

    #[test]
    fn exclusive_increments() {
        let mut state = state();
        let log = MemoryLog::new();

        let value =
            apply(&mut state, &log, TransactionId::new(1), 5, Some(LockMode::Exclusive)).unwrap();

        assert_eq!(value, Some(11));
        assert_eq!(
            log.lines(),
            vec!["T1\t  \tWriteTx \t 5:11:4  \t\t WriteLock \t Granted \tP".to_string()]
        );
    }

    #[test]
    fn missing_mode_is_noop() {
        let mut state = state();
        let log = MemoryLog::new();

        let value = apply(&mut state, &log, TransactionId::new(1), 5, None).unwrap();

        assert_eq!(value, None);
        assert_eq!(state.store.get(5).unwrap(), 10);
        assert!(log.is_empty());
    }
}
