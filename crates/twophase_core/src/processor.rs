//! The transaction processor.

use crate::applier;
use crate::command::{Command, CommandKind, OpOutcome, OpTicket};
use crate::config::Config;
use crate::coordinator;
use crate::error::{CoreError, CoreResult};
use crate::lock::manager;
use crate::lock::LockTable;
use crate::sequencer::Sequencer;
use crate::snapshot::Snapshot;
use crate::store::ObjectStore;
use crate::transaction::{TransactionRecord, TransactionRegistry};
use crate::txlog::{FileLog, LogRecord, LogSink};
use crate::types::{LockMode, ObjectNo, Outcome, TransactionId, TxType};
use crate::wait::WaitGates;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

/// State guarded by the global gate.
///
/// The registry, the lock table and the object store are only ever touched
/// together, so one mutex covers all three.
#[derive(Debug)]
pub(crate) struct CoreState {
    pub(crate) registry: TransactionRegistry,
    pub(crate) locks: LockTable,
    pub(crate) store: ObjectStore,
}

impl CoreState {
    fn new(config: &Config) -> Self {
        Self {
            registry: TransactionRegistry::new(config.max_transactions),
            locks: LockTable::new(),
            store: ObjectStore::new(config.object_count, config.initial_value),
        }
    }

    fn dump_registry(&self) {
        for record in self.registry.iter() {
            trace!(
                tid = %record.id(),
                tx_type = %record.tx_type().as_char(),
                status = %record.status().as_char(),
                held = record.held_count(),
                wait_target = ?record.wait_target(),
                "registry entry"
            );
        }
    }
}

/// A simulated multi-threaded transaction processor.
///
/// Every entry point is meant to be called from its own thread, one call
/// per command. An entry point first waits for its turn in the
/// transaction's operation sequence, then does its work under the global
/// gate. Lock requests that conflict block the calling thread until the
/// holder ends.
///
/// ## Thread Safety
///
/// `Processor` is `Send + Sync`; share it with `Arc` or scoped threads.
pub struct Processor {
    config: Config,
    gate: Mutex<CoreState>,
    gates: WaitGates,
    sequencer: Sequencer,
    log: Box<dyn LogSink>,
}

impl Processor {
    /// Opens a processor that appends to the file at `config.log_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, has no log path,
    /// or the log file cannot be opened.
    pub fn open(config: Config) -> CoreResult<Self> {
        let Some(path) = config.log_path.clone() else {
            return Err(CoreError::invalid_config("log_path is required"));
        };
        let log = FileLog::open_with_create_dirs(&path)?;
        Self::with_sink(config, Box::new(log))
    }

    /// Creates a processor writing to `log`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_sink(config: Config, log: Box<dyn LogSink>) -> CoreResult<Self> {
        config.validate()?;
        debug!(
            objects = config.object_count,
            max_transactions = config.max_transactions,
            "processor created"
        );
        Ok(Self {
            gate: Mutex::new(CoreState::new(&config)),
            gates: WaitGates::new(config.max_transactions),
            sequencer: Sequencer::new(config.max_transactions),
            log,
            config,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Tells the sequencer that `total` operations are about to be
    /// submitted for `tid`.
    ///
    /// Must be called before any operation of the transaction is
    /// dispatched.
    pub fn prime(&self, tid: impl Into<TransactionId>, total: i64) -> CoreResult<()> {
        self.sequencer.prime(tid.into(), total)
    }

    /// Starts a transaction.
    ///
    /// # Errors
    ///
    /// Returns `TransactionExists` if the id is live, or
    /// `TransactionIdOutOfRange` if it exceeds the configured maximum.
    pub fn begin(&self, ticket: OpTicket, tx_type: TxType, op_time: u64) -> CoreResult<OpOutcome> {
        let _permit = self.sequencer.begin_op(ticket.tid, ticket.count)?;
        let tid = ticket.tid;

        let mut state = self.gate.lock();
        let record = TransactionRecord::new(tid, tx_type, self.config.segment, op_time);
        if let Err(err) = state.registry.insert(record) {
            warn!("begin {tid}: {err}");
            return Err(err);
        }
        self.log.append(&LogRecord::Begin { tid, tx_type })?;
        state.dump_registry();
        Ok(OpOutcome::Begun)
    }

    /// Takes a shared lock on `object` and reads it.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is out of range or the log cannot be
    /// written.
    pub fn read(&self, ticket: OpTicket, object: ObjectNo) -> CoreResult<OpOutcome> {
        self.access(ticket, object, LockMode::Shared)
    }

    /// Takes an exclusive lock on `object` and writes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is out of range or the log cannot be
    /// written.
    pub fn write(&self, ticket: OpTicket, object: ObjectNo) -> CoreResult<OpOutcome> {
        self.access(ticket, object, LockMode::Exclusive)
    }

    fn access(&self, ticket: OpTicket, object: ObjectNo, mode: LockMode) -> CoreResult<OpOutcome> {
        let _permit = self.sequencer.begin_op(ticket.tid, ticket.count)?;
        let tid = ticket.tid;

        let mut state = self.gate.lock();
        if state.registry.lookup(tid).is_none() {
            warn!("{mode:?} access to object {object} by {tid}, which does not exist");
            self.log.append(&LogRecord::Missing { tid })?;
            return Ok(OpOutcome::MissingTransaction);
        }
        state.store.check(object)?;

        let segment = self.config.segment;
        if manager::acquire(&mut state, &self.gates, tid, segment, object, mode)?.is_none() {
            warn!("{tid} ended while waiting for object {object}");
            self.log.append(&LogRecord::Missing { tid })?;
            return Ok(OpOutcome::MissingTransaction);
        }

        match applier::apply(&mut state, self.log.as_ref(), tid, object, Some(mode))? {
            Some(value) => Ok(OpOutcome::Accessed { object, value }),
            None => Ok(OpOutcome::MissingTransaction),
        }
    }

    /// Releases every lock held by the transaction and commits it.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be written.
    pub fn commit(&self, ticket: OpTicket) -> CoreResult<OpOutcome> {
        self.finish(ticket, Outcome::Commit)
    }

    /// Releases every lock held by the transaction and aborts it.
    ///
    /// Applied reads and writes are not rolled back.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be written.
    pub fn abort(&self, ticket: OpTicket) -> CoreResult<OpOutcome> {
        self.finish(ticket, Outcome::Abort)
    }

    fn finish(&self, ticket: OpTicket, outcome: Outcome) -> CoreResult<OpOutcome> {
        let _permit = self.sequencer.begin_op(ticket.tid, ticket.count)?;

        let mut state = self.gate.lock();
        let result = coordinator::finish(&mut state, &self.gates, self.log.as_ref(), ticket.tid, outcome);
        state.dump_registry();
        result
    }

    /// Runs one dispatched command.
    ///
    /// # Errors
    ///
    /// Propagates the error of the entry point the command maps to.
    pub fn execute(&self, command: &Command) -> CoreResult<OpOutcome> {
        let ticket = command.ticket;
        match command.kind {
            CommandKind::Begin { tx_type, op_time } => self.begin(ticket, tx_type, op_time),
            CommandKind::Read { object } => self.read(ticket, object),
            CommandKind::Write { object } => self.write(ticket, object),
            CommandKind::Commit => self.commit(ticket),
            CommandKind::Abort => self.abort(ticket),
        }
    }

    /// Current value of `object`.
    ///
    /// # Errors
    ///
    /// Returns `ObjectOutOfRange` for an unknown object.
    pub fn value(&self, object: ObjectNo) -> CoreResult<i64> {
        self.gate.lock().store.get(object)
    }

    /// Returns `true` if `tid` has a record in the registry.
    pub fn is_live(&self, tid: impl Into<TransactionId>) -> bool {
        self.gate.lock().registry.lookup(tid.into()).is_some()
    }

    /// Captures the registry, lock table and object store under the gate.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.gate.lock())
    }
}

impl std::fmt::Debug for Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::txlog::MemoryLog;
    use crate::types::TxStatus;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn processor() -> (Processor, MemoryLog) {
        let log = MemoryLog::new();
        let config = Config::new().object_count(8).initial_value(10).max_transactions(16);
        let processor = Processor::with_sink(config, Box::new(log.clone())).unwrap();
        (processor, log)
    }

    fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..500 {
            if condition() {
                return;
            }
            thread::sleep(Duration::from_millis(2));
        }
        panic!("condition never became true");
    }

    #[test]
    fn round_trip() {
        let (processor, log) = processor();
        processor.prime(1, 3).unwrap();

        processor.begin(OpTicket::new(1, 3), TxType::ReadWrite, 7).unwrap();
        let outcome = processor.write(OpTicket::new(1, 2), 5).unwrap();
        assert_eq!(outcome, OpOutcome::Accessed { object: 5, value: 11 });
        processor.commit(OpTicket::new(1, 1)).unwrap();

        assert_eq!(processor.value(5).unwrap(), 11);
        assert!(!processor.is_live(1));
        assert_eq!(
            log.lines(),
            vec![
                "T1\tW \tBeginTx".to_string(),
                "T1\t  \tWriteTx \t 5:11:7  \t\t WriteLock \t Granted \tP".to_string(),
                "5 : 11 \t".to_string(),
                "T1\t  \tCommitTx \t".to_string(),
            ]
        );
    }

    #[test]
    fn duplicate_begin_is_rejected() {
        let (processor, _log) = processor();
        processor.prime(1, 2).unwrap();
        processor.begin(OpTicket::new(1, 2), TxType::ReadOnly, 0).unwrap();

        let err = processor
            .begin(OpTicket::new(1, 1), TxType::ReadOnly, 0)
            .unwrap_err();
        assert!(matches!(err, CoreError::TransactionExists { .. }));
    }

    #[test]
    fn read_of_missing_transaction() {
        let (processor, log) = processor();
        processor.prime(9, 1).unwrap();

        let outcome = processor.read(OpTicket::new(9, 1), 2).unwrap();

        assert_eq!(outcome, OpOutcome::MissingTransaction);
        assert_eq!(processor.value(2).unwrap(), 10);
        assert_eq!(log.lines(), vec!["\t Transaction 9 doesn't exist or aborted.".to_string()]);
    }

    #[test]
    fn object_out_of_range() {
        let (processor, _log) = processor();
        processor.prime(1, 2).unwrap();
        processor.begin(OpTicket::new(1, 2), TxType::ReadWrite, 0).unwrap();

        let err = processor.write(OpTicket::new(1, 1), 8).unwrap_err();
        assert!(matches!(err, CoreError::ObjectOutOfRange { object: 8, .. }));
    }

    #[test]
    fn execute_dispatches() {
        let (processor, _log) = processor();
        processor.prime(2, 3).unwrap();

        let commands = [
            Command::new(
                OpTicket::new(2, 3),
                CommandKind::Begin {
                    tx_type: TxType::ReadOnly,
                    op_time: 0,
                },
            ),
            Command::new(OpTicket::new(2, 2), CommandKind::Read { object: 1 }),
            Command::new(OpTicket::new(2, 1), CommandKind::Abort),
        ];
        let outcomes: Vec<_> = commands
            .iter()
            .map(|command| processor.execute(command).unwrap())
            .collect();

        assert_eq!(
            outcomes,
            vec![
                OpOutcome::Begun,
                OpOutcome::Accessed { object: 1, value: 9 },
                OpOutcome::Finished(Outcome::Abort),
            ]
        );
        // Abort does not undo the read.
        assert_eq!(processor.value(1).unwrap(), 9);
    }

    #[test]
    fn conflicting_write_waits_for_commit() {
        let (processor, log) = processor();
        let processor = Arc::new(processor);
        processor.prime(1, 3).unwrap();
        processor.prime(2, 2).unwrap();
        processor.begin(OpTicket::new(1, 3), TxType::ReadWrite, 0).unwrap();
        processor.begin(OpTicket::new(2, 2), TxType::ReadWrite, 0).unwrap();
        processor.write(OpTicket::new(1, 2), 1).unwrap();

        let blocked = {
            let processor = Arc::clone(&processor);
            thread::spawn(move || processor.write(OpTicket::new(2, 1), 1).unwrap())
        };
        wait_until(|| {
            processor
                .snapshot()
                .transaction(TransactionId::new(2))
                .is_some_and(|txn| txn.status == TxStatus::Waiting)
        });
        let snapshot = processor.snapshot();
        assert_eq!(
            snapshot.transaction(TransactionId::new(2)).unwrap().wait_target,
            Some(TransactionId::new(1))
        );

        processor.commit(OpTicket::new(1, 1)).unwrap();
        let outcome = blocked.join().unwrap();

        assert_eq!(outcome, OpOutcome::Accessed { object: 1, value: 12 });
        let lines = log.lines();
        assert_eq!(lines[lines.len() - 2], "T1\t  \tCommitTx \t");
        assert_eq!(
            lines[lines.len() - 1],
            "T2\t  \tWriteTx \t 1:12:0  \t\t WriteLock \t Granted \tP"
        );
    }

    #[test]
    fn snapshot_reflects_locks() {
        let (processor, _log) = processor();
        processor.prime(1, 3).unwrap();
        processor.begin(OpTicket::new(1, 3), TxType::ReadWrite, 0).unwrap();
        processor.read(OpTicket::new(1, 2), 3).unwrap();
        processor.write(OpTicket::new(1, 1), 4).unwrap();

        let snapshot = processor.snapshot();

        let txn = snapshot.transaction(TransactionId::new(1)).unwrap();
        assert_eq!(txn.held, vec![4, 3]);
        assert_eq!(snapshot.locks_owned_by(TransactionId::new(1)).count(), 2);
        assert_eq!(snapshot.values[3], 9);
        assert_eq!(snapshot.values[4], 11);
    }

    #[test]
    fn open_requires_log_path() {
        let err = Processor::open(Config::new()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig { .. }));
    }

    #[test]
    fn open_writes_file_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("tx.log");
        let processor = Processor::open(Config::new().log_path(&path)).unwrap();
        processor.prime(1, 1).unwrap();
        processor.begin(OpTicket::new(1, 1), TxType::ReadOnly, 0).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "T1\tR \tBeginTx\n");
    }
}
