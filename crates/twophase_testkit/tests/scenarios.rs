//! End-to-end locking scenarios driven through the processor's entry points.

use std::sync::Arc;
use std::thread;
use std::time::Duration;
use twophase_core::{
    LockMode, LogRecord, OpOutcome, OpTicket, Outcome, TransactionId, TxStatus, TxType,
};
use twophase_testkit::prelude::*;

fn tid(id: u64) -> TransactionId {
    TransactionId::new(id)
}

fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..1_000 {
        if condition() {
            return;
        }
        thread::sleep(Duration::from_millis(2));
    }
    panic!("condition never became true");
}

fn is_waiting(test: &TestProcessor, id: u64) -> bool {
    test.snapshot()
        .transaction(tid(id))
        .is_some_and(|txn| txn.status == TxStatus::Waiting)
}

#[test]
fn write_commit_round_trip() {
    let test = TestProcessor::memory();
    test.prime(1, 3).unwrap();

    test.begin(OpTicket::new(1, 3), TxType::ReadWrite, 0).unwrap();
    test.write(OpTicket::new(1, 2), 5).unwrap();
    test.commit(OpTicket::new(1, 1)).unwrap();

    assert_eq!(test.value(5).unwrap(), 11);
    assert!(!test.is_live(1));
    assert!(test.snapshot().locks.is_empty());
    let records = test.records();
    assert!(matches!(
        records[1],
        LogRecord::Write {
            object: 5,
            value: 11,
            ..
        }
    ));
    assert_eq!(records[3], LogRecord::Commit { tid: tid(1) });
}

#[test]
fn conflicting_writer_blocks_until_commit() {
    let test = Arc::new(TestProcessor::memory());
    test.prime(1, 3).unwrap();
    test.prime(2, 3).unwrap();
    test.begin(OpTicket::new(1, 3), TxType::ReadWrite, 0).unwrap();
    test.begin(OpTicket::new(2, 3), TxType::ReadWrite, 0).unwrap();
    assert_eq!(
        test.write(OpTicket::new(1, 2), 1).unwrap(),
        OpOutcome::Accessed {
            object: 1,
            value: 11
        }
    );

    let writer = {
        let test = Arc::clone(&test);
        thread::spawn(move || test.write(OpTicket::new(2, 2), 1).unwrap())
    };
    wait_until(|| is_waiting(&test, 2));
    assert_eq!(test.value(1).unwrap(), 11);

    test.commit(OpTicket::new(1, 1)).unwrap();
    assert_eq!(
        writer.join().unwrap(),
        OpOutcome::Accessed {
            object: 1,
            value: 12
        }
    );
    test.commit(OpTicket::new(2, 1)).unwrap();

    let records = test.records();
    let commit_t1 = records
        .iter()
        .position(|r| *r == LogRecord::Commit { tid: tid(1) })
        .unwrap();
    let write_t2 = records
        .iter()
        .position(|r| matches!(r, LogRecord::Write { tid, .. } if *tid == TransactionId::new(2)))
        .unwrap();
    assert!(write_t2 > commit_t1);
}

#[test]
fn read_only_readers_share() {
    let test = TestProcessor::memory();
    test.prime(1, 3).unwrap();
    test.prime(2, 3).unwrap();
    test.begin(OpTicket::new(1, 3), TxType::ReadOnly, 0).unwrap();
    test.begin(OpTicket::new(2, 3), TxType::ReadOnly, 0).unwrap();

    // Both reads complete on this thread, so neither can have blocked.
    test.read(OpTicket::new(1, 2), 1).unwrap();
    test.read(OpTicket::new(2, 2), 1).unwrap();

    let snapshot = test.snapshot();
    let locks: Vec<_> = snapshot.locks_on(1).collect();
    assert_eq!(locks.len(), 2);
    assert!(locks.iter().all(|lock| lock.mode == LockMode::Shared));
    assert_eq!(test.value(1).unwrap(), 8);
    assert!(check_snapshot(&snapshot).is_empty());

    test.commit(OpTicket::new(1, 1)).unwrap();
    test.commit(OpTicket::new(2, 1)).unwrap();
}

#[test]
fn read_write_reader_excludes_read_only_reader() {
    let test = Arc::new(TestProcessor::memory());
    test.prime(1, 3).unwrap();
    test.prime(2, 3).unwrap();
    test.begin(OpTicket::new(1, 3), TxType::ReadWrite, 0).unwrap();
    test.begin(OpTicket::new(2, 3), TxType::ReadOnly, 0).unwrap();
    test.read(OpTicket::new(1, 2), 4).unwrap();

    let reader = {
        let test = Arc::clone(&test);
        thread::spawn(move || test.read(OpTicket::new(2, 2), 4).unwrap())
    };
    wait_until(|| is_waiting(&test, 2));
    let snapshot = test.snapshot();
    assert_eq!(snapshot.transaction(tid(2)).unwrap().wait_target, Some(tid(1)));

    test.abort(OpTicket::new(1, 1)).unwrap();
    reader.join().unwrap();
    test.commit(OpTicket::new(2, 1)).unwrap();

    // Abort does not roll back the read.
    assert_eq!(test.value(4).unwrap(), 8);
}

#[test]
fn waiting_writer_holds_back_new_readers() {
    let test = Arc::new(TestProcessor::memory());
    for id in 1..=3 {
        test.prime(id, 3).unwrap();
    }
    test.begin(OpTicket::new(1, 3), TxType::ReadOnly, 0).unwrap();
    test.begin(OpTicket::new(2, 3), TxType::ReadWrite, 0).unwrap();
    test.begin(OpTicket::new(3, 3), TxType::ReadOnly, 0).unwrap();
    test.read(OpTicket::new(1, 2), 6).unwrap();

    // Once T1 ends either waiter may win the key, so each one commits on
    // its own thread.
    let writer = {
        let test = Arc::clone(&test);
        thread::spawn(move || {
            test.write(OpTicket::new(2, 2), 6).unwrap();
            test.commit(OpTicket::new(2, 1)).unwrap();
        })
    };
    wait_until(|| is_waiting(&test, 2));
    let reader = {
        let test = Arc::clone(&test);
        thread::spawn(move || {
            test.read(OpTicket::new(3, 2), 6).unwrap();
            test.commit(OpTicket::new(3, 1)).unwrap();
        })
    };
    wait_until(|| is_waiting(&test, 3));
    assert_eq!(
        test.snapshot().transaction(tid(3)).unwrap().wait_target,
        Some(tid(1))
    );

    test.commit(OpTicket::new(1, 1)).unwrap();
    writer.join().unwrap();
    reader.join().unwrap();

    assert_eq!(test.value(6).unwrap(), 10 - 1 + 1 - 1);
    assert!(test.snapshot().locks.is_empty());
}

#[test]
fn missing_transaction_operations() {
    let test = TestProcessor::memory();
    test.prime(7, 3).unwrap();

    assert_eq!(
        test.read(OpTicket::new(7, 3), 1).unwrap(),
        OpOutcome::MissingTransaction
    );
    assert_eq!(
        test.write(OpTicket::new(7, 2), 1).unwrap(),
        OpOutcome::MissingTransaction
    );
    assert_eq!(
        test.commit(OpTicket::new(7, 1)).unwrap(),
        OpOutcome::MissingTransaction
    );

    assert_eq!(test.value(1).unwrap(), 10);
    assert_eq!(
        test.records(),
        vec![
            LogRecord::Missing { tid: tid(7) },
            LogRecord::Missing { tid: tid(7) },
            LogRecord::MissingOnFinish { tid: tid(7) },
        ]
    );
}

#[test]
fn operations_after_commit_find_nothing() {
    let test = TestProcessor::memory();
    let workload = Workload::new(vec![TxScript::new(1, TxType::ReadWrite).write(2)]);
    run_workload(&test, &workload).unwrap();

    test.prime(1, 1).unwrap();
    assert_eq!(
        test.write(OpTicket::new(1, 1), 2).unwrap(),
        OpOutcome::MissingTransaction
    );
    assert_eq!(test.value(2).unwrap(), 11);
}

#[test]
fn abort_releases_like_commit() {
    let test = TestProcessor::memory();
    let workload = Workload::new(vec![
        TxScript::new(1, TxType::ReadWrite).write(3).aborting(),
        TxScript::new(2, TxType::ReadWrite).write(3),
    ]);

    let report = run_workload(&test, &workload).unwrap();

    assert!(report.all_ok());
    assert_eq!(test.value(3).unwrap(), 12);
    let outcomes: Vec<_> = report
        .results
        .iter()
        .filter_map(|d| match d.result {
            Ok(OpOutcome::Finished(outcome)) => Some(outcome),
            _ => None,
        })
        .collect();
    assert!(outcomes.contains(&Outcome::Abort));
    assert!(outcomes.contains(&Outcome::Commit));
}

#[test]
fn file_log_round_trip() {
    with_file_processor(|processor, path| {
        let workload = Workload::new(vec![
            TxScript::new(1, TxType::ReadOnly).read(0).read(1).op_time(3),
            TxScript::new(2, TxType::ReadWrite).read(1).write(2),
        ]);
        run_workload(processor, &workload).unwrap();

        let contents = std::fs::read_to_string(path).unwrap();
        let records: Vec<LogRecord> = contents
            .lines()
            .map(|line| LogRecord::parse(line).unwrap())
            .collect();
        assert_eq!(records.iter().filter(|r| matches!(r, LogRecord::Begin { .. })).count(), 2);
        assert_eq!(records.iter().filter(|r| matches!(r, LogRecord::Released { .. })).count(), 2);
        assert!(records.contains(&LogRecord::Read {
            tid: TransactionId::new(1),
            object: 0,
            value: 9,
            op_time: 3,
            status: TxStatus::PartialGranted,
        }));
    });
}
