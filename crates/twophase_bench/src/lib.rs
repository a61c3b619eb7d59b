//! Benchmark utilities.

use rand::rngs::StdRng;
use rand::SeedableRng;
use twophase_core::{Config, CoreResult, LogRecord, LogSink, Processor, TxType};
use twophase_testkit::{random_workload, TxScript, Workload, WorkloadParams};

/// Sink that drops every record, so long runs measure locking alone.
#[derive(Debug, Default)]
pub struct NullLog;

impl LogSink for NullLog {
    fn append(&self, _record: &LogRecord) -> CoreResult<()> {
        Ok(())
    }
}

/// Creates a processor with a [`NullLog`], sized for `transactions` ids.
pub fn bench_processor(transactions: usize, objects: usize) -> Processor {
    let config = Config::new()
        .object_count(objects)
        .max_transactions(transactions + 1);
    Processor::with_sink(config, Box::new(NullLog)).unwrap()
}

/// Workload in which every transaction writes object 0.
pub fn hot_object_workload(transactions: usize) -> Workload {
    Workload::new(
        (1..=transactions as u64)
            .map(|id| TxScript::new(id, TxType::ReadWrite).write(0))
            .collect(),
    )
}

/// Workload of read-only transactions that all read objects `0..reads`.
pub fn shared_read_workload(transactions: usize, reads: usize) -> Workload {
    Workload::new(
        (1..=transactions as u64)
            .map(|id| (0..reads).fold(TxScript::new(id, TxType::ReadOnly), TxScript::read))
            .collect(),
    )
}

/// Seeded mixed workload.
pub fn mixed_workload(transactions: usize, objects: usize, seed: u64) -> Workload {
    let params = WorkloadParams {
        transactions,
        object_count: objects,
        ..WorkloadParams::default()
    };
    random_workload(&mut StdRng::seed_from_u64(seed), &params)
}
