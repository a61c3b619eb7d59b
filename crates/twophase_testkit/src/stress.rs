//! Stress tests for the locking core.
//!
//! These tests verify behavior under heavy contention.

use crate::dispatch::run_workload;
use crate::generators::{random_workload, WorkloadParams};
use crate::workload::{TxScript, Workload};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::{Duration, Instant};
use twophase_core::{Processor, TransactionId, TxType};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of transactions per round.
    pub transactions: usize,
    /// Number of rounds.
    pub rounds: usize,
    /// Upper bound on accesses per transaction.
    pub max_accesses: usize,
    /// Number of distinct objects.
    pub object_count: usize,
    /// Seed for the workload generator.
    pub seed: u64,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            transactions: 16,
            rounds: 10,
            max_accesses: 6,
            object_count: 8,
            seed: 0x2b1,
        }
    }
}

/// Shifts every id in `workload` so rounds never reuse an id.
fn offset_ids(mut workload: Workload, offset: u64) -> Workload {
    for script in &mut workload.transactions {
        script.tid = TransactionId::new(script.tid.as_u64() + offset);
    }
    workload
}

fn run_rounds(processor: &Processor, rounds: impl Iterator<Item = Workload>) -> StressTestResult {
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for workload in rounds {
        match run_workload(processor, &workload) {
            Ok(report) => {
                failed += report.error_count();
                successful += report.results.len() - report.error_count();
            }
            Err(_) => failed += workload.op_count(),
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Runs rounds of random mixed workloads.
///
/// The processor must allow ids up to `transactions * rounds`.
pub fn stress_mixed_workloads(processor: &Processor, config: &StressConfig) -> StressTestResult {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let params = WorkloadParams {
        transactions: config.transactions,
        max_accesses: config.max_accesses,
        object_count: config.object_count,
        ..WorkloadParams::default()
    };
    let rounds = (0..config.rounds).map(move |round| {
        offset_ids(
            random_workload(&mut rng, &params),
            (round * params.transactions) as u64,
        )
    });
    run_rounds(processor, rounds)
}

/// Runs rounds in which every transaction writes the same object.
pub fn stress_hot_object(processor: &Processor, config: &StressConfig) -> StressTestResult {
    let rounds = (0..config.rounds).map(|round| {
        let base = (round * config.transactions) as u64;
        Workload::new(
            (1..=config.transactions as u64)
                .map(|id| TxScript::new(base + id, TxType::ReadWrite).write(0))
                .collect(),
        )
    });
    run_rounds(processor, rounds)
}

/// Runs rounds of read-only transactions that all read the same objects.
pub fn stress_shared_readers(processor: &Processor, config: &StressConfig) -> StressTestResult {
    let rounds = (0..config.rounds).map(|round| {
        let base = (round * config.transactions) as u64;
        Workload::new(
            (1..=config.transactions as u64)
                .map(|id| {
                    (0..config.object_count.min(config.max_accesses))
                        .fold(TxScript::new(base + id, TxType::ReadOnly), TxScript::read)
                })
                .collect(),
        )
    });
    run_rounds(processor, rounds)
}
