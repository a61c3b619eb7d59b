//! Workload generators.
//!
//! Every generated transaction touches its objects in nondecreasing
//! object order. A transaction only ever waits on the holder of an object
//! above everything it already holds, so no wait cycle can form and every
//! generated workload runs to completion.

use crate::workload::{TxScript, Workload};
use proptest::prelude::*;
use rand::Rng;
use twophase_core::{ObjectNo, TransactionId, TxType};

/// Shape of a generated workload.
#[derive(Debug, Clone)]
pub struct WorkloadParams {
    /// Number of transactions.
    pub transactions: usize,
    /// Upper bound on accesses per transaction.
    pub max_accesses: usize,
    /// Objects to draw from.
    pub object_count: usize,
    /// Fraction of read-only transactions.
    pub read_only_ratio: f64,
    /// Fraction of transactions ending in abort.
    pub abort_ratio: f64,
}

impl Default for WorkloadParams {
    fn default() -> Self {
        Self {
            transactions: 8,
            max_accesses: 4,
            object_count: 8,
            read_only_ratio: 0.5,
            abort_ratio: 0.2,
        }
    }
}

/// Builds a script whose accesses are sorted by object.
///
/// Read-only transactions only read; `is_write` flags are ignored for them.
pub fn ordered_script(
    tid: TransactionId,
    read_only: bool,
    mut accesses: Vec<(ObjectNo, bool)>,
    abort: bool,
) -> TxScript {
    let tx_type = if read_only {
        TxType::ReadOnly
    } else {
        TxType::ReadWrite
    };
    if read_only {
        accesses.iter_mut().for_each(|access| access.1 = false);
    }
    accesses.sort_unstable();

    let mut script = TxScript::new(tid, tx_type).op_time(tid.as_u64());
    for (object, is_write) in accesses {
        script = if is_write {
            script.write(object)
        } else {
            script.read(object)
        };
    }
    if abort {
        script = script.aborting();
    }
    script
}

/// Generates a deadlock-free workload from a seeded random source.
pub fn random_workload<R: Rng>(rng: &mut R, params: &WorkloadParams) -> Workload {
    let transactions = (1..=params.transactions as u64)
        .map(|id| {
            let read_only = rng.gen_bool(params.read_only_ratio);
            let count = rng.gen_range(0..=params.max_accesses);
            let accesses = (0..count)
                .map(|_| (rng.gen_range(0..params.object_count), rng.gen_bool(0.5)))
                .collect();
            let abort = rng.gen_bool(params.abort_ratio);
            ordered_script(TransactionId::new(id), read_only, accesses, abort)
        })
        .collect();
    Workload::new(transactions)
}

/// Strategy for the accesses of one transaction.
pub fn access_strategy(
    object_count: usize,
    max_accesses: usize,
) -> impl Strategy<Value = Vec<(ObjectNo, bool)>> {
    prop::collection::vec((0..object_count, any::<bool>()), 0..=max_accesses)
}

/// Strategy for deadlock-free workloads with ids `1..=n`.
pub fn workload_strategy(
    max_transactions: usize,
    max_accesses: usize,
    object_count: usize,
) -> impl Strategy<Value = Workload> {
    prop::collection::vec(
        (
            any::<bool>(),
            access_strategy(object_count, max_accesses),
            prop::bool::weighted(0.2),
        ),
        1..=max_transactions,
    )
    .prop_map(|specs| {
        let transactions = specs
            .into_iter()
            .zip(1u64..)
            .map(|((read_only, accesses, abort), id)| {
                ordered_script(TransactionId::new(id), read_only, accesses, abort)
            })
            .collect();
        Workload::new(transactions)
    })
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropertyTestConfig {
    /// Number of test cases to generate.
    pub cases: u32,
    /// Maximum transactions per workload.
    pub max_transactions: usize,
    /// Maximum accesses per transaction.
    pub max_accesses: usize,
    /// Objects to draw from.
    pub object_count: usize,
}

impl Default for PropertyTestConfig {
    fn default() -> Self {
        Self {
            cases: 64,
            max_transactions: 6,
            max_accesses: 4,
            object_count: 4,
        }
    }
}

impl PropertyTestConfig {
    /// Converts to proptest config.
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            ..ProptestConfig::default()
        }
    }

    /// Workload strategy sized by this configuration.
    pub fn workloads(&self) -> impl Strategy<Value = Workload> {
        workload_strategy(self.max_transactions, self.max_accesses, self.object_count)
    }
}
