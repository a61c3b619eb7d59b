//! Simulate command implementation.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};
use twophase_core::{Config, MemoryLog, Processor};
use twophase_testkit::{random_workload, run_workload, watch_invariants, WorkloadParams};

/// Options for a simulation run.
#[derive(Debug, Clone)]
pub struct SimulateOptions {
    /// Number of transactions.
    pub transactions: usize,
    /// Maximum accesses per transaction.
    pub max_accesses: usize,
    /// Number of objects.
    pub objects: usize,
    /// Initial object value.
    pub initial: i64,
    /// Fraction of read-only transactions.
    pub read_only_ratio: f64,
    /// Fraction of aborting transactions.
    pub abort_ratio: f64,
    /// Generator seed.
    pub seed: u64,
    /// Log file, or `None` to keep the log in memory.
    pub log: Option<PathBuf>,
}

/// Outcome of a simulation run.
#[derive(Debug, Serialize)]
pub struct SimulationSummary {
    /// Generator seed.
    pub seed: u64,
    /// Transactions dispatched.
    pub transactions: usize,
    /// Commands dispatched.
    pub commands: usize,
    /// Commands that returned an error.
    pub errors: usize,
    /// Invariant violations observed while running.
    pub violations: Vec<String>,
    /// Final object values.
    pub values: Vec<i64>,
    /// Object values predicted from the workload.
    pub expected_values: Vec<i64>,
    /// Log lines, when the log was kept in memory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<Vec<String>>,
}

impl SimulationSummary {
    fn is_ok(&self) -> bool {
        self.errors == 0 && self.violations.is_empty() && self.values == self.expected_values
    }
}

fn check_ratio(name: &str, ratio: f64) -> Result<(), Box<dyn std::error::Error>> {
    if (0.0..=1.0).contains(&ratio) {
        Ok(())
    } else {
        Err(format!("{name} must be between 0 and 1, got {ratio}").into())
    }
}

/// Runs a simulation and returns its summary.
pub fn simulate(options: &SimulateOptions) -> Result<SimulationSummary, Box<dyn std::error::Error>> {
    check_ratio("read-only ratio", options.read_only_ratio)?;
    check_ratio("abort ratio", options.abort_ratio)?;

    let config = Config::new()
        .object_count(options.objects)
        .initial_value(options.initial)
        .max_transactions(options.transactions + 1);
    let memory = MemoryLog::new();
    let processor = match &options.log {
        Some(path) => Processor::open(config.log_path(path))?,
        None => Processor::with_sink(config, Box::new(memory.clone()))?,
    };

    let params = WorkloadParams {
        transactions: options.transactions,
        max_accesses: options.max_accesses,
        object_count: options.objects,
        read_only_ratio: options.read_only_ratio,
        abort_ratio: options.abort_ratio,
    };
    let workload = random_workload(&mut StdRng::seed_from_u64(options.seed), &params);
    info!(
        transactions = workload.transactions.len(),
        commands = workload.op_count(),
        seed = options.seed,
        "dispatching workload"
    );

    let (report, violations) = watch_invariants(&processor, || run_workload(&processor, &workload));
    let report = report?;
    for dispatched in report.results.iter() {
        if let Err(err) = &dispatched.result {
            warn!("{:?} failed: {err}", dispatched.command);
        }
    }

    Ok(SimulationSummary {
        seed: options.seed,
        transactions: workload.transactions.len(),
        commands: report.results.len(),
        errors: report.error_count(),
        violations: violations.iter().map(ToString::to_string).collect(),
        values: processor.snapshot().values,
        expected_values: workload.expected_values(options.objects, options.initial),
        log: options.log.is_none().then(|| memory.lines()),
    })
}

/// Runs the simulate command.
pub fn run(options: &SimulateOptions, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let summary = simulate(options)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        _ => {
            print_text_output(&summary);
        }
    }

    if summary.is_ok() {
        Ok(())
    } else {
        Err("Simulation failed".into())
    }
}

fn print_text_output(summary: &SimulationSummary) {
    if let Some(lines) = &summary.log {
        for line in lines {
            println!("{line}");
        }
        println!();
    }

    println!("Seed:          {}", summary.seed);
    println!("Transactions:  {}", summary.transactions);
    println!("Commands:      {}", summary.commands);
    println!("Errors:        {}", summary.errors);
    println!("Violations:    {}", summary.violations.len());
    for violation in &summary.violations {
        println!("  {violation}");
    }
    println!("Final values:  {:?}", summary.values);
    if summary.values != summary.expected_values {
        println!("Expected:      {:?}", summary.expected_values);
    }
    println!();
    if summary.is_ok() {
        println!("✓ Simulation passed");
    } else {
        println!("✗ Simulation failed");
    }
}
