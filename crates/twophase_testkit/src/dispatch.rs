//! Thread-per-command workload driver.
//!
//! Every command of a workload runs on its own thread, the way the
//! simulator's workload driver dispatches them. The sequencer keeps each
//! transaction's operations in order; operations of different
//! transactions interleave freely.

use crate::workload::Workload;
use std::thread;
use twophase_core::{Command, CoreResult, OpOutcome, Processor};

/// Result of one dispatched command.
#[derive(Debug)]
pub struct Dispatched {
    /// The command.
    pub command: Command,
    /// What the processor returned.
    pub result: CoreResult<OpOutcome>,
}

/// Results of a dispatched workload, in dispatch order.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// One entry per command.
    pub results: Vec<Dispatched>,
}

impl DispatchReport {
    /// Number of commands that returned an error.
    pub fn error_count(&self) -> usize {
        self.results.iter().filter(|d| d.result.is_err()).count()
    }

    /// Number of commands that found their transaction missing.
    pub fn missing_count(&self) -> usize {
        self.results
            .iter()
            .filter(|d| matches!(d.result, Ok(OpOutcome::MissingTransaction)))
            .count()
    }

    /// Returns `true` if every command returned `Ok`.
    pub fn all_ok(&self) -> bool {
        self.error_count() == 0
    }
}

/// Primes the sequencer for every transaction and dispatches every command
/// on its own thread. Returns once all threads have finished.
///
/// Commands are spawned round-robin across transactions, with each
/// transaction's commands in reverse submission order, so the sequencer
/// rather than spawn order decides when they run.
pub fn run_workload(processor: &Processor, workload: &Workload) -> CoreResult<DispatchReport> {
    for script in &workload.transactions {
        processor.prime(script.tid, script.op_count())?;
    }

    let mut per_tx: Vec<Vec<Command>> = workload
        .transactions
        .iter()
        .map(|script| script.commands())
        .collect();
    let mut order = Vec::with_capacity(workload.op_count());
    while per_tx.iter().any(|commands| !commands.is_empty()) {
        for commands in &mut per_tx {
            if let Some(command) = commands.pop() {
                order.push(command);
            }
        }
    }

    let results = thread::scope(|scope| {
        let handles: Vec<_> = order
            .into_iter()
            .map(|command| {
                let handle = scope.spawn(move || processor.execute(&command));
                (command, handle)
            })
            .collect();
        handles
            .into_iter()
            .map(|(command, handle)| Dispatched {
                command,
                result: handle.join().expect("Dispatch thread panicked"),
            })
            .collect()
    });

    Ok(DispatchReport { results })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestProcessor;
    use crate::workload::TxScript;
    use twophase_core::TxType;

    #[test]
    fn single_transaction_runs_in_order() {
        let test = TestProcessor::memory();
        let workload = Workload::new(vec![TxScript::new(1, TxType::ReadWrite)
            .read(3)
            .write(3)
            .write(4)]);

        let report = run_workload(&test, &workload).unwrap();

        assert!(report.all_ok());
        assert_eq!(report.results.len(), 5);
        assert_eq!(test.value(3).unwrap(), 10);
        assert_eq!(test.value(4).unwrap(), 11);
        let lines = test.lines();
        assert_eq!(lines.first().unwrap(), "T1\tW \tBeginTx");
        assert_eq!(lines.last().unwrap(), "T1\t  \tCommitTx \t");
    }
}
