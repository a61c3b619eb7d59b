//! Check-log command implementation.

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use twophase_core::{LogRecord, TransactionId};

/// Log check result.
#[derive(Debug, Default, Serialize)]
pub struct LogSummary {
    /// Number of lines read.
    pub lines: usize,
    /// Begin records.
    pub begins: usize,
    /// Read records.
    pub reads: usize,
    /// Write records.
    pub writes: usize,
    /// Lock release lines.
    pub releases: usize,
    /// Commit records.
    pub commits: usize,
    /// Abort records.
    pub aborts: usize,
    /// Operations on missing transactions.
    pub missing: usize,
    /// Transactions that began but never committed or aborted.
    pub unfinished: Vec<u64>,
    /// Lines that matched no record format, with their 1-based line numbers.
    pub invalid: Vec<(usize, String)>,
}

impl LogSummary {
    fn is_ok(&self) -> bool {
        self.invalid.is_empty() && self.unfinished.is_empty()
    }
}

/// Summarizes log `contents`.
pub fn summarize(contents: &str) -> LogSummary {
    let mut summary = LogSummary::default();
    let mut open: BTreeSet<TransactionId> = BTreeSet::new();

    for (index, line) in contents.lines().enumerate() {
        summary.lines += 1;
        let record = match LogRecord::parse(line) {
            Ok(record) => record,
            Err(_) => {
                summary.invalid.push((index + 1, line.to_string()));
                continue;
            }
        };
        match record {
            LogRecord::Begin { tid, .. } => {
                summary.begins += 1;
                open.insert(tid);
            }
            LogRecord::Read { .. } => summary.reads += 1,
            LogRecord::Write { .. } => summary.writes += 1,
            LogRecord::Released { .. } => summary.releases += 1,
            LogRecord::Commit { tid } => {
                summary.commits += 1;
                open.remove(&tid);
            }
            LogRecord::Abort { tid } => {
                summary.aborts += 1;
                open.remove(&tid);
            }
            LogRecord::Missing { .. } | LogRecord::MissingOnFinish { .. } => summary.missing += 1,
        }
    }

    summary.unfinished = open.into_iter().map(TransactionId::as_u64).collect();
    summary
}

/// Runs the check-log command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("Log file not found: {}", path.display()).into());
    }
    let summary = summarize(&std::fs::read_to_string(path)?);

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        _ => {
            println!("Checking log at {:?}", path);
            println!();
            print_text_output(&summary);
        }
    }

    if summary.is_ok() {
        Ok(())
    } else {
        Err("Log check failed".into())
    }
}

fn print_text_output(summary: &LogSummary) {
    println!("Lines:      {}", summary.lines);
    println!("Begins:     {}", summary.begins);
    println!("Reads:      {}", summary.reads);
    println!("Writes:     {}", summary.writes);
    println!("Releases:   {}", summary.releases);
    println!("Commits:    {}", summary.commits);
    println!("Aborts:     {}", summary.aborts);
    println!("Missing:    {}", summary.missing);
    if !summary.unfinished.is_empty() {
        println!("Unfinished: {:?}", summary.unfinished);
    }
    for (line_no, line) in &summary.invalid {
        println!("  line {line_no}: invalid record {line:?}");
    }
    println!();
    if summary.is_ok() {
        println!("✓ Log check passed");
    } else {
        println!("✗ Log check failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_records() {
        let contents = "T1\tW \tBeginTx\n\
                        T1\t  \tWriteTx \t 5:11:0  \t\t WriteLock \t Granted \tP\n\
                        5 : 11 \t\n\
                        T1\t  \tCommitTx \t\n\
                        \t Transaction 2 doesn't exist or aborted.\n";

        let summary = summarize(contents);

        assert!(summary.is_ok());
        assert_eq!(summary.lines, 5);
        assert_eq!(summary.begins, 1);
        assert_eq!(summary.writes, 1);
        assert_eq!(summary.releases, 1);
        assert_eq!(summary.commits, 1);
        assert_eq!(summary.missing, 1);
    }

    #[test]
    fn flags_unfinished_and_invalid() {
        let contents = "T3\tR \tBeginTx\ngarbage\n";

        let summary = summarize(contents);

        assert!(!summary.is_ok());
        assert_eq!(summary.unfinished, vec![3]);
        assert_eq!(summary.invalid, vec![(2, "garbage".to_string())]);
    }
}
