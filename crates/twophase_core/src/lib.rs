//! # twophase core
//!
//! Concurrency-control core for a simulated multi-threaded transaction
//! processor.
//!
//! This crate provides:
//! - A shared object store of integer-valued records
//! - A transaction registry and a hash-keyed lock table
//! - Two-phase lock admission with wait/resume on per-transaction gates
//! - Commit/abort coordination that releases locks and wakes waiters
//! - Per-transaction operation sequencing
//! - The append-only text log consumed by downstream tooling
//!
//! ## Example
//!
//! ```rust
//! use twophase_core::{Config, MemoryLog, OpTicket, Processor, TxType};
//!
//! let log = MemoryLog::new();
//! let processor = Processor::with_sink(Config::new().initial_value(10), Box::new(log.clone()))
//!     .unwrap();
//!
//! processor.prime(1, 3).unwrap();
//! processor.begin(OpTicket::new(1, 3), TxType::ReadWrite, 0).unwrap();
//! processor.write(OpTicket::new(1, 2), 5).unwrap();
//! processor.commit(OpTicket::new(1, 1)).unwrap();
//!
//! assert_eq!(processor.value(5).unwrap(), 11);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod applier;
mod command;
mod config;
mod coordinator;
mod error;
pub mod lock;
mod processor;
mod sequencer;
mod snapshot;
mod store;
pub mod transaction;
pub mod txlog;
mod types;
mod wait;

pub use command::{Command, CommandKind, OpOutcome, OpTicket};
pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use lock::{LockNode, LockTable, NodeHandle};
pub use processor::Processor;
pub use sequencer::{OpPermit, Sequencer};
pub use snapshot::{LockSnapshot, Snapshot, TransactionSnapshot};
pub use store::ObjectStore;
pub use transaction::{TransactionRecord, TransactionRegistry};
pub use txlog::{FileLog, LogRecord, LogSink, MemoryLog};
pub use types::{LockMode, ObjectNo, Outcome, SegmentId, TransactionId, TxStatus, TxType};
pub use wait::WaitGates;

/// Current crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
