//! # twophase testkit
//!
//! Test utilities for the twophase locking core.
//!
//! This crate provides:
//! - Workload descriptions that expand into dispatched commands
//! - Processor fixtures backed by an in-memory or temporary file log
//! - A thread-per-command driver
//! - Property-based and seeded random workload generators
//! - Lock-state invariant checks over processor snapshots
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust,ignore
//! use twophase_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_processor() {
//!     with_processor(|processor, log| {
//!         // ... dispatch commands
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod dispatch;
pub mod fixtures;
pub mod generators;
pub mod invariants;
pub mod stress;
pub mod workload;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dispatch::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::invariants::*;
    pub use crate::stress::*;
    pub use crate::workload::*;
}

pub use dispatch::*;
pub use fixtures::*;
pub use generators::*;
pub use invariants::*;
pub use stress::*;
pub use workload::*;
