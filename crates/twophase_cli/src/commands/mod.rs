//! CLI command implementations.

pub mod check_log;
pub mod simulate;
