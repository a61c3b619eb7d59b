//! The append-only text log.
//!
//! Downstream tooling reads this stream, so the rendering of every
//! [`LogRecord`] is fixed character for character. Diagnostics that are not
//! part of that contract go through `tracing` instead.
//!
//! ## Available Sinks
//!
//! - [`FileLog`] - Appends to a file, flushing after every record
//! - [`MemoryLog`] - Keeps lines in memory for tests

mod file;
mod memory;
mod record;
mod sink;

pub use file::FileLog;
pub use memory::MemoryLog;
pub use record::LogRecord;
pub use sink::LogSink;
