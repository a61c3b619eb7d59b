//! Log sink trait definition.

use crate::error::CoreResult;
use crate::txlog::LogRecord;

/// Destination of the text log.
///
/// Sinks are called while the processor's global gate is held, so records
/// arrive in the order their state changes happened. Each record is one
/// line; the sink appends the line terminator.
pub trait LogSink: Send + Sync {
    /// Appends one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn append(&self, record: &LogRecord) -> CoreResult<()>;
}
