//! Transaction records and the registry that owns them.
//!
//! A record is created on Begin, mutated by the lock manager and the
//! commit/abort coordinator, and unlinked on Commit or Abort. At most one
//! record exists per transaction id.

mod record;
mod registry;

pub use record::{PendingRequest, TransactionRecord};
pub use registry::TransactionRegistry;
