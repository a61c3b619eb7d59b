//! Lock table and two-phase lock admission.
//!
//! Locks are only ever released as a whole at Commit or Abort, so the
//! growing and shrinking phases of 2PL fall out of the call pattern.

pub(crate) mod manager;
mod table;

pub use table::{LockKey, LockNode, LockTable, NodeHandle};
