//! Processor configuration.

use crate::error::{CoreError, CoreResult};
use crate::types::SegmentId;
use std::path::PathBuf;

/// Configuration for building a [`Processor`](crate::Processor).
///
/// Sizes are fixed at construction: the object store and every
/// per-transaction pool (sequencer slots, wait gates, registry slots) are
/// allocated up front and never grow.
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of objects in the store.
    pub object_count: usize,

    /// Value every object starts with.
    pub initial_value: i64,

    /// Number of transaction id slots. Valid ids are `0..max_transactions`.
    pub max_transactions: usize,

    /// Segment every lock is taken in.
    pub segment: SegmentId,

    /// Path of the append-only text log, used by [`Processor::open`](crate::Processor::open).
    pub log_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            object_count: 64,
            initial_value: 0,
            max_transactions: 128,
            segment: 1,
            log_path: None,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of objects.
    #[must_use]
    pub const fn object_count(mut self, count: usize) -> Self {
        self.object_count = count;
        self
    }

    /// Sets the initial object value.
    #[must_use]
    pub const fn initial_value(mut self, value: i64) -> Self {
        self.initial_value = value;
        self
    }

    /// Sets the number of transaction id slots.
    #[must_use]
    pub const fn max_transactions(mut self, count: usize) -> Self {
        self.max_transactions = count;
        self
    }

    /// Sets the lock segment.
    #[must_use]
    pub const fn segment(mut self, segment: SegmentId) -> Self {
        self.segment = segment;
        self
    }

    /// Sets the text log path.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Checks the configuration for unusable sizes.
    pub fn validate(&self) -> CoreResult<()> {
        if self.object_count == 0 {
            return Err(CoreError::invalid_config("object_count must be non-zero"));
        }
        if self.max_transactions == 0 {
            return Err(CoreError::invalid_config(
                "max_transactions must be non-zero",
            ));
        }
        Ok(())
    }
}
