//! Object store.

use crate::error::{CoreError, CoreResult};
use crate::types::ObjectNo;

/// Fixed-size array of integer-valued objects.
///
/// The store itself is not synchronized; it lives inside the processor's
/// global gate and is only mutated while that gate is held.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    values: Vec<i64>,
}

impl ObjectStore {
    /// Creates a store of `count` objects, each set to `initial`.
    #[must_use]
    pub fn new(count: usize, initial: i64) -> Self {
        Self {
            values: vec![initial; count],
        }
    }

    /// Creates a store holding exactly `values`.
    #[must_use]
    pub fn from_values(values: Vec<i64>) -> Self {
        Self { values }
    }

    /// Number of objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the store holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the value of `object`.
    pub fn get(&self, object: ObjectNo) -> CoreResult<i64> {
        self.values
            .get(object)
            .copied()
            .ok_or(CoreError::ObjectOutOfRange {
                object,
                count: self.values.len(),
            })
    }

    /// Adds `delta` to `object` and returns the new value.
    pub fn adjust(&mut self, object: ObjectNo, delta: i64) -> CoreResult<i64> {
        let count = self.values.len();
        let slot = self
            .values
            .get_mut(object)
            .ok_or(CoreError::ObjectOutOfRange { object, count })?;
        *slot += delta;
        Ok(*slot)
    }

    /// Checks that `object` is addressable.
    pub fn check(&self, object: ObjectNo) -> CoreResult<()> {
        self.get(object).map(|_| ())
    }

    /// Returns all values.
    #[must_use]
    pub fn values(&self) -> &[i64] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_store_is_uniform() {
        let store = ObjectStore::new(4, 10);
        assert_eq!(store.len(), 4);
        assert_eq!(store.values(), &[10, 10, 10, 10]);
    }

    #[test]
    fn adjust_returns_new_value() {
        let mut store = ObjectStore::new(2, 10);
        assert_eq!(store.adjust(1, 1).unwrap(), 11);
        assert_eq!(store.adjust(1, -3).unwrap(), 8);
        assert_eq!(store.get(0).unwrap(), 10);
    }

    #[test]
    fn out_of_range_is_error() {
        let mut store = ObjectStore::new(2, 0);
        assert!(matches!(
            store.get(2),
            Err(CoreError::ObjectOutOfRange { object: 2, count: 2 })
        ));
        assert!(store.adjust(5, 1).is_err());
    }
}
