//! SnapshotCache - last displayed value per field
//!
//! One instance lives for the whole session, owned by the engine actor.
//! A field with no entry is "unknown": the next observed value always counts
//! as a change.

use std::collections::HashMap;

use super::types::{Field, Scalar};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotCache {
    values: HashMap<Field, Scalar>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: Field) -> Option<&Scalar> {
        self.values.get(&field)
    }

    /// Store `value` if it differs from the cached one.
    ///
    /// Returns true when the field changed (including first sight).
    pub fn update(&mut self, field: Field, value: Scalar) -> bool {
        match self.values.get(&field) {
            Some(current) if *current == value => false,
            _ => {
                self.values.insert(field, value);
                true
            }
        }
    }

    /// Forget a field so its next value is treated as fresh
    pub fn clear(&mut self, field: Field) {
        self.values.remove(&field);
    }

    pub fn contains(&self, field: Field) -> bool {
        self.values.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copy of every entry, for status dumps and assertions
    pub fn entries(&self) -> HashMap<Field, Scalar> {
        self.values.clone()
    }
}
