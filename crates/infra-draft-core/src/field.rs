//! Field slots and their merge rules
//!
//! Every draft field is one of:
//! - `Scalar<T>`: unset or set; later set value wins
//! - `List<T>`: accumulates; later items are appended (duplicates kept)
//! - `ReplaceList<T>`: list declared last-wins; later set list replaces
//! - `Keyed<K, V>`: merge by key; later value wins per key
//!
//! All four merges are associative and have the empty slot as identity.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::ValidationError;

/// Merge a later value into an earlier one.
///
/// `merge` must be associative, and `Default::default()` must be a left and
/// right identity.
pub trait Merge {
    fn merge(self, later: Self) -> Self;
}

/// Optional scalar field with last-write-wins semantics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Scalar<T>(Option<T>);

impl<T> Default for Scalar<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T> Scalar<T> {
    pub fn unset() -> Self {
        Self(None)
    }

    pub fn new(value: T) -> Self {
        Self(Some(value))
    }

    /// Overwrite the field, regardless of any previous value.
    pub fn set(&mut self, value: T) {
        self.0 = Some(value);
    }

    pub fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    /// Value of a required field, or `MissingRequiredField` naming it.
    pub fn require(&self, field: &'static str) -> Result<&T, ValidationError> {
        self.0.as_ref().ok_or(ValidationError::missing(field))
    }

    /// Value of an optional field, or its documented default.
    pub fn get_or(&self, default: T) -> T
    where
        T: Clone,
    {
        self.0.clone().unwrap_or(default)
    }
}

impl<T> From<T> for Scalar<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T> Merge for Scalar<T> {
    fn merge(self, later: Self) -> Self {
        Self(later.0.or(self.0))
    }
}

/// Accumulating list field. Merging appends, never overwrites.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct List<T>(Vec<T>);

impl<T> Default for List<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> List<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: T) {
        self.0.push(item);
    }

    /// Append items after the existing ones, preserving order.
    pub fn extend(&mut self, items: impl IntoIterator<Item = T>) {
        self.0.extend(items);
    }

    pub fn items(&self) -> &[T] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.0.clone()
    }
}

impl<T> From<Vec<T>> for List<T> {
    fn from(items: Vec<T>) -> Self {
        Self(items)
    }
}

impl<T> Merge for List<T> {
    fn merge(mut self, later: Self) -> Self {
        self.0.extend(later.0);
        self
    }
}

/// List field declared with last-write-wins semantics.
///
/// A set list (even an empty one) replaces any earlier list entirely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ReplaceList<T>(Option<Vec<T>>);

impl<T> Default for ReplaceList<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T> ReplaceList<T> {
    pub fn replace(&mut self, items: Vec<T>) {
        self.0 = Some(items);
    }

    pub fn get(&self) -> Option<&[T]> {
        self.0.as_deref()
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    /// Items, or an empty slice when never set.
    pub fn items(&self) -> &[T] {
        self.0.as_deref().unwrap_or(&[])
    }
}

impl<T> Merge for ReplaceList<T> {
    fn merge(self, later: Self) -> Self {
        Self(later.0.or(self.0))
    }
}

/// Keyed field: merge by key, later value wins per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Keyed<K: Ord, V>(BTreeMap<K, V>);

impl<K: Ord, V> Default for Keyed<K, V> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<K: Ord, V> Keyed<K, V> {
    pub fn insert(&mut self, key: K, value: V) {
        self.0.insert(key, value);
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = (K, V)>) {
        self.0.extend(entries);
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.0.get(key)
    }

    pub fn entries(&self) -> &BTreeMap<K, V> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Ord, V> Merge for Keyed<K, V> {
    fn merge(mut self, later: Self) -> Self {
        self.0.extend(later.0);
        self
    }
}
