//! Document structure for Strata.
//!
//! A `Document` is an ordered list of uniquely named fields. Field order is
//! insertion order and survives encoding. Documents read back from storage also
//! carry the key they were stored under.

use crate::error::{Error, Result};
use crate::value::Value;
use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;

/// An ordered collection of named values.
#[derive(Clone, Debug, Default)]
pub struct Document {
    /// Fields in insertion order. Names are unique.
    fields: Vec<(String, Value)>,
    /// Storage key, set once the document has been stored.
    key: Option<Vec<u8>>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty document with room for `capacity` fields.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
            key: None,
        }
    }

    /// Adds a field and returns the document, for chaining.
    ///
    /// If a field with the same name exists its value is replaced in place.
    pub fn add(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets a field, replacing the value of an existing field with the same name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Gets a field value by name.
    pub fn get_by_field(&self, name: &str) -> Result<&Value> {
        self.get(name).ok_or_else(|| Error::field_not_found(name))
    }

    /// Gets a field value by name, or None.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Gets a mutable reference to a field value by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Removes a field and returns its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let pos = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(pos).1)
    }

    /// Returns true if the document has a field with this name.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns an iterator over `(name, value)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Returns an iterator over field names in field order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Returns the number of fields.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the document has no fields.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the storage key, if the document was read from a table.
    #[inline]
    pub fn key(&self) -> Option<&[u8]> {
        self.key.as_deref()
    }

    /// Sets the storage key.
    pub fn set_key(&mut self, key: Vec<u8>) {
        self.key = Some(key);
    }

    /// Returns the document with the given storage key.
    pub fn with_key(mut self, key: Vec<u8>) -> Self {
        self.key = Some(key);
        self
    }

    /// Compares two documents field by field: name first, then value.
    pub(crate) fn cmp_fields(&self, other: &Document) -> Ordering {
        let lhs = self.fields.iter().map(|(n, v)| (n.as_bytes(), v));
        let rhs = other.fields.iter().map(|(n, v)| (n.as_bytes(), v));
        lhs.cmp(rhs)
    }
}

/// Two documents are equal when they hold the same fields in the same order.
/// The storage key does not take part in the comparison.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl Eq for Document {}

impl<N: Into<String>, V: Into<Value>> FromIterator<(N, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut doc = Document::new();
        for (name, value) in iter {
            doc.set(name, value);
        }
        doc
    }
}
