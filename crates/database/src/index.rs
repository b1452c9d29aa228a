//! Secondary indexes.
//!
//! An index maps the encoded value found at a path of each document to the
//! document's key. Entries are stored in an engine store of their own:
//!
//! - unique index: key = encoded value, value = document key
//! - non-unique index: key = encoded value ++ document key ++ u32 BE length of
//!   the encoded value, value empty
//!
//! Value encodings are prefix-free, so non-unique entries sort by value and
//! then by document key. Documents without a value at the path are indexed as
//! `Null`, which sorts first.
//!
//! An `Integer` and a `Double` holding the same number are one value to an
//! index: scans from either include both, both are reported as equal to the
//! start, and a unique index accepts only one of them.

use crate::catalog::IndexConfig;
use crate::database::Tx;
use crate::error::{Error, Result};
use core::ops::ControlFlow;
use strata_core::{Document, Value, ValuePath};
use strata_encoding::{key, EncodingError};
use tracing::trace;

/// An entry produced by index iteration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    /// Encoded value.
    pub value: Vec<u8>,
    /// Key of the indexed document.
    pub key: Vec<u8>,
    /// True if the value equals the value iteration started from.
    pub is_equal: bool,
}

/// A handle on an index, bound to a transaction.
pub struct Index<'tx> {
    tx: &'tx Tx,
    config: IndexConfig,
    store: String,
}

impl<'tx> Index<'tx> {
    pub(crate) fn new(tx: &'tx Tx, config: IndexConfig) -> Self {
        let store = crate::catalog::index_store(&config.index_name);
        Self { tx, config, store }
    }

    /// Returns the index configuration.
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Returns the index name.
    pub fn name(&self) -> &str {
        &self.config.index_name
    }

    /// Returns the indexed path.
    pub fn path(&self) -> &ValuePath {
        &self.config.path
    }

    /// Returns true if the index rejects duplicate values.
    pub fn is_unique(&self) -> bool {
        self.config.unique
    }

    /// Adds an entry for `value` pointing at document `key`.
    ///
    /// A unique index fails with `DuplicateValue` if the value, or its numeric
    /// twin, is already indexed for another document.
    ///
    /// Entries of a non-unique index order by document key only when no
    /// document key is a proper prefix of another. Generated and primary keys
    /// never are; callers passing their own keys must keep that property.
    pub fn set(&self, value: &Value, key: &[u8]) -> Result<()> {
        let encoded = key::encode_value(value);
        trace!(index = self.name(), "index set");
        if !self.config.unique {
            let entry = self.entry_key(&encoded, key);
            return self.tx.write(|engine| Ok(engine.put(&self.store, &entry, &[])?));
        }

        let twin = value.numeric_twin().map(|v| key::encode_value(&v));
        self.tx.write(|engine| {
            for candidate in core::iter::once(&encoded).chain(twin.as_ref()) {
                match engine.get(&self.store, candidate) {
                    Ok(existing) if existing == key && *candidate == encoded => return Ok(()),
                    Ok(_) => {
                        return Err(Error::DuplicateValue {
                            index: self.config.index_name.clone(),
                        })
                    }
                    Err(e) if e.is_not_found() => {}
                    Err(e) => return Err(e.into()),
                }
            }
            Ok(engine.put(&self.store, &encoded, key)?)
        })
    }

    /// Removes the entry for `value` pointing at document `key`.
    pub fn delete(&self, value: &Value, key: &[u8]) -> Result<()> {
        let encoded = key::encode_value(value);
        trace!(index = self.name(), "index delete");
        let not_found = || Error::IndexEntryNotFound {
            index: self.config.index_name.clone(),
        };

        let result = self.tx.write(|engine| {
            if self.config.unique {
                if engine.get(&self.store, &encoded)? != key {
                    return Err(not_found());
                }
                engine.delete(&self.store, &encoded)?;
            } else {
                engine.delete(&self.store, &self.entry_key(&encoded, key))?;
            }
            Ok(())
        });
        match result {
            Err(e) if e.is_engine_not_found() => Err(not_found()),
            other => other,
        }
    }

    /// Indexes a document under the value found at the index path.
    pub(crate) fn set_document(&self, doc: &Document, key: &[u8]) -> Result<()> {
        self.set(&indexed_value(&self.config.path, doc)?, key)
    }

    /// Removes the entry of a document.
    pub(crate) fn delete_document(&self, doc: &Document, key: &[u8]) -> Result<()> {
        self.delete(&indexed_value(&self.config.path, doc)?, key)
    }

    /// Returns entries with a value greater than or equal to `start`, in
    /// ascending order.
    pub fn ascend(&self, start: &Value) -> IndexIter<'_, 'tx> {
        IndexIter::new(self, Direction::Ascending, Some(start))
    }

    /// Returns entries with a value less than or equal to `start`, in
    /// descending order. With no start every entry is returned.
    pub fn descend(&self, start: Option<&Value>) -> IndexIter<'_, 'tx> {
        IndexIter::new(self, Direction::Descending, start)
    }

    /// Calls `visit` for every entry with a value greater than or equal to
    /// `start`, in ascending order. An error returned by `visit` stops the
    /// iteration and is returned as is.
    pub fn ascend_greater_or_equal<F, E>(&self, start: &Value, visit: F) -> core::result::Result<(), E>
    where
        F: FnMut(&IndexEntry) -> core::result::Result<(), E>,
        E: From<Error>,
    {
        drive(self.ascend(start), visit)
    }

    /// Calls `visit` for every entry with a value less than or equal to
    /// `start`, in descending order. An error returned by `visit` stops the
    /// iteration and is returned as is.
    pub fn descend_less_or_equal<F, E>(
        &self,
        start: Option<&Value>,
        visit: F,
    ) -> core::result::Result<(), E>
    where
        F: FnMut(&IndexEntry) -> core::result::Result<(), E>,
        E: From<Error>,
    {
        drive(self.descend(start), visit)
    }

    /// Removes every entry.
    pub fn truncate(&self) -> Result<()> {
        trace!(index = self.name(), "index truncate");
        self.tx.write(|engine| Ok(engine.truncate(&self.store)?))
    }

    /// Returns the number of entries.
    pub fn len(&self) -> Result<usize> {
        self.tx.read(|engine| {
            let mut n = 0;
            engine.ascend_greater_or_equal(&self.store, &[], &mut |_, _| {
                n += 1;
                ControlFlow::Continue(())
            })?;
            Ok(n)
        })
    }

    /// Returns true if the index has no entries.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.ascend(&Value::Null).next().transpose()?.is_none())
    }

    fn entry_key(&self, encoded: &[u8], key: &[u8]) -> Vec<u8> {
        let mut entry = Vec::with_capacity(encoded.len() + key.len() + 4);
        entry.extend_from_slice(encoded);
        entry.extend_from_slice(key);
        entry.extend_from_slice(&(encoded.len() as u32).to_be_bytes());
        entry
    }

    /// Splits a stored entry into encoded value and document key.
    fn split_entry(&self, k: &[u8], v: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
        if self.config.unique {
            return Ok((k.to_vec(), v.to_vec()));
        }
        let corrupt = || Error::Encoding(EncodingError::UnexpectedEof(k.len()));
        let body_len = k.len().checked_sub(4).ok_or_else(corrupt)?;
        let len_bytes: [u8; 4] = k[body_len..].try_into().map_err(|_| corrupt())?;
        let value_len = u32::from_be_bytes(len_bytes) as usize;
        if value_len > body_len {
            return Err(corrupt());
        }
        Ok((k[..value_len].to_vec(), k[value_len..body_len].to_vec()))
    }
}

/// Returns the value a document is indexed under for `path`.
pub(crate) fn indexed_value(path: &ValuePath, doc: &Document) -> Result<Value> {
    match path.get_value(doc) {
        Ok(v) => Ok(v.clone()),
        Err(e) if e.is_not_found() => Ok(Value::Null),
        Err(e) => Err(e.into()),
    }
}

fn drive<F, E>(iter: IndexIter<'_, '_>, mut visit: F) -> core::result::Result<(), E>
where
    F: FnMut(&IndexEntry) -> core::result::Result<(), E>,
    E: From<Error>,
{
    for entry in iter {
        visit(&entry?)?;
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Ascending,
    Descending,
}

/// Lazy iterator over index entries.
///
/// Each call to `next` seeks the engine store again from the last entry
/// returned, so no engine borrow is held between calls and the caller may
/// use the transaction while iterating.
pub struct IndexIter<'a, 'tx> {
    index: &'a Index<'tx>,
    direction: Direction,
    /// Encoding the scan starts from: the lowest encoding of the start value
    /// when ascending, the highest when descending.
    start: Option<Vec<u8>>,
    /// Every encoding of the start value.
    equal: Vec<Vec<u8>>,
    last: Option<Vec<u8>>,
    done: bool,
}

impl<'a, 'tx> IndexIter<'a, 'tx> {
    fn new(index: &'a Index<'tx>, direction: Direction, start: Option<&Value>) -> Self {
        let equal: Vec<Vec<u8>> = start
            .map(|v| {
                core::iter::once(v.clone())
                    .chain(v.numeric_twin())
                    .map(|v| key::encode_value(&v))
                    .collect()
            })
            .unwrap_or_default();
        let start = match direction {
            Direction::Ascending => equal.iter().min().cloned(),
            Direction::Descending => equal.iter().max().cloned(),
        };
        Self {
            index,
            direction,
            start,
            equal,
            last: None,
            done: false,
        }
    }

    /// Finds the raw engine entry following the last one returned.
    fn seek(&self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        let store = &self.index.store;
        let unique = self.index.config.unique;
        self.index.tx.read(|engine| {
            let mut found = None;
            match (self.direction, &self.last) {
                (Direction::Ascending, Some(last)) => {
                    engine.ascend_greater_or_equal(store, last, &mut |k, v| {
                        if k == last.as_slice() {
                            return ControlFlow::Continue(());
                        }
                        found = Some((k.to_vec(), v.to_vec()));
                        ControlFlow::Break(())
                    })?;
                }
                (Direction::Ascending, None) => {
                    let start = self.start.as_deref().unwrap_or(&[]);
                    engine.ascend_greater_or_equal(store, start, &mut |k, v| {
                        found = Some((k.to_vec(), v.to_vec()));
                        ControlFlow::Break(())
                    })?;
                }
                (Direction::Descending, Some(last)) => {
                    engine.descend_less_or_equal(store, Some(last), &mut |k, v| {
                        if k == last.as_slice() {
                            return ControlFlow::Continue(());
                        }
                        found = Some((k.to_vec(), v.to_vec()));
                        ControlFlow::Break(())
                    })?;
                }
                (Direction::Descending, None) => {
                    // Non-unique entries with the start value extend its
                    // encoding, so the scan starts past every one of them.
                    let upper = match &self.start {
                        Some(start) if !unique => key::prefix_successor(start),
                        other => other.clone(),
                    };
                    engine.descend_less_or_equal(store, upper.as_deref(), &mut |k, v| {
                        if upper.as_deref() == Some(k) && !unique {
                            return ControlFlow::Continue(());
                        }
                        found = Some((k.to_vec(), v.to_vec()));
                        ControlFlow::Break(())
                    })?;
                }
            }
            Ok(found)
        })
    }
}

impl Iterator for IndexIter<'_, '_> {
    type Item = Result<IndexEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let step = self.seek().and_then(|found| match found {
            Some((k, v)) => {
                let (value, key) = self.index.split_entry(&k, &v)?;
                self.last = Some(k);
                Ok(Some((value, key)))
            }
            None => Ok(None),
        });
        match step {
            Ok(Some((value, key))) => {
                let is_equal = self.equal.contains(&value);
                Some(Ok(IndexEntry {
                    value,
                    key,
                    is_equal,
                }))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
