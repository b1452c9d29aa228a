//! Tables.
//!
//! A `Table` stores documents in an engine store keyed by document key, and
//! keeps every index registered on the table in step with its documents.
//! Indexes are read from the catalog on each mutation, so an index created
//! through the transaction is maintained by tables opened before it.

use crate::catalog::{self, TableInfo};
use crate::constraint::validate_and_convert;
use crate::database::Tx;
use crate::error::{Error, Result};
use crate::index::Index;
use crate::keygen;
use core::ops::ControlFlow;
use hashbrown::HashMap;
use strata_core::Document;
use tracing::{debug, trace};

/// A handle on a table, bound to a transaction.
pub struct Table<'tx> {
    tx: &'tx Tx,
    info: TableInfo,
    store: String,
}

impl<'tx> Table<'tx> {
    pub(crate) fn new(tx: &'tx Tx, info: TableInfo) -> Self {
        let store = catalog::table_store(&info.table_name);
        Self { tx, info, store }
    }

    /// Returns the table name.
    pub fn name(&self) -> &str {
        &self.info.table_name
    }

    /// Returns the table metadata as of when the handle was opened.
    pub fn info(&self) -> &TableInfo {
        &self.info
    }

    /// Validates and stores a document, then indexes it.
    ///
    /// Returns the key the document was stored under. On error the
    /// transaction may hold part of the writes and should be rolled back.
    pub fn insert(&self, doc: &Document) -> Result<Vec<u8>> {
        let doc = validate_and_convert(doc, &self.info.field_constraints)?;
        let key = keygen::generate_key(self.tx, &self.info, &doc)?;

        let encoded = self.tx.codec().encode(&doc);
        self.tx.write(|engine| match engine.get(&self.store, &key) {
            Ok(_) => Err(Error::DuplicateDocument),
            Err(e) if e.is_not_found() => Ok(engine.put(&self.store, &key, &encoded)?),
            Err(e) => Err(e.into()),
        })?;

        for index in self.load_indexes()? {
            index.set_document(&doc, &key)?;
        }
        trace!(table = self.name(), "insert");
        Ok(key)
    }

    /// Returns the document stored under `key`, with its key set.
    pub fn get_document(&self, key: &[u8]) -> Result<Document> {
        let bytes = self
            .tx
            .read(|engine| Ok(engine.get(&self.store, key)?))
            .map_err(|e| {
                if e.is_engine_not_found() {
                    Error::DocumentNotFound
                } else {
                    e
                }
            })?;
        let mut doc = self.tx.codec().decode(&bytes)?;
        doc.set_key(key.to_vec());
        Ok(doc)
    }

    /// Deletes the document stored under `key` and its index entries.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        let doc = self.get_document(key)?;
        self.tx.write(|engine| Ok(engine.delete(&self.store, key)?))?;
        for index in self.load_indexes()? {
            index.delete_document(&doc, key)?;
        }
        trace!(table = self.name(), "delete");
        Ok(())
    }

    /// Replaces the document stored under `key`. The key does not change.
    pub fn replace(&self, key: &[u8], doc: &Document) -> Result<()> {
        let old = self.get_document(key)?;
        let doc = validate_and_convert(doc, &self.info.field_constraints)?;
        let indexes = self.load_indexes()?;

        for index in &indexes {
            index.delete_document(&old, key)?;
        }
        let encoded = self.tx.codec().encode(&doc);
        self.tx.write(|engine| Ok(engine.put(&self.store, key, &encoded)?))?;
        for index in &indexes {
            index.set_document(&doc, key)?;
        }
        trace!(table = self.name(), "replace");
        Ok(())
    }

    /// Deletes every document and empties every index of the table.
    pub fn truncate(&self) -> Result<()> {
        self.tx.write(|engine| Ok(engine.truncate(&self.store)?))?;
        for index in self.load_indexes()? {
            index.truncate()?;
        }
        debug!(table = self.name(), "truncate");
        Ok(())
    }

    /// Calls `visit` with every document in key order. An error returned by
    /// `visit` stops the iteration and is returned as is.
    pub fn iterate<F, E>(&self, mut visit: F) -> core::result::Result<(), E>
    where
        F: FnMut(Document) -> core::result::Result<(), E>,
        E: From<Error>,
    {
        for doc in self.documents() {
            visit(doc?)?;
        }
        Ok(())
    }

    /// Returns a lazy iterator over the documents in key order.
    pub fn documents(&self) -> Documents<'_, 'tx> {
        Documents {
            table: self,
            last: None,
            done: false,
        }
    }

    /// Rebuilds one index of the table, or all of them, from the stored
    /// documents.
    pub fn reindex(&self, index_name: Option<&str>) -> Result<()> {
        let mut indexes = self.load_indexes()?;
        if let Some(name) = index_name {
            indexes.retain(|idx| idx.name() == name);
            if indexes.is_empty() {
                return Err(Error::index_not_found(name));
            }
        }
        if indexes.is_empty() {
            return Ok(());
        }

        for index in &indexes {
            index.truncate()?;
        }
        for doc in self.documents() {
            let doc = doc?;
            let key = doc.key().unwrap_or_default();
            for index in &indexes {
                index.set_document(&doc, key)?;
            }
        }
        debug!(table = self.name(), indexes = indexes.len(), "reindex");
        Ok(())
    }

    /// Returns the indexes of the table keyed by indexed path. A table never
    /// has two indexes on one path.
    pub fn indexes(&self) -> Result<HashMap<String, Index<'tx>>> {
        Ok(self
            .load_indexes()?
            .into_iter()
            .map(|idx| (idx.path().to_string(), idx))
            .collect())
    }

    fn load_indexes(&self) -> Result<Vec<Index<'tx>>> {
        let configs = self
            .tx
            .read(|engine| catalog::list_index_configs(engine, &self.info.table_name))?;
        Ok(configs
            .into_iter()
            .map(|config| Index::new(self.tx, config))
            .collect())
    }

    /// Finds the document stored right after `last`, or the first one.
    fn next_after(&self, last: Option<&[u8]>) -> Result<Option<Document>> {
        let found = self.tx.read(|engine| {
            let mut found = None;
            engine.ascend_greater_or_equal(&self.store, last.unwrap_or(&[]), &mut |k, v| {
                if Some(k) == last {
                    return ControlFlow::Continue(());
                }
                found = Some((k.to_vec(), v.to_vec()));
                ControlFlow::Break(())
            })?;
            Ok(found)
        })?;

        match found {
            Some((key, bytes)) => {
                let doc = self.tx.codec().decode(&bytes)?;
                Ok(Some(doc.with_key(key)))
            }
            None => Ok(None),
        }
    }
}

/// Lazy iterator over the documents of a table.
///
/// Each call to `next` seeks the table again from the last key returned, so
/// no engine borrow is held between calls.
pub struct Documents<'a, 'tx> {
    table: &'a Table<'tx>,
    last: Option<Vec<u8>>,
    done: bool,
}

impl Iterator for Documents<'_, '_> {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.table.next_after(self.last.as_deref()) {
            Ok(Some(doc)) => {
                self.last = doc.key().map(<[u8]>::to_vec);
                Some(Ok(doc))
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
