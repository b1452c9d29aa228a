//! Database - entry point for Strata.
//!
//! A `Database` wraps an engine and hands out transactions. Tables and indexes
//! are opened through a transaction and live as long as it does.

use crate::catalog::{self, IndexConfig, TableInfo, INDEXES_STORE, TABLES_STORE};
use crate::error::{Error, Result};
use crate::index::Index;
use crate::table::Table;
use core::cell::RefCell;
use std::sync::Arc;
use strata_encoding::{BinaryCodec, Codec};
use strata_engine::{Engine, Transaction, TransactionState};
use tracing::{debug, warn};

/// Database options.
#[derive(Clone)]
pub struct Options {
    /// Codec used to store documents.
    pub codec: Arc<dyn Codec>,
}

impl Options {
    /// Returns options using the given codec.
    pub fn with_codec(codec: impl Codec + 'static) -> Self {
        Self {
            codec: Arc::new(codec),
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::with_codec(BinaryCodec::new())
    }
}

/// A document database on top of a key-value engine.
pub struct Database {
    engine: Arc<dyn Engine>,
    options: Options,
}

impl Database {
    /// Opens a database on `engine`, creating the catalog if needed.
    pub fn new(engine: impl Engine + 'static, options: Options) -> Result<Self> {
        let engine: Arc<dyn Engine> = Arc::new(engine);

        let mut tx = engine.begin(true)?;
        let mut created = false;
        for store in [TABLES_STORE, INDEXES_STORE] {
            if !tx.store_exists(store)? {
                tx.create_store(store)?;
                created = true;
            }
        }
        if created {
            tx.commit()?;
            debug!("catalog created");
        } else {
            tx.rollback()?;
        }

        Ok(Self { engine, options })
    }

    /// Starts a transaction. Writes are only allowed when `writable` is true.
    pub fn begin(&self, writable: bool) -> Result<Tx> {
        let inner = self.engine.begin(writable)?;
        Ok(Tx {
            inner: RefCell::new(inner),
            codec: Arc::clone(&self.options.codec),
        })
    }
}

/// A database transaction.
///
/// Tables and indexes opened through the transaction borrow it. A transaction
/// dropped without `commit` is rolled back.
pub struct Tx {
    inner: RefCell<Box<dyn Transaction>>,
    codec: Arc<dyn Codec>,
}

impl Tx {
    /// Returns true if the transaction may write.
    pub fn is_writable(&self) -> bool {
        self.read(|engine| Ok(engine.is_writable())).unwrap_or(false)
    }

    /// Creates a table. With no info the table has no constraints.
    pub fn create_table(&self, name: &str, info: Option<TableInfo>) -> Result<()> {
        let mut info = info.unwrap_or_default();
        info.table_name = name.to_string();
        info.last_key = 0;
        info.normalize()?;

        self.write(|engine| {
            match catalog::get_table_info(engine, name) {
                Ok(_) => return Err(Error::TableAlreadyExists(name.to_string())),
                Err(Error::TableNotFound(_)) => {}
                Err(e) => return Err(e),
            }
            catalog::put_table_info(engine, &info)?;
            engine.create_store(&catalog::table_store(name))?;
            Ok(())
        })?;
        debug!(table = name, "table created");
        Ok(())
    }

    /// Opens a table.
    pub fn get_table(&self, name: &str) -> Result<Table<'_>> {
        let info = self.read(|engine| catalog::get_table_info(engine, name))?;
        Ok(Table::new(self, info))
    }

    /// Drops a table, its documents and its indexes.
    pub fn drop_table(&self, name: &str) -> Result<()> {
        self.write(|engine| {
            catalog::get_table_info(engine, name)?;
            for config in catalog::list_index_configs(engine, name)? {
                engine.drop_store(&catalog::index_store(&config.index_name))?;
                catalog::delete_index_config(engine, &config.index_name)?;
            }
            engine.drop_store(&catalog::table_store(name))?;
            catalog::delete_table_info(engine, name)
        })?;
        debug!(table = name, "table dropped");
        Ok(())
    }

    /// Returns the names of every table, in name order.
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let infos = self.read(|engine| catalog::list_table_infos(engine))?;
        Ok(infos.into_iter().map(|info| info.table_name).collect())
    }

    /// Creates an index and fills it from the documents already in the table.
    ///
    /// A table has at most one index per path. Indexing a path twice fails
    /// with `IndexAlreadyExists` naming the index that covers it.
    pub fn create_index(&self, config: IndexConfig) -> Result<()> {
        if config.path.is_empty() {
            return Err(Error::InvalidTableInfo("empty index path".into()));
        }
        self.write(|engine| {
            catalog::get_table_info(engine, &config.table_name)?;
            match catalog::get_index_config(engine, &config.index_name) {
                Ok(_) => return Err(Error::IndexAlreadyExists(config.index_name.clone())),
                Err(Error::IndexNotFound(_)) => {}
                Err(e) => return Err(e),
            }
            if let Some(existing) = catalog::list_index_configs(engine, &config.table_name)?
                .into_iter()
                .find(|c| c.path == config.path)
            {
                return Err(Error::IndexAlreadyExists(existing.index_name));
            }
            catalog::put_index_config(engine, &config)?;
            engine.create_store(&catalog::index_store(&config.index_name))?;
            Ok(())
        })?;

        self.get_table(&config.table_name)?
            .reindex(Some(&config.index_name))?;
        debug!(
            index = %config.index_name,
            table = %config.table_name,
            path = %config.path,
            unique = config.unique,
            "index created"
        );
        Ok(())
    }

    /// Opens an index.
    pub fn get_index(&self, name: &str) -> Result<Index<'_>> {
        let config = self.read(|engine| catalog::get_index_config(engine, name))?;
        Ok(Index::new(self, config))
    }

    /// Drops an index and its entries.
    pub fn drop_index(&self, name: &str) -> Result<()> {
        self.write(|engine| {
            catalog::get_index_config(engine, name)?;
            engine.drop_store(&catalog::index_store(name))?;
            catalog::delete_index_config(engine, name)
        })?;
        debug!(index = name, "index dropped");
        Ok(())
    }

    /// Rebuilds every index of every table.
    pub fn reindex_all(&self) -> Result<()> {
        for name in self.list_tables()? {
            self.get_table(&name)?.reindex(None)?;
        }
        Ok(())
    }

    /// Commits the transaction.
    pub fn commit(self) -> Result<()> {
        self.write(|engine| Ok(engine.commit()?))
    }

    /// Rolls the transaction back.
    pub fn rollback(self) -> Result<()> {
        self.write(|engine| Ok(engine.rollback()?))
    }

    pub(crate) fn codec(&self) -> &dyn Codec {
        self.codec.as_ref()
    }

    /// Runs `f` with shared access to the engine transaction.
    pub(crate) fn read<T>(&self, f: impl FnOnce(&dyn Transaction) -> Result<T>) -> Result<T> {
        let guard = self.inner.try_borrow().map_err(|_| Error::TransactionBusy)?;
        f(&**guard)
    }

    /// Runs `f` with exclusive access to the engine transaction.
    pub(crate) fn write<T>(&self, f: impl FnOnce(&mut dyn Transaction) -> Result<T>) -> Result<T> {
        let mut guard = self
            .inner
            .try_borrow_mut()
            .map_err(|_| Error::TransactionBusy)?;
        f(&mut **guard)
    }
}

impl Drop for Tx {
    fn drop(&mut self) {
        let engine = self.inner.get_mut();
        if engine.state() == TransactionState::Active {
            if let Err(e) = engine.rollback() {
                warn!(error = %e, "rollback on drop failed");
            }
        }
    }
}
