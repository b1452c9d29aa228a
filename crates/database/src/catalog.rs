//! Table and index metadata.
//!
//! Metadata lives in two engine stores next to the data, so schema changes
//! commit or roll back together with the documents they describe. Entries are
//! JSON documents keyed by table or index name.

use crate::error::{Error, Result};
use core::ops::ControlFlow;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use strata_core::{ValuePath, ValueType};
use strata_engine::Transaction;

/// Store holding one `TableInfo` per table.
pub const TABLES_STORE: &str = "__strata_tables";
/// Store holding one `IndexConfig` per index.
pub const INDEXES_STORE: &str = "__strata_indexes";

const TABLE_STORE_PREFIX: &str = "__strata_table_";
const INDEX_STORE_PREFIX: &str = "__strata_index_";

/// Returns the name of the store holding a table's documents.
pub(crate) fn table_store(table_name: &str) -> String {
    format!("{}{}", TABLE_STORE_PREFIX, table_name)
}

/// Returns the name of the store holding an index's entries.
pub(crate) fn index_store(index_name: &str) -> String {
    format!("{}{}", INDEX_STORE_PREFIX, index_name)
}

/// A schema rule on one path of the documents of a table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConstraint {
    pub path: ValuePath,
    /// Values at the path are converted to this type.
    #[serde(default)]
    pub value_type: Option<ValueType>,
    /// The value at the path is the document key.
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub is_not_null: bool,
}

impl FieldConstraint {
    /// Creates a constraint on `path` with no rule attached.
    pub fn new(path: ValuePath) -> Self {
        Self {
            path,
            value_type: None,
            is_primary_key: false,
            is_not_null: false,
        }
    }

    /// Requires values at the path to have the given type.
    pub fn with_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    /// Makes the path the primary key. A primary key is never null.
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.is_not_null = true;
        self
    }

    /// Forbids missing or null values at the path.
    pub fn not_null(mut self) -> Self {
        self.is_not_null = true;
        self
    }
}

/// Metadata of a table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    /// Set by `Tx::create_table`.
    #[serde(default)]
    pub table_name: String,
    #[serde(default)]
    pub field_constraints: Vec<FieldConstraint>,
    /// Last generated document key. Only used when the table has no primary key.
    #[serde(default)]
    pub last_key: u64,
}

impl TableInfo {
    /// Creates table info with no constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field constraint.
    pub fn with_constraint(mut self, constraint: FieldConstraint) -> Self {
        self.field_constraints.push(constraint);
        self
    }

    /// Returns the primary key constraint, if any.
    pub fn primary_key(&self) -> Option<&FieldConstraint> {
        self.field_constraints.iter().find(|c| c.is_primary_key)
    }

    /// Checks the constraints and makes every primary key not-null.
    pub(crate) fn normalize(&mut self) -> Result<()> {
        let primary_keys = self
            .field_constraints
            .iter()
            .filter(|c| c.is_primary_key)
            .count();
        if primary_keys > 1 {
            return Err(Error::InvalidTableInfo(format!(
                "table {} declares {} primary keys",
                self.table_name, primary_keys
            )));
        }
        for c in self.field_constraints.iter_mut() {
            if c.path.is_empty() {
                return Err(Error::InvalidTableInfo("empty constraint path".into()));
            }
            if c.is_primary_key {
                c.is_not_null = true;
            }
        }
        Ok(())
    }
}

/// Registration of a secondary index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    pub index_name: String,
    pub table_name: String,
    pub path: ValuePath,
    #[serde(default)]
    pub unique: bool,
}

impl IndexConfig {
    /// Creates a non-unique index configuration.
    pub fn new(index_name: impl Into<String>, table_name: impl Into<String>, path: ValuePath) -> Self {
        Self {
            index_name: index_name.into(),
            table_name: table_name.into(),
            path,
            unique: false,
        }
    }

    /// Sets whether the index rejects duplicate values.
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }
}

pub(crate) fn get_table_info(tx: &dyn Transaction, name: &str) -> Result<TableInfo> {
    get_entry(tx, TABLES_STORE, name)?.ok_or_else(|| Error::table_not_found(name))
}

pub(crate) fn put_table_info(tx: &mut dyn Transaction, info: &TableInfo) -> Result<()> {
    put_entry(tx, TABLES_STORE, &info.table_name, info)
}

pub(crate) fn delete_table_info(tx: &mut dyn Transaction, name: &str) -> Result<()> {
    tx.delete(TABLES_STORE, name.as_bytes())?;
    Ok(())
}

pub(crate) fn list_table_infos(tx: &dyn Transaction) -> Result<Vec<TableInfo>> {
    list_entries(tx, TABLES_STORE)
}

pub(crate) fn get_index_config(tx: &dyn Transaction, name: &str) -> Result<IndexConfig> {
    get_entry(tx, INDEXES_STORE, name)?.ok_or_else(|| Error::index_not_found(name))
}

pub(crate) fn put_index_config(tx: &mut dyn Transaction, config: &IndexConfig) -> Result<()> {
    put_entry(tx, INDEXES_STORE, &config.index_name, config)
}

pub(crate) fn delete_index_config(tx: &mut dyn Transaction, name: &str) -> Result<()> {
    tx.delete(INDEXES_STORE, name.as_bytes())?;
    Ok(())
}

/// Returns the indexes of a table, ordered by index name.
pub(crate) fn list_index_configs(tx: &dyn Transaction, table_name: &str) -> Result<Vec<IndexConfig>> {
    let mut configs: Vec<IndexConfig> = list_entries(tx, INDEXES_STORE)?;
    configs.retain(|c| c.table_name == table_name);
    Ok(configs)
}

fn get_entry<T: DeserializeOwned>(tx: &dyn Transaction, store: &str, name: &str) -> Result<Option<T>> {
    match tx.get(store, name.as_bytes()) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn put_entry<T: Serialize>(tx: &mut dyn Transaction, store: &str, name: &str, entry: &T) -> Result<()> {
    let bytes = serde_json::to_vec(entry)?;
    tx.put(store, name.as_bytes(), &bytes)?;
    Ok(())
}

fn list_entries<T: DeserializeOwned>(tx: &dyn Transaction, store: &str) -> Result<Vec<T>> {
    let mut raw = Vec::new();
    tx.ascend_greater_or_equal(store, &[], &mut |_, v| {
        raw.push(v.to_vec());
        ControlFlow::Continue(())
    })?;
    raw.iter()
        .map(|bytes| serde_json::from_slice(bytes).map_err(Error::from))
        .collect()
}
