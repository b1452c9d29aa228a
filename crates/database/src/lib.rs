//! Strata Database - document tables over an ordered key-value engine.
//!
//! This crate maps documents onto the stores of a `strata_engine::Engine`:
//!
//! - `Database`: opens the catalog on an engine and starts transactions
//! - `Tx`: a transaction; creates, opens and drops tables and indexes
//! - `Table`: insert, get, delete, replace, truncate and iterate documents
//! - `Index`: ordered secondary index on one path, unique or not
//! - `TableInfo`, `FieldConstraint`, `IndexConfig`: persisted schema
//!
//! Every document is checked against its table's field constraints before it
//! is stored, and every index of a table is updated in the same transaction as
//! the document.
//!
//! # Example
//!
//! ```rust
//! use strata_core::{Document, Value, ValuePath, ValueType};
//! use strata_database::{Database, FieldConstraint, IndexConfig, Options, TableInfo};
//! use strata_engine::MemoryEngine;
//!
//! let db = Database::new(MemoryEngine::new(), Options::default()).unwrap();
//! let tx = db.begin(true).unwrap();
//!
//! let info = TableInfo::new().with_constraint(
//!     FieldConstraint::new(ValuePath::parse("age").unwrap()).with_type(ValueType::Integer),
//! );
//! tx.create_table("users", Some(info)).unwrap();
//! tx.create_index(IndexConfig::new("users_age", "users", ValuePath::parse("age").unwrap()))
//!     .unwrap();
//!
//! let users = tx.get_table("users").unwrap();
//! let key = users
//!     .insert(&Document::new().add("name", "alice").add("age", 30.0))
//!     .unwrap();
//!
//! let doc = users.get_document(&key).unwrap();
//! assert_eq!(doc.get("age"), Some(&Value::Integer(30)));
//!
//! let idx = tx.get_index("users_age").unwrap();
//! assert_eq!(idx.len().unwrap(), 1);
//!
//! drop(users);
//! drop(idx);
//! tx.commit().unwrap();
//! ```

mod catalog;
mod constraint;
mod database;
mod error;
mod index;
mod keygen;
mod table;

pub use catalog::{FieldConstraint, IndexConfig, TableInfo, INDEXES_STORE, TABLES_STORE};
pub use constraint::validate_and_convert;
pub use database::{Database, Options, Tx};
pub use error::{Error, Result};
pub use index::{Index, IndexEntry, IndexIter};
pub use table::{Documents, Table};
