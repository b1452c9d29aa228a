//! Strata Engine - the key-value layer under the Strata document store.
//!
//! This crate provides:
//!
//! - `Engine` and `Transaction`: the contract a storage engine fulfils. An
//!   engine holds named stores of ordered byte keys and byte values, and every
//!   access goes through a transaction.
//! - `MemoryEngine`: an in-memory engine with snapshot isolation.
//!
//! # Example
//!
//! ```rust
//! use strata_engine::{Engine, MemoryEngine};
//!
//! let engine = MemoryEngine::new();
//!
//! let mut tx = engine.begin(true).unwrap();
//! tx.create_store("users").unwrap();
//! tx.put("users", b"alice", b"1").unwrap();
//! tx.commit().unwrap();
//!
//! let mut tx = engine.begin(false).unwrap();
//! assert_eq!(tx.get("users", b"alice").unwrap(), b"1".to_vec());
//! tx.rollback().unwrap();
//! ```

mod error;
mod memory;
mod transaction;

pub use error::{EngineError, Result};
pub use memory::MemoryEngine;
pub use transaction::{Engine, Transaction, TransactionState, Visitor};
