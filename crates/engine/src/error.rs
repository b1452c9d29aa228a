//! Error types for storage engines.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = core::result::Result<T, EngineError>;

/// Errors raised by a storage engine.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The key does not exist in the store.
    #[error("key not found")]
    NotFound,
    /// The store does not exist.
    #[error("store not found: {0}")]
    StoreNotFound(String),
    /// A store with this name already exists.
    #[error("store already exists: {0}")]
    StoreAlreadyExists(String),
    /// A write was attempted in a read-only transaction.
    #[error("transaction is read-only")]
    ReadOnly,
    /// The transaction was already committed or rolled back.
    #[error("transaction is closed")]
    TransactionClosed,
    /// Another transaction committed since this one began.
    #[error("transaction conflict")]
    Conflict,
}

impl EngineError {
    /// Creates a store not found error.
    pub fn store_not_found(name: &str) -> Self {
        EngineError::StoreNotFound(name.into())
    }

    /// Returns true if this is a missing key.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound)
    }
}
