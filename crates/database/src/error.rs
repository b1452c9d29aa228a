//! Error types for Strata tables and indexes.

use strata_core::ValueType;
use strata_encoding::EncodingError;
use strata_engine::EngineError;
use thiserror::Error;

/// Result type alias for database operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors raised by tables, indexes and the catalog.
#[derive(Debug, Error)]
pub enum Error {
    /// No document is stored under the key.
    #[error("document not found")]
    DocumentNotFound,

    /// A document is already stored under the generated key.
    #[error("duplicate document")]
    DuplicateDocument,

    /// A unique index already holds the value for another document.
    #[error("duplicate value in unique index {index}")]
    DuplicateValue { index: String },

    /// A not-null field is missing or null.
    #[error("field {path} must not be null")]
    NotNullConstraintViolation { path: String },

    /// A field cannot be converted to its declared type.
    #[error("cannot convert field {path} from {from} to {to}")]
    IncompatibleType {
        path: String,
        from: ValueType,
        to: ValueType,
    },

    /// The primary key field is missing, null or empty.
    #[error("primary key {path} not found")]
    PrimaryKeyNotFound { path: String },

    /// The index holds no such entry.
    #[error("entry not found in index {index}")]
    IndexEntryNotFound { index: String },

    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("table already exists: {0}")]
    TableAlreadyExists(String),

    #[error("index not found: {0}")]
    IndexNotFound(String),

    #[error("index already exists: {0}")]
    IndexAlreadyExists(String),

    #[error("invalid table info: {0}")]
    InvalidTableInfo(String),

    /// The transaction is borrowed by an operation that has not finished.
    #[error("transaction is busy")]
    TransactionBusy,

    #[error(transparent)]
    Value(#[from] strata_core::Error),

    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("catalog error: {0}")]
    Catalog(#[from] serde_json::Error),
}

impl Error {
    /// Creates a table not found error.
    pub fn table_not_found(name: &str) -> Self {
        Error::TableNotFound(name.into())
    }

    /// Creates an index not found error.
    pub fn index_not_found(name: &str) -> Self {
        Error::IndexNotFound(name.into())
    }

    /// Returns true if the engine reported a missing key.
    pub(crate) fn is_engine_not_found(&self) -> bool {
        matches!(self, Error::Engine(e) if e.is_not_found())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::DuplicateValue {
            index: "idx_a".into(),
        };
        assert_eq!(err.to_string(), "duplicate value in unique index idx_a");

        let err = Error::IncompatibleType {
            path: "foo".into(),
            from: ValueType::Text,
            to: ValueType::Integer,
        };
        assert_eq!(err.to_string(), "cannot convert field foo from text to integer");
    }

    #[test]
    fn test_from_engine_error() {
        let err: Error = EngineError::NotFound.into();
        assert!(err.is_engine_not_found());
        let err: Error = EngineError::Conflict.into();
        assert!(!err.is_engine_not_found());
    }
}
