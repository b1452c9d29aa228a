//! Error types for the Strata value model.

use crate::types::ValueType;
use alloc::string::String;
use thiserror::Error;

/// Result type alias for value model operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors raised while navigating or converting values.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// A field or array element named by a path does not exist.
    #[error("field not found: {path}")]
    FieldNotFound { path: String },
    /// A path segment expected a container of one kind and found another value.
    #[error("type mismatch at {path}: expected {expected}, got {got}")]
    TypeMismatch {
        path: String,
        expected: ValueType,
        got: ValueType,
    },
    /// A value cannot be converted to the requested type without loss.
    #[error("cannot convert {from} to {to}")]
    IncompatibleType { from: ValueType, to: ValueType },
    /// A path expression could not be parsed.
    #[error("invalid path {input:?} at position {position}: {message}")]
    InvalidPath {
        input: String,
        position: usize,
        message: String,
    },
    /// A JSON document could not be parsed.
    #[error("invalid json: {message}")]
    InvalidJson { message: String },
}

impl Error {
    /// Creates a field not found error.
    pub fn field_not_found(path: impl Into<String>) -> Self {
        Error::FieldNotFound { path: path.into() }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(path: impl Into<String>, expected: ValueType, got: ValueType) -> Self {
        Error::TypeMismatch {
            path: path.into(),
            expected,
            got,
        }
    }

    /// Creates an incompatible type error.
    pub fn incompatible_type(from: ValueType, to: ValueType) -> Self {
        Error::IncompatibleType { from, to }
    }

    /// Returns true if this error means "nothing at this path".
    ///
    /// Both a missing field and a path that runs into a value of the wrong
    /// shape leave the path without a value.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::FieldNotFound { .. } | Error::TypeMismatch { .. })
    }
}
