//! Strata Core - value model for the Strata document store.
//!
//! This crate provides the foundational types shared by every other Strata crate:
//!
//! - `Value`: the closed set of values a document field can hold
//! - `ValueType`: the tag of a `Value`, used by field constraints
//! - `Document`: an ordered collection of named values, optionally carrying its storage key
//! - `ValuePath`: navigation into nested documents and arrays (`foo.a[1]`)
//! - `Error`: path resolution and conversion errors
//!
//! # Example
//!
//! ```rust
//! use strata_core::{Document, Value, ValuePath};
//!
//! let doc = Document::from_json(r#"{"foo": {"a": [0, 10]}}"#).unwrap();
//! let path = ValuePath::parse("foo.a[1]").unwrap();
//!
//! assert_eq!(path.get_value(&doc).unwrap(), &Value::Integer(10));
//! assert_eq!(path.to_string(), "foo.a[1]");
//! ```

#![no_std]

extern crate alloc;

mod document;
mod error;
mod json;
pub mod path;
mod types;
mod value;

pub use document::Document;
pub use error::{Error, Result};
pub use path::{PathFragment, ValuePath};
pub use types::ValueType;
pub use value::{integer_image, Value};
