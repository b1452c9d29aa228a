//! Strata Encoding - byte formats for the Strata document store.
//!
//! This crate provides:
//!
//! - `key`: an order-preserving encoding of values, used for primary keys and
//!   index entries. For any two values `a` and `b`, `a.cmp(&b)` equals the
//!   byte-wise comparison of their encodings.
//! - `uint`: an order-preserving variable-length encoding of `u64`, used for
//!   generated document keys.
//! - `Codec`: the pluggable document codec, with `BinaryCodec` as default.
//!
//! # Example
//!
//! ```rust
//! use strata_core::Value;
//! use strata_encoding::key;
//!
//! let a = key::encode_value(&Value::Integer(-3));
//! let b = key::encode_value(&Value::Double(2.5));
//! assert!(a < b);
//! assert_eq!(key::decode_value(&b).unwrap(), Value::Double(2.5));
//! ```

#![no_std]

extern crate alloc;

mod codec;
mod error;
pub mod key;
pub mod uint;

pub use codec::{BinaryCodec, Codec};
pub use error::EncodingError;

/// Result type alias for encoding operations.
pub type Result<T> = core::result::Result<T, EncodingError>;
