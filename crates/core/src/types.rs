//! Value type definitions for Strata.
//!
//! A `ValueType` is the tag of a `Value`. Field constraints use it to declare
//! the type a field must be converted to before a document is stored.

use core::fmt;
use serde::{Deserialize, Serialize};

/// The type of a value.
///
/// Variants are declared in ascending sort rank: when two values of different
/// types are compared, the one whose type comes first is smaller. `Integer` and
/// `Double` share a rank and compare by numeric value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Absence of a value
    Null,
    /// Boolean (true/false)
    Bool,
    /// 64-bit signed integer
    Integer,
    /// 64-bit floating point number
    Double,
    /// UTF-8 string
    Text,
    /// Arbitrary bytes
    Blob,
    /// Ordered sequence of values
    Array,
    /// Nested document
    Document,
}

impl ValueType {
    /// Returns true for `Integer` and `Double`.
    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, ValueType::Integer | ValueType::Double)
    }

    /// Returns the rank used to order values of different types.
    pub(crate) fn rank(&self) -> u8 {
        match self {
            ValueType::Null => 0,
            ValueType::Bool => 1,
            ValueType::Integer | ValueType::Double => 2,
            ValueType::Text => 3,
            ValueType::Blob => 4,
            ValueType::Array => 5,
            ValueType::Document => 6,
        }
    }

    /// Returns the lowercase name of this type.
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Null => "null",
            ValueType::Bool => "bool",
            ValueType::Integer => "integer",
            ValueType::Double => "double",
            ValueType::Text => "text",
            ValueType::Blob => "blob",
            ValueType::Array => "array",
            ValueType::Document => "document",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_numbers_share_rank() {
        assert_eq!(ValueType::Integer.rank(), ValueType::Double.rank());
        assert!(ValueType::Integer.is_number());
        assert!(!ValueType::Text.is_number());
    }

    #[test]
    fn test_rank_follows_declaration_order() {
        assert!(ValueType::Null.rank() < ValueType::Bool.rank());
        assert!(ValueType::Double.rank() < ValueType::Text.rank());
        assert!(ValueType::Blob.rank() < ValueType::Array.rank());
        assert!(ValueType::Array.rank() < ValueType::Document.rank());
    }

    #[test]
    fn test_display() {
        assert_eq!(ValueType::Integer.to_string(), "integer");
        assert_eq!(ValueType::Document.to_string(), "document");
    }
}
