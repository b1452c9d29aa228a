//! Value type definitions for Strata.
//!
//! This module defines the `Value` enum which represents anything a document
//! field can hold, together with its total ordering and lossless conversions.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::types::ValueType;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cmp::Ordering;

/// A value stored in a document field or array element.
#[derive(Clone, Debug)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point
    Double(f64),
    /// UTF-8 string
    Text(String),
    /// Binary data
    Blob(Vec<u8>),
    /// Ordered list of values
    Array(Vec<Value>),
    /// Nested document
    Document(Document),
}

impl Value {
    /// Returns the type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::Integer(_) => ValueType::Integer,
            Value::Double(_) => ValueType::Double,
            Value::Text(_) => ValueType::Text,
            Value::Blob(_) => ValueType::Blob,
            Value::Array(_) => ValueType::Array,
            Value::Document(_) => ValueType::Document,
        }
    }

    /// Returns true if this value is Null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the boolean if this is a Bool, None otherwise.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the integer if this is an Integer, None otherwise.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the float if this is a Double, None otherwise.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns a reference to the string if this is Text, None otherwise.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Returns a reference to the bytes if this is a Blob, None otherwise.
    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Returns the elements if this is an Array, None otherwise.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Returns the nested document if this is a Document, None otherwise.
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(v) => Some(v),
            _ => None,
        }
    }

    /// Converts this value to the given type.
    ///
    /// Only lossless conversions succeed: any value converts to its own type,
    /// an Integer converts to a Double when the Double holds it exactly, a Double with no fractional part that
    /// fits in an i64 converts to an Integer, and Text converts to a Blob of its
    /// UTF-8 bytes. Null is returned unchanged whatever the target type.
    pub fn convert_to(&self, target: ValueType) -> Result<Value> {
        if self.is_null() || self.value_type() == target {
            return Ok(self.clone());
        }

        let converted = match (self, target) {
            (Value::Integer(i), ValueType::Double) => {
                let f = *i as f64;
                (double_to_integer(f) == Some(*i)).then_some(Value::Double(f))
            }
            (Value::Double(f), ValueType::Integer) => double_to_integer(*f).map(Value::Integer),
            (Value::Text(s), ValueType::Blob) => Some(Value::Blob(s.as_bytes().to_vec())),
            _ => None,
        };

        converted.ok_or_else(|| Error::incompatible_type(self.value_type(), target))
    }

    /// Returns the same number held by the other numeric type, if that type
    /// can hold it exactly.
    ///
    /// `Integer(3)` and `Double(3.0)` are twins. They are distinct values but
    /// indexes treat them as one number.
    pub fn numeric_twin(&self) -> Option<Value> {
        match self {
            Value::Integer(i) => {
                let f = integer_image(*i);
                (double_to_integer(f) == Some(*i)).then_some(Value::Double(f))
            }
            Value::Double(f) => double_to_integer(*f).map(Value::Integer),
            _ => None,
        }
    }

    /// Returns the float image used to order numbers.
    ///
    /// Negative zero is folded into zero and every NaN into the canonical NaN,
    /// which sorts above positive infinity.
    fn numeric_image(&self) -> f64 {
        let f = match self {
            Value::Integer(i) => integer_image(*i),
            Value::Double(f) => *f,
            _ => return 0.0,
        };
        canonical_f64(f)
    }

    /// Returns a type ordering value for comparing different types.
    fn type_order(&self) -> u8 {
        self.value_type().rank()
    }
}

/// Returns the largest `f64` that is not greater than `i`.
///
/// Integers beyond 2^53 are not all representable. Rounding down keeps an
/// integer at or above every double whose image it shares, so ties can be
/// broken by type alone.
pub fn integer_image(i: i64) -> f64 {
    let f = i as f64;
    if f as i128 > i as i128 {
        // `f` rounded up, step to the next double towards negative infinity.
        let bits = f.to_bits();
        if f > 0.0 {
            f64::from_bits(bits - 1)
        } else {
            f64::from_bits(bits + 1)
        }
    } else {
        f
    }
}

/// Normalizes -0.0 to 0.0 and every NaN to the positive quiet NaN.
pub(crate) fn canonical_f64(f: f64) -> f64 {
    if f.is_nan() {
        f64::NAN
    } else if f == 0.0 {
        0.0
    } else {
        f
    }
}

fn double_to_integer(f: f64) -> Option<i64> {
    // 2^63 is exactly representable; anything at or above it overflows i64.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.is_finite() && f.fract() == 0.0 && f >= -LIMIT && f < LIMIT {
        Some(f as i64)
    } else {
        None
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => {
                // Handle NaN comparison
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Blob(a), Value::Blob(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Document(a), Value::Document(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => self
                .numeric_image()
                .total_cmp(&other.numeric_image())
                .then_with(|| a.cmp(b)),
            // Cross-type numeric comparisons: by image first. A Double equal
            // to an Integer's image is never above the Integer, so it sorts
            // first.
            (Value::Integer(_), Value::Double(_)) => self
                .numeric_image()
                .total_cmp(&other.numeric_image())
                .then(Ordering::Greater),
            (Value::Double(_), Value::Integer(_)) => self
                .numeric_image()
                .total_cmp(&other.numeric_image())
                .then(Ordering::Less),
            (Value::Double(_), Value::Double(_)) => {
                self.numeric_image().total_cmp(&other.numeric_image())
            }
            (Value::Text(a), Value::Text(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Value::Blob(a), Value::Blob(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => a.cmp(b),
            (Value::Document(a), Value::Document(b)) => a.cmp_fields(b),
            // Different types: order by type rank
            _ => self.type_order().cmp(&other.type_order()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<Document> for Value {
    fn from(v: Document) -> Self {
        Value::Document(v)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_value_type_check() {
        assert_eq!(Value::Integer(42).value_type(), ValueType::Integer);
        assert_eq!(Value::Null.value_type(), ValueType::Null);
        assert!(Value::Null.is_null());
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Integer(100).as_integer(), Some(100));
        assert_eq!(Value::Double(2.5).as_double(), Some(2.5));
        assert_eq!(Value::Text("hello".into()).as_text(), Some("hello"));
        assert_eq!(Value::Blob(vec![1, 2, 3]).as_blob(), Some(&[1, 2, 3][..]));
        assert_eq!(Value::Integer(1).as_text(), None);
    }

    #[test]
    fn test_value_equality_is_strict() {
        assert_eq!(Value::Integer(42), Value::Integer(42));
        assert_ne!(Value::Integer(1), Value::Double(1.0));
        assert_eq!(Value::Double(f64::NAN), Value::Double(f64::NAN));
        assert_eq!(Value::Double(-0.0), Value::Double(0.0));
    }

    #[test]
    fn test_ordering_across_types() {
        let ordered = vec![
            Value::Null,
            Value::Bool(false),
            Value::Bool(true),
            Value::Integer(-5),
            Value::Double(0.5),
            Value::Integer(1),
            Value::Text("a".into()),
            Value::Blob(vec![0]),
            Value::Array(vec![]),
            Value::Document(Document::new()),
        ];
        for pair in ordered.windows(2) {
            assert!(pair[0] < pair[1], "{:?} < {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_numeric_cross_comparison() {
        assert!(Value::Integer(2) > Value::Double(1.5));
        assert!(Value::Double(2.5) > Value::Integer(2));
        // Same numeric value: Double first, never Equal since the tags differ.
        assert!(Value::Double(3.0) < Value::Integer(3));
        assert!(Value::Double(f64::NAN) > Value::Double(f64::INFINITY));
        assert_eq!(Value::Double(-0.0).cmp(&Value::Double(0.0)), Ordering::Equal);
    }

    #[test]
    fn test_large_integers_compare_exactly() {
        let a = Value::Integer(i64::MAX - 1);
        let b = Value::Integer(i64::MAX);
        assert!(a < b);
    }

    #[test]
    fn test_integers_beyond_double_precision() {
        const P53: i64 = 1 << 53;
        assert!(Value::Integer(P53 + 3) < Value::Double((P53 + 4) as f64));
        assert!(Value::Integer(P53 + 3) > Value::Double((P53 + 2) as f64));
        assert!(Value::Integer(P53 + 1) > Value::Double(P53 as f64));
        assert!(Value::Integer(-(P53 + 3)) > Value::Double(-(P53 + 4) as f64));
        assert!(Value::Integer(-(P53 + 3)) < Value::Double(-(P53 + 2) as f64));
        assert!(Value::Integer(i64::MAX) < Value::Double(9_223_372_036_854_775_808.0));
        assert!(Value::Integer(i64::MIN) > Value::Double(-9_223_372_036_854_775_808.0));
    }

    #[test]
    fn test_integer_image_rounds_down() {
        const P53: i64 = 1 << 53;
        assert_eq!(integer_image(7), 7.0);
        assert_eq!(integer_image(P53 + 3), (P53 + 2) as f64);
        assert_eq!(integer_image(-(P53 + 3)), -(P53 + 4) as f64);
        assert_eq!(integer_image(i64::MAX), 9_223_372_036_854_774_784.0);
        assert_eq!(integer_image(i64::MIN), -9_223_372_036_854_775_808.0);
    }

    #[test]
    fn test_numeric_twin() {
        assert_eq!(Value::Integer(3).numeric_twin(), Some(Value::Double(3.0)));
        assert_eq!(Value::Double(3.0).numeric_twin(), Some(Value::Integer(3)));
        assert_eq!(Value::Double(-0.0).numeric_twin(), Some(Value::Integer(0)));
        assert_eq!(Value::Double(3.5).numeric_twin(), None);
        assert_eq!(Value::Integer((1 << 53) + 1).numeric_twin(), None);
        assert_eq!(Value::Text("3".into()).numeric_twin(), None);
    }

    #[test]
    fn test_array_ordering_is_lexicographic() {
        let short = Value::Array(vec![Value::Integer(1)]);
        let long = Value::Array(vec![Value::Integer(1), Value::Null]);
        let bigger = Value::Array(vec![Value::Integer(2)]);
        assert!(short < long);
        assert!(long < bigger);
    }

    #[test]
    fn test_convert_to() {
        assert_eq!(
            Value::Integer(10).convert_to(ValueType::Double).unwrap(),
            Value::Double(10.0)
        );
        assert_eq!(
            Value::Double(10.0).convert_to(ValueType::Integer).unwrap(),
            Value::Integer(10)
        );
        assert_eq!(
            Value::Null.convert_to(ValueType::Integer).unwrap(),
            Value::Null
        );
        assert_eq!(
            Value::Text("ab".into()).convert_to(ValueType::Blob).unwrap(),
            Value::Blob(vec![b'a', b'b'])
        );
    }

    #[test]
    fn test_convert_to_rejects_lossy() {
        assert_eq!(
            Value::Double(1.5).convert_to(ValueType::Integer),
            Err(Error::incompatible_type(ValueType::Double, ValueType::Integer))
        );
        assert!(Value::Double(1e300).convert_to(ValueType::Integer).is_err());
        assert!(Value::Integer((1 << 53) + 1).convert_to(ValueType::Double).is_err());
        assert!(Value::Integer(i64::MAX).convert_to(ValueType::Double).is_err());
        assert!(Value::Text("1".into()).convert_to(ValueType::Integer).is_err());
        assert!(Value::Blob(vec![]).convert_to(ValueType::Integer).is_err());
        assert!(Value::Array(vec![]).convert_to(ValueType::Document).is_err());
    }

    #[test]
    fn test_value_from_impls() {
        let v: Value = 42i32.into();
        assert_eq!(v.as_integer(), Some(42));

        let v: Value = "hello".into();
        assert_eq!(v.as_text(), Some("hello"));

        let v: Value = None::<i64>.into();
        assert!(v.is_null());
    }
}
