//! Value paths.
//!
//! A `ValuePath` selects a value nested inside a document. The textual form is
//! a field name followed by any number of `.field` or `[index]` selectors:
//!
//! - `foo` - top-level field
//! - `foo.bar` - field of a nested document
//! - `foo[1]` - second element of an array
//! - `foo.a[1].b` - any combination
//!
//! Field names made of characters other than letters, digits and `_` can be
//! quoted with backticks: `` `first name`.initial ``.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::types::ValueType;
use crate::value::Value;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// One step of a path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathFragment {
    /// Selects a field of a document.
    Field(String),
    /// Selects an element of an array.
    Index(usize),
}

/// A parsed path into a document.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ValuePath(Vec<PathFragment>);

impl ValuePath {
    /// Creates a path from fragments.
    pub fn new(fragments: Vec<PathFragment>) -> Self {
        Self(fragments)
    }

    /// Creates a path selecting a single top-level field.
    pub fn field(name: impl Into<String>) -> Self {
        Self(alloc::vec![PathFragment::Field(name.into())])
    }

    /// Parses a path from its textual form.
    pub fn parse(input: &str) -> Result<Self> {
        Parser::new(input).parse()
    }

    /// Returns the fragments of this path.
    #[inline]
    pub fn fragments(&self) -> &[PathFragment] {
        &self.0
    }

    /// Returns true if the path has no fragments.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolves the path against a document.
    ///
    /// Fails with `FieldNotFound` when a field or element is absent and with
    /// `TypeMismatch` when a fragment meets a value of the wrong shape, e.g. an
    /// index applied to a scalar.
    pub fn get_value<'a>(&self, doc: &'a Document) -> Result<&'a Value> {
        let (first, rest) = match self.0.split_first() {
            Some(parts) => parts,
            None => return Err(Error::field_not_found("")),
        };

        let mut current = match first {
            PathFragment::Field(name) => doc
                .get(name)
                .ok_or_else(|| Error::field_not_found(self.to_string()))?,
            PathFragment::Index(_) => {
                return Err(Error::type_mismatch(
                    self.to_string(),
                    ValueType::Array,
                    ValueType::Document,
                ))
            }
        };

        for fragment in rest {
            current = self.step(current, fragment)?;
        }
        Ok(current)
    }

    fn step<'a>(&self, value: &'a Value, fragment: &PathFragment) -> Result<&'a Value> {
        match (fragment, value) {
            (PathFragment::Field(name), Value::Document(doc)) => doc
                .get(name)
                .ok_or_else(|| Error::field_not_found(self.to_string())),
            (PathFragment::Index(i), Value::Array(items)) => items
                .get(*i)
                .ok_or_else(|| Error::field_not_found(self.to_string())),
            (PathFragment::Field(_), other) => Err(Error::type_mismatch(
                self.to_string(),
                ValueType::Document,
                other.value_type(),
            )),
            (PathFragment::Index(_), other) => Err(Error::type_mismatch(
                self.to_string(),
                ValueType::Array,
                other.value_type(),
            )),
        }
    }

    /// Replaces the value at this path.
    ///
    /// Every fragment but the last must resolve. A missing last field is
    /// added to its document; a missing last array element is an error.
    pub fn set_value(&self, doc: &mut Document, value: Value) -> Result<()> {
        let display = self.to_string();
        let (last, parents) = match self.0.split_last() {
            Some(parts) => parts,
            None => return Err(Error::field_not_found("")),
        };

        if parents.is_empty() {
            return match last {
                PathFragment::Field(name) => {
                    doc.set(name.clone(), value);
                    Ok(())
                }
                PathFragment::Index(_) => Err(Error::type_mismatch(
                    display,
                    ValueType::Array,
                    ValueType::Document,
                )),
            };
        }

        let mut current = match &parents[0] {
            PathFragment::Field(name) => doc
                .get_mut(name)
                .ok_or_else(|| Error::field_not_found(display.clone()))?,
            PathFragment::Index(_) => {
                return Err(Error::type_mismatch(
                    display,
                    ValueType::Array,
                    ValueType::Document,
                ))
            }
        };
        for fragment in &parents[1..] {
            current = step_mut(current, fragment, &display)?;
        }

        match (last, current) {
            (PathFragment::Field(name), Value::Document(inner)) => {
                inner.set(name.clone(), value);
                Ok(())
            }
            (PathFragment::Index(i), Value::Array(items)) => match items.get_mut(*i) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(Error::field_not_found(display)),
            },
            (PathFragment::Field(_), other) => Err(Error::type_mismatch(
                display,
                ValueType::Document,
                other.value_type(),
            )),
            (PathFragment::Index(_), other) => Err(Error::type_mismatch(
                display,
                ValueType::Array,
                other.value_type(),
            )),
        }
    }
}

fn step_mut<'a>(value: &'a mut Value, fragment: &PathFragment, display: &str) -> Result<&'a mut Value> {
    match (fragment, value) {
        (PathFragment::Field(name), Value::Document(doc)) => doc
            .get_mut(name)
            .ok_or_else(|| Error::field_not_found(display)),
        (PathFragment::Index(i), Value::Array(items)) => items
            .get_mut(*i)
            .ok_or_else(|| Error::field_not_found(display)),
        (PathFragment::Field(_), other) => Err(Error::type_mismatch(
            display,
            ValueType::Document,
            other.value_type(),
        )),
        (PathFragment::Index(_), other) => Err(Error::type_mismatch(
            display,
            ValueType::Array,
            other.value_type(),
        )),
    }
}

fn is_plain_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

impl fmt::Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, fragment) in self.0.iter().enumerate() {
            match fragment {
                PathFragment::Field(name) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    if is_plain_identifier(name) {
                        f.write_str(name)?;
                    } else {
                        write!(f, "`{}`", name.replace('`', "``"))?;
                    }
                }
                PathFragment::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

impl FromStr for ValuePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ValuePath::parse(s)
    }
}

impl TryFrom<String> for ValuePath {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        ValuePath::parse(&s)
    }
}

impl From<ValuePath> for String {
    fn from(path: ValuePath) -> Self {
        path.to_string()
    }
}

/// Parser state.
struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::InvalidPath {
            input: self.input.to_string(),
            position: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn parse(mut self) -> Result<ValuePath> {
        let mut fragments = Vec::new();
        fragments.push(PathFragment::Field(self.parse_field_name()?));

        while let Some(c) = self.peek() {
            match c {
                '.' => {
                    self.advance();
                    fragments.push(PathFragment::Field(self.parse_field_name()?));
                }
                '[' => {
                    self.advance();
                    fragments.push(PathFragment::Index(self.parse_index()?));
                }
                other => return Err(self.error(format!("unexpected character '{}'", other))),
            }
        }

        Ok(ValuePath(fragments))
    }

    fn parse_field_name(&mut self) -> Result<String> {
        if self.peek() == Some('`') {
            return self.parse_quoted();
        }
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(self.error("expected field name"));
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn parse_quoted(&mut self) -> Result<String> {
        self.advance();
        let mut name = String::new();
        loop {
            match self.peek() {
                Some('`') => {
                    self.advance();
                    // A doubled backtick is an escaped backtick.
                    if self.peek() == Some('`') {
                        name.push('`');
                        self.advance();
                    } else {
                        return Ok(name);
                    }
                }
                Some(c) => {
                    name.push(c);
                    self.advance();
                }
                None => return Err(self.error("unterminated quoted field name")),
            }
        }
    }

    fn parse_index(&mut self) -> Result<usize> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(self.error("expected array index"));
        }
        let index = self.input[start..self.pos]
            .parse()
            .map_err(|_| self.error("array index out of range"))?;
        if self.peek() != Some(']') {
            return Err(self.error("expected ']'"));
        }
        self.advance();
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn nested() -> Document {
        Document::new()
            .add(
                "foo",
                Document::new().add("a", vec![Value::Integer(0), Value::Integer(10)]),
            )
            .add("bar", 1i64)
    }

    #[test]
    fn test_parse() {
        let path = ValuePath::parse("foo.a[1]").unwrap();
        assert_eq!(
            path.fragments(),
            &[
                PathFragment::Field("foo".into()),
                PathFragment::Field("a".into()),
                PathFragment::Index(1),
            ]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(ValuePath::parse("").is_err());
        assert!(ValuePath::parse("[0]").is_err());
        assert!(ValuePath::parse("foo.").is_err());
        assert!(ValuePath::parse("foo[").is_err());
        assert!(ValuePath::parse("foo[a]").is_err());
        assert!(ValuePath::parse("foo[1").is_err());
        assert!(ValuePath::parse("foo bar").is_err());
        assert!(ValuePath::parse("`foo").is_err());
    }

    #[test]
    fn test_display_roundtrips() {
        for input in ["foo", "foo.a[1]", "a[0][2].b", "`first name`.x"] {
            assert_eq!(ValuePath::parse(input).unwrap().to_string(), input);
        }
    }

    #[test]
    fn test_get_value() {
        let doc = nested();
        let v = ValuePath::parse("foo.a[1]").unwrap().get_value(&doc).unwrap();
        assert_eq!(v, &Value::Integer(10));
        let v = ValuePath::field("bar").get_value(&doc).unwrap();
        assert_eq!(v, &Value::Integer(1));
    }

    #[test]
    fn test_get_value_not_found() {
        let doc = nested();
        let err = ValuePath::parse("foo.a[2]").unwrap().get_value(&doc).unwrap_err();
        assert_eq!(err, Error::field_not_found("foo.a[2]"));
        let err = ValuePath::parse("foo.b").unwrap().get_value(&doc).unwrap_err();
        assert!(matches!(err, Error::FieldNotFound { .. }));
    }

    #[test]
    fn test_get_value_type_mismatch() {
        let doc = nested();
        let err = ValuePath::parse("bar[0]").unwrap().get_value(&doc).unwrap_err();
        assert_eq!(
            err,
            Error::type_mismatch("bar[0]", ValueType::Array, ValueType::Integer)
        );
        let err = ValuePath::parse("foo.a.b").unwrap().get_value(&doc).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { expected: ValueType::Document, .. }));
    }

    #[test]
    fn test_set_value() {
        let mut doc = nested();
        let path = ValuePath::parse("foo.a[0]").unwrap();
        path.set_value(&mut doc, Value::Double(0.5)).unwrap();
        assert_eq!(path.get_value(&doc).unwrap(), &Value::Double(0.5));

        ValuePath::parse("foo.c").unwrap().set_value(&mut doc, Value::Bool(true)).unwrap();
        assert_eq!(
            ValuePath::parse("foo.c").unwrap().get_value(&doc).unwrap(),
            &Value::Bool(true)
        );

        let err = ValuePath::parse("foo.a[5]")
            .unwrap()
            .set_value(&mut doc, Value::Null)
            .unwrap_err();
        assert!(matches!(err, Error::FieldNotFound { .. }));
    }
}
