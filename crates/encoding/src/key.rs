//! Order-preserving value encoding.
//!
//! Encoded values compare byte-wise in the same order as `Value::cmp`, and no
//! encoding is a proper prefix of another. Index keys rely on both properties:
//! a value encoding can be followed by a document key and the composite still
//! sorts by value first.
//!
//! ## Layout
//!
//! Every value starts with a type tag. Tags increase with type rank:
//!
//! - `0x05` null
//! - `0x10` bool, followed by `0x00` or `0x01`
//! - `0x20` number, followed by the 8-byte sort image of its `f64` value and a
//!   marker: `0x00` for a double, or `0x01` and 8 bytes of the exact integer for
//!   an integer. An integer's image is the largest `f64` not above it, so
//!   integers that share an image still order exactly and a double with the
//!   same image never sorts after them. `Integer(3)` and `Double(3.0)` share
//!   the bytes up to the marker.
//! - `0x30` text, `0x40` blob: escaped bytes (`0x00` becomes `00 FF`), closed
//!   by `00 01`
//! - `0x50` array: the encoded elements, closed by `0x00`
//! - `0x60` document: for each field `0x01`, the escaped name and the encoded
//!   value, closed by `0x00`

use crate::error::EncodingError;
use crate::Result;
use alloc::string::String;
use alloc::vec::Vec;
use strata_core::{integer_image, Document, Value};

const TAG_NULL: u8 = 0x05;
const TAG_BOOL: u8 = 0x10;
const TAG_NUMBER: u8 = 0x20;
const TAG_TEXT: u8 = 0x30;
const TAG_BLOB: u8 = 0x40;
const TAG_ARRAY: u8 = 0x50;
const TAG_DOCUMENT: u8 = 0x60;

const END: u8 = 0x00;
const FIELD: u8 = 0x01;

const NUMBER_DOUBLE: u8 = 0x00;
const NUMBER_INTEGER: u8 = 0x01;

const ESCAPE: u8 = 0x00;
const ESCAPED_ZERO: u8 = 0xFF;
const TERMINATOR: u8 = 0x01;

const SIGN: u64 = 1 << 63;

/// Encodes a value into a new buffer.
pub fn encode_value(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    append_value(&mut out, value);
    out
}

/// Appends the encoding of a value to `out`.
pub fn append_value(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Null => out.push(TAG_NULL),
        Value::Bool(b) => {
            out.push(TAG_BOOL);
            out.push(*b as u8);
        }
        Value::Integer(i) => {
            out.push(TAG_NUMBER);
            out.extend_from_slice(&sort_image(integer_image(*i)));
            out.push(NUMBER_INTEGER);
            out.extend_from_slice(&((*i as u64) ^ SIGN).to_be_bytes());
        }
        Value::Double(f) => {
            out.push(TAG_NUMBER);
            out.extend_from_slice(&sort_image(*f));
            out.push(NUMBER_DOUBLE);
        }
        Value::Text(s) => {
            out.push(TAG_TEXT);
            append_escaped(out, s.as_bytes());
        }
        Value::Blob(b) => {
            out.push(TAG_BLOB);
            append_escaped(out, b);
        }
        Value::Array(items) => {
            out.push(TAG_ARRAY);
            for item in items {
                append_value(out, item);
            }
            out.push(END);
        }
        Value::Document(doc) => {
            out.push(TAG_DOCUMENT);
            for (name, v) in doc.iter() {
                out.push(FIELD);
                append_escaped(out, name.as_bytes());
                append_value(out, v);
            }
            out.push(END);
        }
    }
}

/// Decodes a value that must span the whole of `data`.
pub fn decode_value(data: &[u8]) -> Result<Value> {
    let mut pos = 0;
    let value = read_value(data, &mut pos)?;
    if pos != data.len() {
        return Err(EncodingError::TrailingBytes(data.len() - pos));
    }
    Ok(value)
}

/// Decodes one value starting at `*pos` and advances `pos` past it.
pub fn read_value(data: &[u8], pos: &mut usize) -> Result<Value> {
    let offset = *pos;
    let tag = next_byte(data, pos)?;
    match tag {
        TAG_NULL => Ok(Value::Null),
        TAG_BOOL => match next_byte(data, pos)? {
            0 => Ok(Value::Bool(false)),
            1 => Ok(Value::Bool(true)),
            other => Err(EncodingError::InvalidTag {
                tag: other,
                offset: *pos - 1,
            }),
        },
        TAG_NUMBER => {
            let image = take::<8>(data, pos)?;
            match next_byte(data, pos)? {
                NUMBER_DOUBLE => Ok(Value::Double(from_sort_image(image))),
                NUMBER_INTEGER => {
                    let raw = u64::from_be_bytes(take::<8>(data, pos)?);
                    Ok(Value::Integer((raw ^ SIGN) as i64))
                }
                other => Err(EncodingError::InvalidTag {
                    tag: other,
                    offset: *pos - 1,
                }),
            }
        }
        TAG_TEXT => {
            let bytes = read_escaped(data, pos)?;
            String::from_utf8(bytes)
                .map(Value::Text)
                .map_err(|_| EncodingError::InvalidUtf8)
        }
        TAG_BLOB => read_escaped(data, pos).map(Value::Blob),
        TAG_ARRAY => {
            let mut items = Vec::new();
            loop {
                if peek_byte(data, *pos)? == END {
                    *pos += 1;
                    return Ok(Value::Array(items));
                }
                items.push(read_value(data, pos)?);
            }
        }
        TAG_DOCUMENT => {
            let mut doc = Document::new();
            loop {
                let marker_at = *pos;
                match next_byte(data, pos)? {
                    END => return Ok(Value::Document(doc)),
                    FIELD => {
                        let name = String::from_utf8(read_escaped(data, pos)?)
                            .map_err(|_| EncodingError::InvalidUtf8)?;
                        let value = read_value(data, pos)?;
                        doc.set(name, value);
                    }
                    other => {
                        return Err(EncodingError::InvalidTag {
                            tag: other,
                            offset: marker_at,
                        })
                    }
                }
            }
        }
        other => Err(EncodingError::InvalidTag { tag: other, offset }),
    }
}

/// Returns the smallest byte string greater than every string with the given
/// prefix, or None if no such string exists (the prefix is all `0xFF`).
pub fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut out = prefix.to_vec();
    while let Some(last) = out.pop() {
        if last != 0xFF {
            out.push(last + 1);
            return Some(out);
        }
    }
    None
}

/// Maps an `f64` to 8 bytes whose byte order matches `f64::total_cmp` after
/// folding -0.0 into 0.0 and every NaN into the canonical NaN.
fn sort_image(f: f64) -> [u8; 8] {
    let f = if f.is_nan() {
        f64::NAN
    } else if f == 0.0 {
        0.0
    } else {
        f
    };
    let bits = f.to_bits();
    let bits = if bits & SIGN != 0 { !bits } else { bits ^ SIGN };
    bits.to_be_bytes()
}

fn from_sort_image(image: [u8; 8]) -> f64 {
    let bits = u64::from_be_bytes(image);
    let bits = if bits & SIGN != 0 { bits ^ SIGN } else { !bits };
    f64::from_bits(bits)
}

fn append_escaped(out: &mut Vec<u8>, bytes: &[u8]) {
    for &b in bytes {
        if b == ESCAPE {
            out.push(ESCAPE);
            out.push(ESCAPED_ZERO);
        } else {
            out.push(b);
        }
    }
    out.push(ESCAPE);
    out.push(TERMINATOR);
}

fn read_escaped(data: &[u8], pos: &mut usize) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    loop {
        let b = next_byte(data, pos)?;
        if b != ESCAPE {
            bytes.push(b);
            continue;
        }
        match next_byte(data, pos)? {
            ESCAPED_ZERO => bytes.push(0),
            TERMINATOR => return Ok(bytes),
            _ => return Err(EncodingError::InvalidEscape(*pos - 2)),
        }
    }
}

fn peek_byte(data: &[u8], pos: usize) -> Result<u8> {
    data.get(pos).copied().ok_or(EncodingError::UnexpectedEof(pos))
}

fn next_byte(data: &[u8], pos: &mut usize) -> Result<u8> {
    let b = peek_byte(data, *pos)?;
    *pos += 1;
    Ok(b)
}

fn take<const N: usize>(data: &[u8], pos: &mut usize) -> Result<[u8; N]> {
    let end = *pos + N;
    let bytes: [u8; N] = data
        .get(*pos..end)
        .and_then(|s| s.try_into().ok())
        .ok_or(EncodingError::UnexpectedEof(data.len()))?;
    *pos = end;
    Ok(bytes)
}
