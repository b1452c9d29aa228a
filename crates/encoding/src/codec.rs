//! Document codecs.
//!
//! A `Codec` turns a document into the bytes stored under its key and back.
//! The database takes the codec as an option so that the stored format can be
//! swapped without touching table or index code.
//!
//! ## BinaryCodec format
//!
//! A document is encoded as a field count followed by each field's name and
//! value. Counts and lengths use the `uint` varint. Each value is encoded as
//! `[type_tag: u8] [data...]`:
//!
//! - 0x00: null
//! - 0x01: false
//! - 0x02: true
//! - 0x03: integer (8 bytes, i64 big-endian)
//! - 0x04: double (8 bytes, f64 bits big-endian)
//! - 0x05: text (varint length + UTF-8 bytes)
//! - 0x06: blob (varint length + bytes)
//! - 0x07: array (varint count + encoded elements)
//! - 0x08: document (varint count + fields)

use crate::error::EncodingError;
use crate::uint::{append_uint, read_uint};
use crate::Result;
use alloc::string::String;
use alloc::vec::Vec;
use strata_core::{Document, Value};

const TAG_NULL: u8 = 0x00;
const TAG_FALSE: u8 = 0x01;
const TAG_TRUE: u8 = 0x02;
const TAG_INTEGER: u8 = 0x03;
const TAG_DOUBLE: u8 = 0x04;
const TAG_TEXT: u8 = 0x05;
const TAG_BLOB: u8 = 0x06;
const TAG_ARRAY: u8 = 0x07;
const TAG_DOCUMENT: u8 = 0x08;

/// Encodes documents for storage.
pub trait Codec: Send + Sync {
    /// Encodes a document. The document's storage key is not part of the output.
    fn encode(&self, doc: &Document) -> Vec<u8>;

    /// Decodes a document previously produced by `encode`.
    fn decode(&self, data: &[u8]) -> Result<Document>;
}

/// The default compact binary codec.
#[derive(Clone, Copy, Debug, Default)]
pub struct BinaryCodec;

impl BinaryCodec {
    /// Creates a new binary codec.
    pub fn new() -> Self {
        Self
    }
}

impl Codec for BinaryCodec {
    fn encode(&self, doc: &Document) -> Vec<u8> {
        let mut out = Vec::new();
        encode_fields(doc, &mut out);
        out
    }

    fn decode(&self, data: &[u8]) -> Result<Document> {
        let mut pos = 0;
        let doc = decode_fields(data, &mut pos)?;
        if pos != data.len() {
            return Err(EncodingError::TrailingBytes(data.len() - pos));
        }
        Ok(doc)
    }
}

fn encode_fields(doc: &Document, out: &mut Vec<u8>) {
    append_uint(out, doc.len() as u64);
    for (name, value) in doc.iter() {
        append_uint(out, name.len() as u64);
        out.extend_from_slice(name.as_bytes());
        encode_value(value, out);
    }
}

fn encode_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Null => out.push(TAG_NULL),
        Value::Bool(false) => out.push(TAG_FALSE),
        Value::Bool(true) => out.push(TAG_TRUE),
        Value::Integer(i) => {
            out.push(TAG_INTEGER);
            out.extend_from_slice(&i.to_be_bytes());
        }
        Value::Double(f) => {
            out.push(TAG_DOUBLE);
            out.extend_from_slice(&f.to_bits().to_be_bytes());
        }
        Value::Text(s) => {
            out.push(TAG_TEXT);
            append_uint(out, s.len() as u64);
            out.extend_from_slice(s.as_bytes());
        }
        Value::Blob(b) => {
            out.push(TAG_BLOB);
            append_uint(out, b.len() as u64);
            out.extend_from_slice(b);
        }
        Value::Array(items) => {
            out.push(TAG_ARRAY);
            append_uint(out, items.len() as u64);
            for item in items {
                encode_value(item, out);
            }
        }
        Value::Document(doc) => {
            out.push(TAG_DOCUMENT);
            encode_fields(doc, out);
        }
    }
}

fn decode_fields(data: &[u8], pos: &mut usize) -> Result<Document> {
    let count = decode_len(data, pos)?;
    let mut doc = Document::with_capacity(count.min(data.len()));
    for _ in 0..count {
        let name = String::from_utf8(decode_bytes(data, pos)?.to_vec())
            .map_err(|_| EncodingError::InvalidUtf8)?;
        let value = decode_value(data, pos)?;
        doc.set(name, value);
    }
    Ok(doc)
}

fn decode_value(data: &[u8], pos: &mut usize) -> Result<Value> {
    let offset = *pos;
    let tag = *data.get(offset).ok_or(EncodingError::UnexpectedEof(offset))?;
    *pos += 1;

    match tag {
        TAG_NULL => Ok(Value::Null),
        TAG_FALSE => Ok(Value::Bool(false)),
        TAG_TRUE => Ok(Value::Bool(true)),
        TAG_INTEGER => Ok(Value::Integer(i64::from_be_bytes(take8(data, pos)?))),
        TAG_DOUBLE => Ok(Value::Double(f64::from_bits(u64::from_be_bytes(take8(
            data, pos,
        )?)))),
        TAG_TEXT => String::from_utf8(decode_bytes(data, pos)?.to_vec())
            .map(Value::Text)
            .map_err(|_| EncodingError::InvalidUtf8),
        TAG_BLOB => Ok(Value::Blob(decode_bytes(data, pos)?.to_vec())),
        TAG_ARRAY => {
            let count = decode_len(data, pos)?;
            let mut items = Vec::with_capacity(count.min(data.len()));
            for _ in 0..count {
                items.push(decode_value(data, pos)?);
            }
            Ok(Value::Array(items))
        }
        TAG_DOCUMENT => decode_fields(data, pos).map(Value::Document),
        other => Err(EncodingError::InvalidTag { tag: other, offset }),
    }
}

fn decode_len(data: &[u8], pos: &mut usize) -> Result<usize> {
    let rest = data.get(*pos..).unwrap_or_default();
    let (value, n) = read_uint(rest).map_err(|e| match e {
        EncodingError::UnexpectedEof(_) => EncodingError::UnexpectedEof(data.len()),
        other => other,
    })?;
    *pos += n;
    usize::try_from(value).map_err(|_| EncodingError::UnexpectedEof(data.len()))
}

fn decode_bytes<'a>(data: &'a [u8], pos: &mut usize) -> Result<&'a [u8]> {
    let len = decode_len(data, pos)?;
    let end = pos
        .checked_add(len)
        .filter(|end| *end <= data.len())
        .ok_or(EncodingError::UnexpectedEof(data.len()))?;
    let bytes = &data[*pos..end];
    *pos = end;
    Ok(bytes)
}

fn take8(data: &[u8], pos: &mut usize) -> Result<[u8; 8]> {
    let bytes: [u8; 8] = data
        .get(*pos..*pos + 8)
        .and_then(|s| s.try_into().ok())
        .ok_or(EncodingError::UnexpectedEof(data.len()))?;
    *pos += 8;
    Ok(bytes)
}
