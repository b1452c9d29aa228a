use thiserror::Error;

/// Errors raised while decoding bytes.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("unexpected end of input at offset {0}")]
    UnexpectedEof(usize),
    #[error("invalid tag 0x{tag:02x} at offset {offset}")]
    InvalidTag { tag: u8, offset: usize },
    #[error("invalid escape sequence at offset {0}")]
    InvalidEscape(usize),
    #[error("invalid utf-8 in text")]
    InvalidUtf8,
    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),
}
