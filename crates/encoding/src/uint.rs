//! Order-preserving variable-length unsigned integers.
//!
//! Small values take a single byte and the byte-wise order of two encodings
//! matches the numeric order of the values. The first byte `A0` selects the
//! layout:
//!
//! | A0        | Total bytes | Value                               |
//! |-----------|-------------|-------------------------------------|
//! | 0..=240   | 1           | `A0`                                |
//! | 241..=248 | 2           | `240 + 256 * (A0 - 241) + A1`       |
//! | 249       | 3           | `2288 + 256 * A1 + A2`              |
//! | 250..=255 | 4..=9       | `A0 - 247` big-endian bytes follow  |

use crate::error::EncodingError;
use crate::Result;
use alloc::vec::Vec;

const ONE_BYTE_MAX: u64 = 240;
const TWO_BYTE_MAX: u64 = 2287;
const THREE_BYTE_MAX: u64 = 67823;

/// Encodes `value` into a new buffer.
pub fn encode_uint(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(9);
    append_uint(&mut out, value);
    out
}

/// Appends the encoding of `value` to `out`.
pub fn append_uint(out: &mut Vec<u8>, value: u64) {
    if value <= ONE_BYTE_MAX {
        out.push(value as u8);
    } else if value <= TWO_BYTE_MAX {
        let v = value - 240;
        out.push((v / 256 + 241) as u8);
        out.push((v % 256) as u8);
    } else if value <= THREE_BYTE_MAX {
        let v = value - 2288;
        out.push(249);
        out.push((v / 256) as u8);
        out.push((v % 256) as u8);
    } else {
        let len = 8 - (value.leading_zeros() / 8) as usize;
        // At least three payload bytes.
        let len = len.max(3);
        out.push((247 + len) as u8);
        out.extend_from_slice(&value.to_be_bytes()[8 - len..]);
    }
}

/// Decodes a value that must span the whole of `data`.
pub fn decode_uint(data: &[u8]) -> Result<u64> {
    let (value, n) = read_uint(data)?;
    if n != data.len() {
        return Err(EncodingError::TrailingBytes(data.len() - n));
    }
    Ok(value)
}

/// Decodes a value from the front of `data`.
///
/// Returns the value and the number of bytes consumed.
pub fn read_uint(data: &[u8]) -> Result<(u64, usize)> {
    let a0 = *data.first().ok_or(EncodingError::UnexpectedEof(0))?;
    let byte = |i: usize| data.get(i).copied().ok_or(EncodingError::UnexpectedEof(i));

    match a0 {
        0..=240 => Ok((a0 as u64, 1)),
        241..=248 => {
            let a1 = byte(1)? as u64;
            Ok((240 + 256 * (a0 as u64 - 241) + a1, 2))
        }
        249 => {
            let a1 = byte(1)? as u64;
            let a2 = byte(2)? as u64;
            Ok((2288 + 256 * a1 + a2, 3))
        }
        _ => {
            let len = (a0 - 247) as usize;
            if data.len() < 1 + len {
                return Err(EncodingError::UnexpectedEof(data.len()));
            }
            let value = data[1..=len]
                .iter()
                .fold(0u64, |acc, b| (acc << 8) | *b as u64);
            Ok((value, 1 + len))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_boundaries() {
        assert_eq!(encode_uint(0), vec![0]);
        assert_eq!(encode_uint(240), vec![240]);
        assert_eq!(encode_uint(241), vec![241, 1]);
        assert_eq!(encode_uint(2287), vec![248, 255]);
        assert_eq!(encode_uint(2288), vec![249, 0, 0]);
        assert_eq!(encode_uint(67823), vec![249, 255, 255]);
        assert_eq!(encode_uint(67824), vec![250, 0x01, 0x08, 0xF0]);
        assert_eq!(encode_uint(0xFF_FFFF), vec![250, 0xFF, 0xFF, 0xFF]);
        assert_eq!(encode_uint(0x100_0000), vec![251, 0x01, 0x00, 0x00, 0x00]);
        assert_eq!(encode_uint(u64::MAX).len(), 9);
        assert_eq!(encode_uint(u64::MAX)[0], 255);
    }

    #[test]
    fn test_decode_boundaries() {
        for v in [
            0,
            1,
            240,
            241,
            2287,
            2288,
            67823,
            67824,
            0xFF_FFFF,
            0x100_0000,
            u32::MAX as u64,
            u64::MAX,
        ] {
            assert_eq!(decode_uint(&encode_uint(v)).unwrap(), v);
        }
    }

    #[test]
    fn test_order_at_boundaries() {
        let values = [0u64, 240, 241, 2287, 2288, 67823, 67824, 1 << 32, u64::MAX];
        for pair in values.windows(2) {
            assert!(encode_uint(pair[0]) < encode_uint(pair[1]));
        }
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(decode_uint(&[]), Err(EncodingError::UnexpectedEof(0)));
        assert_eq!(decode_uint(&[241]), Err(EncodingError::UnexpectedEof(1)));
        assert_eq!(decode_uint(&[251, 0, 0]), Err(EncodingError::UnexpectedEof(3)));
        assert_eq!(decode_uint(&[5, 0]), Err(EncodingError::TrailingBytes(1)));
    }

    #[test]
    fn test_read_uint_reports_length() {
        let mut buf = encode_uint(3000);
        buf.push(0xAA);
        assert_eq!(read_uint(&buf).unwrap(), (3000, 3));
    }
}
