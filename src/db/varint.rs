//! Variable-length integer (varint) decoding for the SQLite file format.

use super::error::{DbError, Result};

const VARINT_MAX_BYTES: usize = 9;
const VARINT_CONTINUATION_BIT: u8 = 0x80;
const VARINT_DATA_MASK: u8 = 0x7F;

/// Decode a varint from `data` starting at `pos`.
///
/// Each of the first eight bytes contributes its low 7 bits, with the high
/// bit acting as a continuation flag. If all eight flags are set, a 9th byte
/// contributes all 8 of its bits (no flag check), which lets the encoding
/// cover the full 64-bit range.
///
/// Returns the decoded value and the number of bytes consumed (1..=9), or
/// `DbError::Bounds` if the slice ends before a terminating byte is found.
pub fn read_varint(data: &[u8], pos: usize) -> Result<(i64, usize)> {
    let mut value: i64 = 0;

    for i in 0..VARINT_MAX_BYTES - 1 {
        let byte = *data.get(pos + i).ok_or(DbError::Bounds {
            offset: pos + i,
            needed: 1,
            available: 0,
        })?;

        value = (value << 7) | (byte & VARINT_DATA_MASK) as i64;
        if byte & VARINT_CONTINUATION_BIT == 0 {
            return Ok((value, i + 1));
        }
    }

    // 9th byte goes in fully
    let byte = *data.get(pos + VARINT_MAX_BYTES - 1).ok_or(DbError::Bounds {
        offset: pos + VARINT_MAX_BYTES - 1,
        needed: 1,
        available: 0,
    })?;
    value = (value << 8) | byte as i64;

    Ok((value, VARINT_MAX_BYTES))
}
