//! The fixed 100-byte header at the start of every database file.

use super::error::{DbError, Result};

/// Size of the database header on page 1.
pub const DB_HEADER_SIZE: usize = 100;

/// The header string: "SQLite format 3\0".
const MAGIC: &[u8; 16] = b"SQLite format 3\0";

const PAGE_SIZE_OFFSET: usize = 16;
const MAX_PAYLOAD_FRACTION_OFFSET: usize = 21;
const MIN_PAYLOAD_FRACTION_OFFSET: usize = 22;
const LEAF_PAYLOAD_FRACTION_OFFSET: usize = 23;
const FILE_SIZE_OFFSET: usize = 28;
const SCHEMA_FORMAT_OFFSET: usize = 44;
const TEXT_ENCODING_OFFSET: usize = 56;
const RESERVED_OFFSET: usize = 72;
const RESERVED_LEN: usize = 20;

/// Text encoding used by every text column in the file, declared once in
/// the database header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

/// Decoded form of the 100-byte file preamble.
#[derive(Debug, Clone)]
pub struct DatabaseHeader {
    /// Page size in bytes. A raw value of 1 encodes 65536; everything else
    /// is a power of two in [512, 32768].
    pub page_size: u32,
    /// The "in-header database size" in pages.
    pub file_size_in_pages: u32,
    /// Schema format number, 1 through 4.
    pub schema_format: u32,
    pub text_encoding: TextEncoding,
}

impl DatabaseHeader {
    /// Decode and validate the first 100 bytes of a database file.
    ///
    /// Every fixed-value byte (magic string, payload fractions, reserved
    /// region) is checked unconditionally; a mismatch in any of them is a
    /// structural `Format` error naming the field, never a warning.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < DB_HEADER_SIZE {
            return Err(DbError::Bounds {
                offset: 0,
                needed: DB_HEADER_SIZE,
                available: bytes.len(),
            });
        }

        if &bytes[..MAGIC.len()] != MAGIC {
            return Err(DbError::Format(
                "header magic is not \"SQLite format 3\\0\"".into(),
            ));
        }

        let page_size = decode_page_size(u16::from_be_bytes([
            bytes[PAGE_SIZE_OFFSET],
            bytes[PAGE_SIZE_OFFSET + 1],
        ]))?;

        if bytes[MAX_PAYLOAD_FRACTION_OFFSET] != 64 {
            return Err(DbError::Format(format!(
                "maximum embedded payload fraction must be 64, got {}",
                bytes[MAX_PAYLOAD_FRACTION_OFFSET]
            )));
        }
        if bytes[MIN_PAYLOAD_FRACTION_OFFSET] != 32 {
            return Err(DbError::Format(format!(
                "minimum embedded payload fraction must be 32, got {}",
                bytes[MIN_PAYLOAD_FRACTION_OFFSET]
            )));
        }
        if bytes[LEAF_PAYLOAD_FRACTION_OFFSET] != 32 {
            return Err(DbError::Format(format!(
                "leaf payload fraction must be 32, got {}",
                bytes[LEAF_PAYLOAD_FRACTION_OFFSET]
            )));
        }

        let file_size_in_pages = read_u32(bytes, FILE_SIZE_OFFSET);

        let schema_format = read_u32(bytes, SCHEMA_FORMAT_OFFSET);
        if !(1..=4).contains(&schema_format) {
            return Err(DbError::Format(format!(
                "schema format number must be 1..=4, got {schema_format}"
            )));
        }

        let text_encoding = match read_u32(bytes, TEXT_ENCODING_OFFSET) {
            1 => TextEncoding::Utf8,
            2 => TextEncoding::Utf16Le,
            3 => TextEncoding::Utf16Be,
            other => return Err(DbError::UnsupportedEncoding(other)),
        };

        let reserved = &bytes[RESERVED_OFFSET..RESERVED_OFFSET + RESERVED_LEN];
        if reserved.iter().any(|&b| b != 0) {
            return Err(DbError::Format(
                "reserved region at offset 72 must be zero".into(),
            ));
        }

        Ok(Self {
            page_size,
            file_size_in_pages,
            schema_format,
            text_encoding,
        })
    }
}

/// A raw value of 1 represents 65536, which a u16 field cannot hold
/// directly. Everything else must be a power of two in [512, 32768].
fn decode_page_size(raw: u16) -> Result<u32> {
    match raw {
        1 => Ok(65536),
        n if n >= 512 && n.is_power_of_two() => Ok(n as u32),
        n => Err(DbError::Format(format!(
            "invalid page size encoding in header: {n}"
        ))),
    }
}

fn read_u32(bytes: &[u8], pos: usize) -> u32 {
    u32::from_be_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]])
}
