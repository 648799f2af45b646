//! Record decoding: the self-describing row encoding inside a cell payload.

use bytes::Bytes;

use crate::db::error::{DbError, Result};
use crate::db::header::TextEncoding;
use crate::db::varint::read_varint;

/// Storage representation of a single column, identified by its serial
/// type code in the record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialType {
    Null,
    Int8,
    Int16,
    Int24,
    Int32,
    Int48,
    Int64,
    Float64,
    /// The literal integer 0, stored with zero content bytes.
    Zero,
    /// The literal integer 1, stored with zero content bytes.
    One,
    Blob,
    Text,
}

impl SerialType {
    /// Map a serial type code to its type and content width in bytes.
    ///
    /// The table is closed: codes 10 and 11 are reserved and rejected, and
    /// every code >= 12 is a blob (even) or text (odd) of derived length.
    fn from_code(code: i64) -> Result<(Self, usize)> {
        match code {
            0 => Ok((Self::Null, 0)),
            1 => Ok((Self::Int8, 1)),
            2 => Ok((Self::Int16, 2)),
            3 => Ok((Self::Int24, 3)),
            4 => Ok((Self::Int32, 4)),
            5 => Ok((Self::Int48, 6)),
            6 => Ok((Self::Int64, 8)),
            7 => Ok((Self::Float64, 8)),
            8 => Ok((Self::Zero, 0)),
            9 => Ok((Self::One, 0)),
            10 | 11 => Err(DbError::ReservedType(code)),
            n if n >= 12 && n % 2 == 0 => Ok((Self::Blob, ((n - 12) / 2) as usize)),
            n if n >= 13 => Ok((Self::Text, ((n - 13) / 2) as usize)),
            n => Err(DbError::Format(format!("negative serial type code: {n}"))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int24 => "int24",
            Self::Int32 => "int32",
            Self::Int48 => "int48",
            Self::Int64 => "int64",
            Self::Float64 => "float64",
            Self::Zero => "zero",
            Self::One => "one",
            Self::Blob => "blob",
            Self::Text => "text",
        }
    }
}

/// One decoded column: its storage type and a view of its content bytes.
#[derive(Debug, Clone)]
pub struct Column {
    serial_type: SerialType,
    data: Bytes,
}

impl Column {
    pub fn serial_type(&self) -> SerialType {
        self.serial_type
    }

    pub fn is_null(&self) -> bool {
        self.serial_type == SerialType::Null
    }

    /// Integer value of an integer-typed column, sign-extended from its
    /// stored width. The Zero/One literals count as integers.
    pub fn as_integer(&self) -> Result<i64> {
        match self.serial_type {
            SerialType::Int8
            | SerialType::Int16
            | SerialType::Int24
            | SerialType::Int32
            | SerialType::Int48
            | SerialType::Int64 => Ok(read_be_int(&self.data)),
            SerialType::Zero => Ok(0),
            SerialType::One => Ok(1),
            other => Err(DbError::TypeMismatch {
                requested: "integer",
                actual: other.name(),
            }),
        }
    }

    pub fn as_float(&self) -> Result<f64> {
        match self.serial_type {
            SerialType::Float64 => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&self.data);
                Ok(f64::from_be_bytes(raw))
            }
            other => Err(DbError::TypeMismatch {
                requested: "float",
                actual: other.name(),
            }),
        }
    }

    /// Text content decoded with the database's declared encoding.
    pub fn as_text(&self, encoding: TextEncoding) -> Result<String> {
        match self.serial_type {
            SerialType::Text => decode_text(&self.data, encoding),
            other => Err(DbError::TypeMismatch {
                requested: "text",
                actual: other.name(),
            }),
        }
    }

    pub fn as_blob(&self) -> Result<&[u8]> {
        match self.serial_type {
            SerialType::Blob => Ok(&self.data),
            other => Err(DbError::TypeMismatch {
                requested: "blob",
                actual: other.name(),
            }),
        }
    }
}

/// An ordered sequence of typed columns decoded from one cell payload.
#[derive(Debug, Clone)]
pub struct Record {
    columns: Vec<Column>,
}

impl Record {
    /// Decode a cell payload.
    ///
    /// The first varint is the header section's total length in bytes,
    /// inclusive of itself. Serial type varints follow until the running
    /// byte count equals that length exactly; the number of varints read is
    /// the column count, which is stored nowhere else. Column content is
    /// packed immediately after the header and must account for every
    /// remaining payload byte.
    pub fn decode(payload: &Bytes) -> Result<Self> {
        let (header_length, consumed) = read_varint(payload, 0)?;
        let header_length = usize::try_from(header_length)
            .ok()
            .filter(|&n| n >= consumed && n <= payload.len())
            .ok_or_else(|| {
                DbError::Format(format!(
                    "record header length {header_length} does not fit payload of {} bytes",
                    payload.len()
                ))
            })?;

        let mut types = Vec::new();
        let mut pos = consumed;
        while pos < header_length {
            let (code, consumed) = read_varint(payload, pos)?;
            pos += consumed;
            types.push(SerialType::from_code(code)?);
        }
        if pos != header_length {
            return Err(DbError::Format(format!(
                "record header varints consumed {pos} bytes, declared length is {header_length}"
            )));
        }

        let mut columns = Vec::with_capacity(types.len());
        for (serial_type, width) in types {
            if pos + width > payload.len() {
                return Err(DbError::Format(format!(
                    "column content of {width} bytes at offset {pos} runs past the \
                     {}-byte payload",
                    payload.len()
                )));
            }
            columns.push(Column {
                serial_type,
                data: payload.slice(pos..pos + width),
            });
            pos += width;
        }

        // every payload byte must belong to the header or to a column
        if pos != payload.len() {
            return Err(DbError::Format(format!(
                "record consumed {pos} of {} payload bytes",
                payload.len()
            )));
        }

        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Big-endian two's-complement integer of 1..=8 bytes, sign-extended.
fn read_be_int(data: &[u8]) -> i64 {
    let mut value: i64 = if data.first().is_some_and(|&b| b & 0x80 != 0) {
        -1
    } else {
        0
    };
    for &byte in data {
        value = (value << 8) | byte as i64;
    }
    value
}

fn decode_text(data: &[u8], encoding: TextEncoding) -> Result<String> {
    match encoding {
        TextEncoding::Utf8 => std::str::from_utf8(data)
            .map(str::to_owned)
            .map_err(|e| DbError::Format(format!("invalid UTF-8 in text column: {e}"))),
        TextEncoding::Utf16Le | TextEncoding::Utf16Be => {
            if data.len() % 2 != 0 {
                return Err(DbError::Format(format!(
                    "UTF-16 text column has odd byte length {}",
                    data.len()
                )));
            }
            let units: Vec<u16> = data
                .chunks_exact(2)
                .map(|pair| match encoding {
                    TextEncoding::Utf16Le => u16::from_le_bytes([pair[0], pair[1]]),
                    _ => u16::from_be_bytes([pair[0], pair[1]]),
                })
                .collect();
            String::from_utf16(&units)
                .map_err(|e| DbError::Format(format!("invalid UTF-16 in text column: {e}")))
        }
    }
}
