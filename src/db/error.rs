//! Error taxonomy for the decode pipeline.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

/// Every malformed-input path surfaces one of these variants. All of them
/// are fail-fast: corrupted input cannot self-heal, so nothing is retried
/// and a single bad cell aborts the catalog or scan it belongs to.
#[derive(Debug, Error)]
pub enum DbError {
    /// A structural invariant of the file format was violated.
    #[error("format error: {0}")]
    Format(String),

    /// Fewer bytes remain than a fixed or declared-length field requires.
    #[error("unexpected end of input at offset {offset}: needed {needed} bytes, {available} available")]
    Bounds {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Text encoding code outside 1..=3.
    #[error("unsupported text encoding code: {0} (expected 1=UTF-8, 2=UTF-16LE, 3=UTF-16BE)")]
    UnsupportedEncoding(u32),

    /// Serial types 10 and 11 never appear in a well-formed database file.
    #[error("serial type {0} is reserved for internal use")]
    ReservedType(i64),

    /// A typed accessor was invoked on a column that cannot satisfy it.
    #[error("cannot read {requested} from a column stored as {actual}")]
    TypeMismatch {
        requested: &'static str,
        actual: &'static str,
    },

    /// A row on page 1 does not have the schema table's column shape.
    #[error("malformed schema row: {0}")]
    Schema(String),

    /// The file needs a feature this decoder deliberately does not implement
    /// (overflow pages, interior-page traversal).
    #[error("not supported: {0}")]
    NotSupported(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
