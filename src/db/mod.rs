//! Read-only decoding of the SQLite database file format.
//!
//! The pipeline is strictly sequential: file bytes -> [`DatabaseHeader`] ->
//! page buffer -> [`PageHeader`] + cell directory -> cell payloads ->
//! [`Record`] columns -> [`SchemaCatalog`] (page 1) or row consumers. Every
//! field boundary past the fixed header is discovered by decoding the field
//! before it, so each step either returns a complete value or a typed error;
//! partial results are never observable.

mod database;
mod error;
mod header;
mod schema;
mod varint;

pub mod page;

pub use database::Database;
pub use error::{DbError, Result};
pub use header::{DB_HEADER_SIZE, DatabaseHeader, TextEncoding};
pub use page::{Cell, Column, Page, PageHeader, PageType, Record, SerialType};
pub use schema::{SchemaCatalog, SchemaEntry};
