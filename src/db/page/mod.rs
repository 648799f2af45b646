//! Page and record decoding for the database file format.

mod page;
mod record;

pub use page::{Cell, Page, PageHeader, PageType};
pub use record::{Column, Record, SerialType};
