//! Database handle: open a file, validate its header, and read pages.

use bytes::Bytes;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use super::error::{DbError, Result};
use super::header::{DB_HEADER_SIZE, DatabaseHeader, TextEncoding};
use super::page::{Page, Record};
use super::schema::SchemaCatalog;

/// A read-only handle over one database file.
///
/// Opening validates the 100-byte header and decodes the schema catalog
/// from page 1 once; both are immutable for the life of the handle. The
/// underlying source is owned by the handle and released when it drops,
/// on every exit path. No concurrent writer is assumed to exist.
pub struct Database<R> {
    source: R,
    header: DatabaseHeader,
    schema: SchemaCatalog,
}

impl Database<File> {
    /// Open a database file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_reader(File::open(path)?)
    }
}

impl<R: Read + Seek> Database<R> {
    /// Open a database over any seekable byte source.
    pub fn from_reader(mut source: R) -> Result<Self> {
        let mut header_bytes = [0u8; DB_HEADER_SIZE];
        source.seek(SeekFrom::Start(0))?;
        read_full(&mut source, 0, &mut header_bytes)?;
        let header = DatabaseHeader::decode(&header_bytes)?;

        let first_page = read_page_from(&mut source, header.page_size, 1)?;
        let schema = SchemaCatalog::from_page(&first_page, header.text_encoding)?;

        Ok(Self {
            source,
            header,
            schema,
        })
    }

    pub fn header(&self) -> &DatabaseHeader {
        &self.header
    }

    pub fn page_size(&self) -> u32 {
        self.header.page_size
    }

    pub fn text_encoding(&self) -> TextEncoding {
        self.header.text_encoding
    }

    pub fn schema(&self) -> &SchemaCatalog {
        &self.schema
    }

    /// Read and decode one page (1-indexed).
    pub fn read_page(&mut self, page_number: u32) -> Result<Page> {
        if page_number == 0 || page_number > self.header.file_size_in_pages {
            return Err(DbError::Format(format!(
                "page number {page_number} outside 1..={}",
                self.header.file_size_in_pages
            )));
        }
        read_page_from(&mut self.source, self.header.page_size, page_number)
    }

    /// Decode every row of a single-leaf-page table, in cell directory
    /// order. A table whose root is an interior page spans multiple pages
    /// and is out of scope; any malformed cell aborts the whole scan.
    pub fn scan_rows(&mut self, root_page: u32) -> Result<Vec<Record>> {
        let page = self.read_page(root_page)?;
        page.leaf_cells()?
            .iter()
            .map(|cell| Record::decode(&cell.payload))
            .collect()
    }
}

fn read_page_from<R: Read + Seek>(source: &mut R, page_size: u32, page_number: u32) -> Result<Page> {
    let offset = (page_number as u64 - 1) * page_size as u64;
    let mut buffer = vec![0u8; page_size as usize];
    source.seek(SeekFrom::Start(offset))?;
    read_full(source, offset as usize, &mut buffer)?;
    Page::decode(Bytes::from(buffer), page_number)
}

/// `read_exact` with short reads reported as `Bounds`, so a truncated file
/// fails the same way a truncated buffer does.
fn read_full<R: Read>(source: &mut R, offset: usize, buffer: &mut [u8]) -> Result<()> {
    source.read_exact(buffer).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            DbError::Bounds {
                offset,
                needed: buffer.len(),
                available: 0,
            }
        } else {
            DbError::Io(e)
        }
    })
}
