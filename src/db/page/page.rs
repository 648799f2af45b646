//! Page structure: type, header, cell pointer directory, and leaf cells.

use bytes::Bytes;

use crate::db::error::{DbError, Result};
use crate::db::header::DB_HEADER_SIZE;
use crate::db::varint::read_varint;

const LEAF_HEADER_SIZE: usize = 8;
const INTERIOR_HEADER_SIZE: usize = 12;
const CELL_POINTER_SIZE: usize = 2;

const FREE_BLOCK_START_OFFSET: usize = 1;
const CELL_COUNT_OFFSET: usize = 3;
const CELL_CONTENT_START_OFFSET: usize = 5;
const RESERVED_FREE_BYTES_OFFSET: usize = 7;
const RIGHTMOST_POINTER_OFFSET: usize = 8;

/// The four legal b-tree page types. Any other type byte is a format error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    InteriorIndex,
    InteriorTable,
    LeafIndex,
    LeafTable,
}

impl PageType {
    fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            2 => Ok(Self::InteriorIndex),
            5 => Ok(Self::InteriorTable),
            10 => Ok(Self::LeafIndex),
            13 => Ok(Self::LeafTable),
            other => Err(DbError::Format(format!("unknown page type byte: {other}"))),
        }
    }

    pub fn is_interior(self) -> bool {
        matches!(self, Self::InteriorIndex | Self::InteriorTable)
    }

    /// Interior pages carry a 4-byte rightmost pointer after the common
    /// 8-byte header.
    pub fn header_size(self) -> usize {
        if self.is_interior() {
            INTERIOR_HEADER_SIZE
        } else {
            LEAF_HEADER_SIZE
        }
    }
}

/// The 8- or 12-byte structural header at a page's own offset 0.
#[derive(Debug, Clone)]
pub struct PageHeader {
    pub page_type: PageType,
    pub free_block_start: u16,
    pub num_cells: u16,
    /// Start of the cell content area. Raw 0 encodes 65536, which the
    /// 2-byte field cannot otherwise represent.
    pub cell_content_start: u32,
    pub reserved_free_bytes: u8,
    /// Present only on the two interior page types.
    pub rightmost_pointer: Option<u32>,
}

impl PageHeader {
    /// Decode a page header from a page-relative buffer (byte 0 is the
    /// page's own first byte; for page 1 the caller skips the 100-byte
    /// database header first).
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < LEAF_HEADER_SIZE {
            return Err(DbError::Bounds {
                offset: 0,
                needed: LEAF_HEADER_SIZE,
                available: bytes.len(),
            });
        }

        let page_type = PageType::from_byte(bytes[0])?;
        if page_type.is_interior() && bytes.len() < INTERIOR_HEADER_SIZE {
            return Err(DbError::Bounds {
                offset: 0,
                needed: INTERIOR_HEADER_SIZE,
                available: bytes.len(),
            });
        }

        let free_block_start = read_u16(bytes, FREE_BLOCK_START_OFFSET);
        let num_cells = read_u16(bytes, CELL_COUNT_OFFSET);
        let cell_content_start = match read_u16(bytes, CELL_CONTENT_START_OFFSET) {
            0 => 65536,
            n => n as u32,
        };
        let reserved_free_bytes = bytes[RESERVED_FREE_BYTES_OFFSET];

        let rightmost_pointer = if page_type.is_interior() {
            Some(u32::from_be_bytes([
                bytes[RIGHTMOST_POINTER_OFFSET],
                bytes[RIGHTMOST_POINTER_OFFSET + 1],
                bytes[RIGHTMOST_POINTER_OFFSET + 2],
                bytes[RIGHTMOST_POINTER_OFFSET + 3],
            ]))
        } else {
            None
        };

        Ok(Self {
            page_type,
            free_block_start,
            num_cells,
            cell_content_start,
            reserved_free_bytes,
            rightmost_pointer,
        })
    }

    pub fn size(&self) -> usize {
        self.page_type.header_size()
    }
}

/// One row's on-page storage unit from a leaf table page.
#[derive(Debug, Clone)]
pub struct Cell {
    pub row_id: i64,
    /// The record payload, a view into the page buffer.
    pub payload: Bytes,
}

/// A decoded page: the full page buffer plus its parsed header.
///
/// Cell pointers are page-relative, so the buffer is kept whole; on page 1
/// the header is parsed past the 100-byte database header but offsets still
/// count from the start of the file's first byte.
#[derive(Debug, Clone)]
pub struct Page {
    data: Bytes,
    header: PageHeader,
    header_offset: usize,
}

impl Page {
    /// Parse a page from its full buffer. `page_number` is 1-indexed; page 1
    /// carries the database header in its first 100 bytes, which the page's
    /// own header follows.
    pub fn decode(data: Bytes, page_number: u32) -> Result<Self> {
        let header_offset = if page_number == 1 { DB_HEADER_SIZE } else { 0 };
        let header = PageHeader::decode(&data[header_offset.min(data.len())..])?;

        let content_start = header.cell_content_start as usize;
        if content_start < header_offset + header.size() || content_start > data.len() {
            return Err(DbError::Format(format!(
                "cell content start {content_start} outside [{}, {}]",
                header_offset + header.size(),
                data.len()
            )));
        }

        Ok(Self {
            data,
            header,
            header_offset,
        })
    }

    pub fn header(&self) -> &PageHeader {
        &self.header
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Page-relative byte offset of each cell, in directory order. Directory
    /// order is the row presentation order for single-leaf scans.
    pub fn cell_pointers(&self) -> Result<Vec<usize>> {
        let num_cells = self.header.num_cells as usize;
        let array_start = self.header_offset + self.header.size();
        let array_len = num_cells * CELL_POINTER_SIZE;

        if array_start + array_len > self.data.len() {
            return Err(DbError::Bounds {
                offset: array_start,
                needed: array_len,
                available: self.data.len().saturating_sub(array_start),
            });
        }

        Ok((0..num_cells)
            .map(|i| {
                let pos = array_start + i * CELL_POINTER_SIZE;
                read_u16(&self.data, pos) as usize
            })
            .collect())
    }

    /// Decode every cell of a leaf table page, in directory order.
    ///
    /// A declared payload length reaching past the page buffer would mean
    /// the payload spills onto overflow pages, which this decoder does not
    /// chain; that case fails rather than truncating.
    pub fn leaf_cells(&self) -> Result<Vec<Cell>> {
        if self.header.page_type != PageType::LeafTable {
            return Err(DbError::NotSupported(format!(
                "cell decoding on a {:?} page; only leaf table pages are readable",
                self.header.page_type
            )));
        }

        let mut cells = Vec::with_capacity(self.header.num_cells as usize);
        for pointer in self.cell_pointers()? {
            let (payload_length, consumed) = read_varint(&self.data, pointer)?;
            let mut pos = pointer + consumed;
            let (row_id, consumed) = read_varint(&self.data, pos)?;
            pos += consumed;

            let payload_length = usize::try_from(payload_length).map_err(|_| {
                DbError::Format(format!("negative cell payload length: {payload_length}"))
            })?;
            if pos + payload_length > self.data.len() {
                return Err(DbError::NotSupported(format!(
                    "cell payload of {payload_length} bytes at offset {pos} reaches past \
                     the page; overflow pages are not chained"
                )));
            }

            cells.push(Cell {
                row_id,
                payload: self.data.slice(pos..pos + payload_length),
            });
        }

        Ok(cells)
    }
}

fn read_u16(bytes: &[u8], pos: usize) -> u16 {
    u16::from_be_bytes([bytes[pos], bytes[pos + 1]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_table_header() {
        let bytes = [13, 0, 0, 0, 2, 0x0F, 0x00, 0];
        let header = PageHeader::decode(&bytes).unwrap();
        assert_eq!(header.page_type, PageType::LeafTable);
        assert_eq!(header.size(), 8);
        assert_eq!(header.num_cells, 2);
        assert_eq!(header.cell_content_start, 0x0F00);
        assert_eq!(header.rightmost_pointer, None);
    }

    #[test]
    fn interior_table_header_has_rightmost_pointer() {
        let bytes = [5, 0, 0, 0, 1, 0x10, 0x00, 0, 0, 0, 0, 7];
        let header = PageHeader::decode(&bytes).unwrap();
        assert_eq!(header.page_type, PageType::InteriorTable);
        assert_eq!(header.size(), 12);
        assert_eq!(header.rightmost_pointer, Some(7));
    }

    #[test]
    fn rejects_unknown_page_type() {
        let bytes = [7, 0, 0, 0, 0, 0, 0, 0];
        assert!(matches!(
            PageHeader::decode(&bytes),
            Err(DbError::Format(_))
        ));
    }

    #[test]
    fn interior_header_needs_twelve_bytes() {
        let bytes = [2, 0, 0, 0, 0, 0, 0, 0];
        assert!(matches!(
            PageHeader::decode(&bytes),
            Err(DbError::Bounds { needed: 12, .. })
        ));
    }

    #[test]
    fn content_start_zero_means_65536() {
        let bytes = [13, 0, 0, 0, 0, 0, 0, 0];
        let header = PageHeader::decode(&bytes).unwrap();
        assert_eq!(header.cell_content_start, 65536);
    }

    /// Build a leaf table page with one cell holding the given payload.
    fn leaf_page_with_cell(page_size: usize, payload: &[u8]) -> Bytes {
        let mut page = vec![0u8; page_size];
        let cell = {
            let mut c = vec![payload.len() as u8, 1]; // payload len + rowid varints
            c.extend_from_slice(payload);
            c
        };
        let cell_offset = page_size - cell.len();
        page[cell_offset..].copy_from_slice(&cell);
        page[0] = 13;
        page[3..5].copy_from_slice(&1u16.to_be_bytes());
        page[5..7].copy_from_slice(&(cell_offset as u16).to_be_bytes());
        page[8..10].copy_from_slice(&(cell_offset as u16).to_be_bytes());
        Bytes::from(page)
    }

    #[test]
    fn leaf_cells_yield_rowid_and_payload() {
        let page = Page::decode(leaf_page_with_cell(512, &[0xAA, 0xBB]), 2).unwrap();
        let cells = page.leaf_cells().unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].row_id, 1);
        assert_eq!(&cells[0].payload[..], &[0xAA, 0xBB]);
    }

    #[test]
    fn oversized_payload_is_not_supported() {
        let mut page = vec![0u8; 64];
        page[0] = 13;
        page[3..5].copy_from_slice(&1u16.to_be_bytes());
        page[5..7].copy_from_slice(&60u16.to_be_bytes());
        page[8..10].copy_from_slice(&60u16.to_be_bytes());
        // declares 100 payload bytes with only 2 remaining on the page
        page[60] = 100;
        page[61] = 1;
        let page = Page::decode(Bytes::from(page), 2).unwrap();
        assert!(matches!(
            page.leaf_cells(),
            Err(DbError::NotSupported(_))
        ));
    }

    #[test]
    fn cell_decoding_requires_leaf_table() {
        let mut page = vec![0u8; 64];
        page[0] = 5; // interior table
        page[5..7].copy_from_slice(&32u16.to_be_bytes());
        let page = Page::decode(Bytes::from(page), 2).unwrap();
        assert!(matches!(
            page.leaf_cells(),
            Err(DbError::NotSupported(_))
        ));
    }

    #[test]
    fn content_start_inside_header_is_rejected() {
        let mut page = vec![0u8; 64];
        page[0] = 13;
        page[5..7].copy_from_slice(&4u16.to_be_bytes());
        assert!(matches!(
            Page::decode(Bytes::from(page), 2),
            Err(DbError::Format(_))
        ));
    }
}
