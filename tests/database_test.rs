//! End-to-end decoding of a hand-built two-page database image: a schema
//! page describing one table, and the leaf page holding that table's rows.

use litescan::db::{Database, DbError, PageType, TextEncoding};
use std::io::Cursor;

const PAGE_SIZE: usize = 512;
const CREATE_SQL: &str = "CREATE TABLE fruits(id integer, name text)";

fn encode_varint(mut value: u64) -> Vec<u8> {
    let mut groups = vec![(value & 0x7F) as u8];
    value >>= 7;
    while value != 0 {
        groups.push(0x80 | (value & 0x7F) as u8);
        value >>= 7;
    }
    groups.reverse();
    groups
}

fn text_code(s: &str) -> u64 {
    13 + 2 * s.len() as u64
}

/// Record payload: serial-type header (inclusive of its own length varint)
/// followed by packed column content.
fn build_record(columns: &[(u64, Vec<u8>)]) -> Vec<u8> {
    let type_varints: Vec<Vec<u8>> = columns.iter().map(|(c, _)| encode_varint(*c)).collect();
    let types_len: usize = type_varints.iter().map(Vec::len).sum();
    // the header length varint counts itself; one byte is enough here
    let header_len = types_len + 1;
    assert!(header_len < 0x80);

    let mut payload = vec![header_len as u8];
    for v in &type_varints {
        payload.extend_from_slice(v);
    }
    for (_, content) in columns {
        payload.extend_from_slice(content);
    }
    payload
}

/// A leaf table page with the given record payloads, cells packed at the
/// tail and the pointer directory in matching order.
fn build_leaf_page(payloads: &[Vec<u8>], first_page: bool) -> Vec<u8> {
    let header_offset = if first_page { 100 } else { 0 };
    let mut page = vec![0u8; PAGE_SIZE];

    let mut cell_end = PAGE_SIZE;
    let mut pointers = Vec::new();
    for (i, payload) in payloads.iter().enumerate() {
        let mut cell = encode_varint(payload.len() as u64);
        cell.extend_from_slice(&encode_varint(i as u64 + 1));
        cell.extend_from_slice(payload);
        let cell_start = cell_end - cell.len();
        page[cell_start..cell_end].copy_from_slice(&cell);
        pointers.push(cell_start as u16);
        cell_end = cell_start;
    }

    page[header_offset] = 13;
    page[header_offset + 3..header_offset + 5]
        .copy_from_slice(&(payloads.len() as u16).to_be_bytes());
    page[header_offset + 5..header_offset + 7].copy_from_slice(&(cell_end as u16).to_be_bytes());
    for (i, pointer) in pointers.iter().enumerate() {
        let pos = header_offset + 8 + i * 2;
        page[pos..pos + 2].copy_from_slice(&pointer.to_be_bytes());
    }
    page
}

fn build_database() -> Vec<u8> {
    let schema_row = build_record(&[
        (text_code("table"), b"table".to_vec()),
        (text_code("fruits"), b"fruits".to_vec()),
        (text_code("fruits"), b"fruits".to_vec()),
        (1, vec![2]), // root page 2 as an 8-bit integer
        (text_code(CREATE_SQL), CREATE_SQL.as_bytes().to_vec()),
    ]);
    let mut page1 = build_leaf_page(&[schema_row], true);

    // database header over the first 100 bytes of page 1
    page1[..16].copy_from_slice(b"SQLite format 3\0");
    page1[16..18].copy_from_slice(&(PAGE_SIZE as u16).to_be_bytes());
    page1[21] = 64;
    page1[22] = 32;
    page1[23] = 32;
    page1[28..32].copy_from_slice(&2u32.to_be_bytes()); // two pages
    page1[44..48].copy_from_slice(&4u32.to_be_bytes());
    page1[56..60].copy_from_slice(&1u32.to_be_bytes()); // UTF-8

    let rows: Vec<Vec<u8>> = [(1u8, "apple"), (2, "pear"), (3, "plum")]
        .iter()
        .map(|(id, name)| {
            build_record(&[
                (1, vec![*id]),
                (text_code(name), name.as_bytes().to_vec()),
            ])
        })
        .collect();
    let page2 = build_leaf_page(&rows, false);

    let mut file = page1;
    file.extend_from_slice(&page2);
    file
}

#[test]
fn open_exposes_header_and_catalog() {
    let db = Database::from_reader(Cursor::new(build_database())).unwrap();
    assert_eq!(db.page_size(), PAGE_SIZE as u32);
    assert_eq!(db.text_encoding(), TextEncoding::Utf8);

    assert_eq!(db.schema().len(), 1);
    let entry = db.schema().get("fruits").unwrap();
    assert_eq!(entry.entry_type, "table");
    assert_eq!(entry.table_name, "fruits");
    assert_eq!(entry.root_page, 2);
    assert_eq!(entry.sql.as_deref(), Some(CREATE_SQL));
}

#[test]
fn scans_rows_with_typed_columns() {
    let mut db = Database::from_reader(Cursor::new(build_database())).unwrap();
    let root = db.schema().get("fruits").unwrap().root_page;

    let rows = db.scan_rows(root).unwrap();
    assert_eq!(rows.len(), 3);

    let names: Vec<String> = rows
        .iter()
        .map(|r| r.column(1).unwrap().as_text(TextEncoding::Utf8).unwrap())
        .collect();
    assert_eq!(names, vec!["apple", "pear", "plum"]);
    assert_eq!(rows[0].column(0).unwrap().as_integer().unwrap(), 1);
    assert_eq!(rows[2].column(0).unwrap().as_integer().unwrap(), 3);
}

#[test]
fn reopening_yields_identical_catalog_order() {
    let image = build_database();
    let first = Database::from_reader(Cursor::new(image.clone())).unwrap();
    let second = Database::from_reader(Cursor::new(image)).unwrap();

    let names = |db: &Database<Cursor<Vec<u8>>>| -> Vec<String> {
        db.schema()
            .entries()
            .iter()
            .map(|e| e.name.clone())
            .collect()
    };
    assert_eq!(names(&first), names(&second));
}

#[test]
fn read_page_checks_range_and_decodes_header() {
    let mut db = Database::from_reader(Cursor::new(build_database())).unwrap();
    let page = db.read_page(2).unwrap();
    assert_eq!(page.header().page_type, PageType::LeafTable);
    assert_eq!(page.header().num_cells, 3);

    assert!(matches!(db.read_page(0), Err(DbError::Format(_))));
    assert!(matches!(db.read_page(3), Err(DbError::Format(_))));
}

#[test]
fn corrupt_fraction_byte_fails_open() {
    let mut image = build_database();
    image[22] = 33;
    assert!(matches!(
        Database::from_reader(Cursor::new(image)),
        Err(DbError::Format(_))
    ));
}
