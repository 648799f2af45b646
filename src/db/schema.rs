//! The schema catalog decoded from page 1.

use crate::db::error::{DbError, Result};
use crate::db::header::TextEncoding;
use crate::db::page::{Page, PageType, Record};

/// Column positions in a schema table row.
const TYPE_COLUMN: usize = 0;
const NAME_COLUMN: usize = 1;
const TABLE_NAME_COLUMN: usize = 2;
const ROOT_PAGE_COLUMN: usize = 3;
const SQL_COLUMN: usize = 4;
const SCHEMA_COLUMNS: usize = 5;

/// One row of the schema table: a table, index, view, or trigger and the
/// root page holding its content.
#[derive(Debug, Clone)]
pub struct SchemaEntry {
    /// "table", "index", "view", or "trigger".
    pub entry_type: String,
    pub name: String,
    /// For indexes, the table the index belongs to; for tables, the name
    /// again.
    pub table_name: String,
    pub root_page: u32,
    /// The CREATE statement. Internal auto-index rows store null here.
    pub sql: Option<String>,
}

impl SchemaEntry {
    /// Map a record's first five columns positionally onto a schema entry.
    fn from_record(record: &Record, encoding: TextEncoding) -> Result<Self> {
        if record.len() < SCHEMA_COLUMNS {
            return Err(DbError::Schema(format!(
                "expected {SCHEMA_COLUMNS} columns, found {}",
                record.len()
            )));
        }

        let text_column = |index: usize, what: &str| -> Result<String> {
            record.columns()[index]
                .as_text(encoding)
                .map_err(|e| DbError::Schema(format!("{what} column: {e}")))
        };

        let entry_type = text_column(TYPE_COLUMN, "type")?;
        let name = text_column(NAME_COLUMN, "name")?;
        let table_name = text_column(TABLE_NAME_COLUMN, "table name")?;

        let root_page = record.columns()[ROOT_PAGE_COLUMN]
            .as_integer()
            .map_err(|e| DbError::Schema(format!("root page column: {e}")))?;
        let root_page = u32::try_from(root_page)
            .ok()
            .filter(|&p| p > 0)
            .ok_or_else(|| DbError::Schema(format!("root page {root_page} out of range")))?;

        let sql_column = &record.columns()[SQL_COLUMN];
        let sql = if sql_column.is_null() {
            None
        } else {
            Some(text_column(SQL_COLUMN, "sql")?)
        };

        Ok(Self {
            entry_type,
            name,
            table_name,
            root_page,
            sql,
        })
    }

    /// A user-visible table, as opposed to indexes, views, and the
    /// `sqlite_` internal bookkeeping tables.
    pub fn is_user_table(&self) -> bool {
        self.entry_type == "table" && !self.name.starts_with("sqlite_")
    }
}

/// The decoded contents of page 1: every schema row in page order, plus an
/// exact-name lookup. Computed once when the database is opened and
/// immutable afterwards.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    entries: Vec<SchemaEntry>,
}

impl SchemaCatalog {
    /// Decode every cell of the schema page. Page 1 must be a leaf table
    /// page; one malformed row fails the whole catalog, since silently
    /// dropping a table would be worse than stopping.
    pub fn from_page(page: &Page, encoding: TextEncoding) -> Result<Self> {
        if page.header().page_type != PageType::LeafTable {
            return Err(DbError::Format(format!(
                "schema page must be a leaf table page, got {:?}",
                page.header().page_type
            )));
        }

        let mut entries = Vec::with_capacity(page.header().num_cells as usize);
        for cell in page.leaf_cells()? {
            let record = Record::decode(&cell.payload)?;
            entries.push(SchemaEntry::from_record(&record, encoding)?);
        }

        Ok(Self { entries })
    }

    /// All entries, page order preserved, duplicates included.
    pub fn entries(&self) -> &[SchemaEntry] {
        &self.entries
    }

    /// Exact-name lookup; first match in page order wins.
    pub fn get(&self, name: &str) -> Option<&SchemaEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of user tables, page order.
    pub fn user_table_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.is_user_table())
            .map(|e| e.name.as_str())
            .collect()
    }
}
