use anyhow::{Context, Result, bail};
use litescan::db::Database;

pub fn dbinfo(path: &str) -> Result<()> {
    let db = Database::open(path).context("Failed to open database")?;
    let table_count = db
        .schema()
        .entries()
        .iter()
        .filter(|e| e.entry_type == "table")
        .count();
    println!("database page size: {}", db.page_size());
    println!("number of tables: {}", table_count);
    Ok(())
}

pub fn tables(path: &str) -> Result<()> {
    let db = Database::open(path).context("Failed to open database")?;
    println!("{}", db.schema().user_table_names().join(" "));
    Ok(())
}

pub fn count_rows(path: &str, sql: &str) -> Result<()> {
    let table = parse_count_statement(sql)?;
    let mut db = Database::open(path).context("Failed to open database")?;
    let root_page = db
        .schema()
        .get(&table)
        .filter(|e| e.entry_type == "table")
        .map(|e| e.root_page)
        .with_context(|| format!("Table '{}' not found", table))?;
    let rows = db
        .scan_rows(root_page)
        .with_context(|| format!("Failed to scan table '{}'", table))?;
    println!("{}", rows.len());
    Ok(())
}

/// Accept exactly the literal shape `SELECT COUNT(*) FROM <table>`,
/// keywords case-insensitive. Anything else is not interpreted.
fn parse_count_statement(sql: &str) -> Result<String> {
    let tokens: Vec<&str> = sql.split_whitespace().collect();
    match tokens.as_slice() {
        [select, count, from, table]
            if select.eq_ignore_ascii_case("SELECT")
                && count.eq_ignore_ascii_case("COUNT(*)")
                && from.eq_ignore_ascii_case("FROM") =>
        {
            Ok(table.trim_end_matches(';').to_string())
        }
        _ => bail!("Only 'SELECT COUNT(*) FROM <table>' is supported, got: {sql}"),
    }
}
