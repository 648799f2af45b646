use anyhow::{Result, bail};

mod commands;

fn main() -> Result<()> {
    // Parse arguments
    let args = std::env::args().collect::<Vec<_>>();
    match args.len() {
        0 | 1 => bail!("Missing <database path> and <command>"),
        2 => bail!("Missing <command>"),
        _ => {}
    }

    // Parse command and act accordingly
    let command = &args[2];
    match command.as_str() {
        ".dbinfo" => commands::dbinfo(&args[1])?,
        ".tables" => commands::tables(&args[1])?,
        sql if sql.to_uppercase().starts_with("SELECT") => commands::count_rows(&args[1], sql)?,
        _ => bail!("Missing or invalid command passed: {}", command),
    }

    Ok(())
}
