//! Database bootstrap command: `tackboard init`.

use std::path::PathBuf;

use anyhow::Result;

use tackboard::board::server::open_database;
use tackboard::config::BoardConfig;

pub fn cmd_init(config: &BoardConfig, db_path: Option<PathBuf>) -> Result<()> {
    let db_path = db_path.unwrap_or_else(|| config.database.path.clone());
    let db = open_database(&db_path)?;

    let board = db.get_board()?;
    let columns = db.list_columns()?;
    println!("Board database initialized at {}", db_path.display());
    println!(
        "  \"{}\" with {} columns: {}",
        board.name,
        columns.len(),
        columns
            .iter()
            .map(|c| c.title.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}
