pub mod get;
pub mod put;
pub mod scan;
pub mod status;

use anyhow::{Context, Result};
use cellar::prelude::*;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// JSON line printed for each cell
#[derive(Serialize)]
struct CellView<'a> {
    added_at: Sequence,
    row_key: &'a str,
    column_name: &'a str,
    ref_key: i64,
    body: String,
    created_at: DateTime<Utc>,
}

pub(crate) fn print_cell(cell: &Cell) -> Result<()> {
    let view = CellView {
        added_at: cell.added_at,
        row_key: &cell.row_key,
        column_name: &cell.column_name,
        ref_key: cell.ref_key,
        body: String::from_utf8_lossy(&cell.body).into_owned(),
        created_at: cell.created_at,
    };
    let line = serde_json::to_string(&view).context("Failed to encode cell")?;
    println!("{}", line);
    Ok(())
}

pub(crate) fn open(location: &str) -> Result<SqliteCellStore> {
    cellar::open(location).with_context(|| format!("Failed to open store at {}", location))
}
