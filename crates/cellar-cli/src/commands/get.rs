//! Get and latest command implementation

use anyhow::{Context, Result};
use cellar::prelude::*;

/// Print one cell; the exact version when `ref_key` is given, else the latest
///
/// Returns the process exit code: 0 when found, 1 when absent.
pub fn execute(location: &str, row_key: &str, column_name: &str, ref_key: Option<i64>) -> Result<u8> {
    let store = super::open(location)?;
    let ctx = OpContext::background();

    let cell = match ref_key {
        Some(ref_key) => store
            .get_cell(&ctx, row_key, column_name, ref_key)
            .context("Failed to read cell")?,
        None => store
            .get_cell_latest(&ctx, row_key, column_name)
            .context("Failed to read latest cell")?,
    };

    let printed = match cell {
        Some(cell) => super::print_cell(&cell).map(|()| 0),
        None => {
            tracing::info!("No cell found for {}/{}", row_key, column_name);
            Ok(1)
        }
    };

    store.destroy(&ctx).context("Failed to close store")?;
    printed
}
