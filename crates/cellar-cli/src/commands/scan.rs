//! Scan command implementation

use anyhow::{Context, Result};
use cellar::prelude::*;

pub fn execute(location: &str, dimension: &str, after: &str, limit: usize, all: bool) -> Result<()> {
    let cursor = Cursor::parse(dimension, after).context("Invalid cursor")?;
    let store = super::open(location)?;
    let ctx = OpContext::background();

    let mut scanner = PartitionScanner::new(&store, cursor, limit);
    let mut printed = 0usize;
    while let Some(page) = scanner.next_page(&ctx).context("Partition read failed")? {
        for cell in &page {
            super::print_cell(cell)?;
        }
        printed += page.len();
        if !all {
            break;
        }
    }

    tracing::info!(
        "Printed {} cell(s); resume with --dimension {} --after {}",
        printed,
        scanner.cursor().dimension(),
        scanner.cursor().column_value()
    );

    store.destroy(&ctx).context("Failed to close store")?;
    Ok(())
}
