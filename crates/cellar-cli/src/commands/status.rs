//! Status command implementation

use anyhow::{Context, Result};
use cellar::prelude::*;

pub fn execute(location: &str) -> Result<()> {
    tracing::info!("Checking store status: {}", location);

    let store = super::open(location)?;
    let ctx = OpContext::background();

    println!("\nCell Store Status");
    println!("{}", "=".repeat(60));
    match store.config().location.path() {
        Some(path) => println!("Path: {}", path.display()),
        None => println!("Path: (in memory)"),
    }

    let schema_version = store
        .schema_version(&ctx)
        .context("Failed to get schema version")?;
    println!("Schema Version: {}", schema_version);

    let head = store.head(&ctx).context("Failed to get head sequence")?;
    match head {
        Some(head) => println!("Head added_at: {}", head),
        None => println!("Head added_at: (empty store)"),
    }
    println!("Read Pool: {}", if store.has_read_pool() { "enabled" } else { "disabled" });

    store.destroy(&ctx).context("Failed to close store")?;
    Ok(())
}
