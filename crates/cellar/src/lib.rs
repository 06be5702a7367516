//! Cellar: an append-only store of versioned cells
//!
//! Every write records an immutable fact `(row_key, column_name, ref_key) -> body`
//! and receives a store-wide insertion sequence (`added_at`). Nothing is ever
//! overwritten, so a higher layer can assemble rows from many independently
//! versioned cells and replicate them by draining the sequence.
//!
//! - **Point reads**: one exact version
//! - **Latest reads**: the highest `ref_key` for a (row, column)
//! - **Partition scans**: a resumable cursor over `added_at` or `created_at`
//!
//! # Quick Start
//!
//! ```no_run
//! use cellar::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let store = cellar::open("./data/shard-0")?;
//! let ctx = OpContext::background();
//!
//! store.put_cell(&ctx, "user-1", "email", 1, b"a@example.com")?;
//! store.put_cell(&ctx, "user-1", "email", 2, b"b@example.com")?;
//!
//! let latest = store.get_cell_latest(&ctx, "user-1", "email")?;
//! assert_eq!(latest.map(|c| c.ref_key), Some(2));
//!
//! let mut scanner = PartitionScanner::new(&store, Cursor::origin(CursorDimension::AddedAt), 100);
//! while let Some(page) = scanner.next_page(&ctx)? {
//!     for cell in page {
//!         println!("{} {}", cell.added_at, cell.key());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod prelude;

pub use cellar_core::{
    config::{Location, ReadPoolConfig, StoreConfig, SynchronousMode},
    context::{CancelToken, OpContext},
    error::{CellarError, Result},
    observe::{NoopObserver, Operation, OperationRecord, StoreObserver, TracingObserver},
    scanner::PartitionScanner,
    traits::CellStore,
    types::{Body, Cell, CellKey, Cursor, CursorDimension, NewCell, Sequence},
};

pub use cellar_sqlite::{schema::SCHEMA_VERSION, SqliteCellStore};

/// Open a store by location string.
///
/// `:memory:` opens an in-memory store; anything else opens the file
/// `<location>_cell.db`, creating it if needed.
pub fn open(location: &str) -> Result<SqliteCellStore> {
    tracing::debug!("Opening cell store at {}", location);
    SqliteCellStore::open(StoreConfig::for_location(location))
}

/// Open a store whose cells live only as long as the handle
pub fn open_in_memory() -> Result<SqliteCellStore> {
    SqliteCellStore::open(StoreConfig::in_memory())
}
