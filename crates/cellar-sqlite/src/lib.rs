//! SQLite-backed cell store implementation
//!
//! Stores every cell version as an immutable row in a single `cell` table.
//!
//! Key features:
//! - Unique index over (row_key, column_name, ref_key), verified on open
//! - `AUTOINCREMENT` insertion sequence that is never reused
//! - WAL mode with a pool of read-only connections for concurrent reads
//! - Per-call cancellation and deadlines via a statement progress hook

mod errors;
mod interrupt;
pub mod read_pool;
mod rows;
pub mod schema;
pub mod store;

pub use read_pool::{PooledSqliteConnection, SqliteReadPool};
pub use store::SqliteCellStore;
