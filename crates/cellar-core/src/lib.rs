//! Cellar Core: types and traits for an append-only versioned cell store
//!
//! A cell is one immutable fact `(row_key, column_name, ref_key) -> body`.
//! This crate defines:
//! - The cell data model and the cursor used to scan it
//! - The [`CellStore`] contract every backend implements
//! - The error taxonomy, configuration, cancellation context and observer hooks
//!
//! Key guarantees a backend must uphold:
//! - The triple `(row_key, column_name, ref_key)` is unique; writes never overwrite
//! - `added_at` is a store-wide, strictly increasing sequence that is never reused
//! - "Latest" means greatest `ref_key`, regardless of insertion order

pub mod config;
pub mod context;
pub mod error;
pub mod observe;
pub mod scanner;
pub mod traits;
pub mod types;

pub use config::{Location, ReadPoolConfig, StoreConfig, SynchronousMode};
pub use context::{CancelToken, OpContext};
pub use error::{CellarError, Result};
pub use observe::{NoopObserver, Operation, OperationRecord, StoreObserver, TracingObserver};
pub use scanner::PartitionScanner;
pub use traits::CellStore;
pub use types::{Body, Cell, CellKey, Cursor, CursorDimension, NewCell, Sequence};
