//! Cellar Prelude
//!
//! ```
//! use cellar::prelude::*;
//! ```

pub use crate::{
    CancelToken, Cell, CellKey, CellStore, CellarError, Cursor, CursorDimension, NewCell,
    OpContext, PartitionScanner, Result, Sequence, SqliteCellStore, StoreConfig,
};

pub use crate::{Location, ReadPoolConfig, SynchronousMode};

pub use crate::{NoopObserver, Operation, OperationRecord, StoreObserver, TracingObserver};
