use crate::config::StoreConfig;
use crate::context::OpContext;
use crate::error::{CellarError, Result};
use crate::types::{Cell, Cursor, NewCell, Sequence};

/// Append-only store of versioned cells
///
/// Provides:
/// - Exactly-once writes per (row_key, column_name, ref_key)
/// - Point and latest-version reads
/// - Cursor-based partition scans for replication and backfill
///
/// Implementations must be safe to share between threads. Uniqueness of the
/// triple is enforced by the backend, so concurrent writers racing on the same
/// triple see exactly one success.
pub trait CellStore: Send + Sync {
    /// Open a store, creating its schema if needed.
    ///
    /// Never returns a store whose uniqueness constraint is missing.
    fn open(cfg: StoreConfig) -> Result<Self>
    where
        Self: Sized;

    /// Append one cell and return its assigned `added_at`.
    ///
    /// Fails with `ConstraintViolation` if the triple already exists; the
    /// existing cell is left untouched.
    fn put_cell(
        &self,
        ctx: &OpContext,
        row_key: &str,
        column_name: &str,
        ref_key: i64,
        body: &[u8],
    ) -> Result<Sequence>;

    /// Append a batch atomically: all cells are written or none are.
    fn put_cells(&self, ctx: &OpContext, cells: &[NewCell<'_>]) -> Result<Vec<Sequence>>;

    /// The cell with exactly this triple
    fn get_cell(
        &self,
        ctx: &OpContext,
        row_key: &str,
        column_name: &str,
        ref_key: i64,
    ) -> Result<Option<Cell>>;

    /// The cell with the greatest `ref_key` for this (row_key, column_name).
    ///
    /// This is the highest version, not the most recently inserted one.
    fn get_cell_latest(
        &self,
        ctx: &OpContext,
        row_key: &str,
        column_name: &str,
    ) -> Result<Option<Cell>>;

    /// Up to `limit` cells strictly after `cursor`, ascending along its dimension.
    ///
    /// An empty result means the caller has caught up with the head.
    fn partition_read(&self, ctx: &OpContext, cursor: Cursor, limit: usize) -> Result<Vec<Cell>>;

    /// [`CellStore::partition_read`] with a textual dimension and cursor value.
    ///
    /// Both are validated before any storage access.
    fn partition_read_named(
        &self,
        ctx: &OpContext,
        dimension: &str,
        value: &str,
        limit: usize,
    ) -> Result<Vec<Cell>> {
        let cursor = Cursor::parse(dimension, value)?;
        self.partition_read(ctx, cursor, limit)
    }

    /// Greatest `added_at` stored, `None` for an empty store
    fn head(&self, ctx: &OpContext) -> Result<Option<Sequence>>;

    fn schema_version(&self, ctx: &OpContext) -> Result<u32>;

    /// Reset the connection. Never drops data.
    fn reset_connection(&self, ctx: &OpContext) -> Result<()>;

    /// Close the underlying handle. In-memory stores lose their data.
    ///
    /// Every later call on this handle fails. Handles are released even when
    /// `ctx` is already cancelled or past its deadline.
    fn destroy(&self, ctx: &OpContext) -> Result<()>;
}

/// Reject a scan limit the backend cannot honour.
pub fn validate_limit(limit: usize) -> Result<i64> {
    if limit == 0 {
        return Err(CellarError::InvalidArgument(
            "partition read limit must be at least 1".into(),
        ));
    }
    i64::try_from(limit)
        .map_err(|_| CellarError::InvalidArgument(format!("partition read limit {} too large", limit)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_limit() {
        assert_eq!(validate_limit(1).unwrap(), 1);
        assert_eq!(validate_limit(500).unwrap(), 500);
        assert!(validate_limit(0).unwrap_err().is_invalid_argument());
    }
}
