//! Observability hooks for cell stores.
//!
//! A store reports every completed operation to an injected [`StoreObserver`].
//! Observers cannot fail and cannot change the outcome of the call they observe.
//!
//! [`TracingObserver`] is the default. It emits `tracing` events, and when the
//! `observe` feature is enabled it also records counters and histograms via the
//! [`metrics`] crate. A downstream application must install a metrics recorder
//! to collect them. Without the feature the metrics calls are zero-cost no-ops.

use crate::error::CellarError;
use crate::types::CellKey;
use std::fmt;
use std::time::Duration;

/// Store operation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Open,
    PutCell,
    PutCells,
    GetCell,
    GetCellLatest,
    PartitionRead,
    Head,
    SchemaVersion,
    ResetConnection,
    Destroy,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Open => "open",
            Operation::PutCell => "put_cell",
            Operation::PutCells => "put_cells",
            Operation::GetCell => "get_cell",
            Operation::GetCellLatest => "get_cell_latest",
            Operation::PartitionRead => "partition_read",
            Operation::Head => "head",
            Operation::SchemaVersion => "schema_version",
            Operation::ResetConnection => "reset_connection",
            Operation::Destroy => "destroy",
        }
    }

    /// Whether the operation returns cells to the caller
    pub fn is_read(&self) -> bool {
        matches!(
            self,
            Operation::GetCell | Operation::GetCellLatest | Operation::PartitionRead
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a store reports after each operation
#[derive(Debug)]
pub struct OperationRecord<'a> {
    pub operation: Operation,

    /// Cell addressed by the call, when it addresses one.
    /// Latest lookups carry `ref_key = i64::MAX`.
    pub key: Option<&'a CellKey>,

    /// Cells written or returned
    pub rows: usize,

    pub duration: Duration,

    pub error: Option<&'a CellarError>,
}

impl<'a> OperationRecord<'a> {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Receives operation records from a store
pub trait StoreObserver: Send + Sync {
    fn on_operation(&self, record: &OperationRecord<'_>);

    /// Flush buffered state. Called by `destroy` before it returns.
    fn flush(&self) {}
}

/// Discards every record
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl StoreObserver for NoopObserver {
    fn on_operation(&self, _record: &OperationRecord<'_>) {}
}

/// Reports operations through `tracing` (and `metrics` with the `observe` feature)
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl StoreObserver for TracingObserver {
    fn on_operation(&self, record: &OperationRecord<'_>) {
        let op = record.operation.as_str();
        let key = record.key.map(|k| k.to_string()).unwrap_or_default();
        let elapsed_us = record.duration.as_micros() as u64;

        match record.error {
            None => {
                tracing::debug!(op, key = %key, rows = record.rows, elapsed_us, "cell store op");
            }
            Some(err) if err.is_constraint_violation() || err.is_cancelled() => {
                tracing::warn!(op, key = %key, elapsed_us, error = %err, "cell store op rejected");
            }
            Some(err) => {
                tracing::error!(op, key = %key, elapsed_us, error = %err, "cell store op failed");
            }
        }

        record_operation(record.operation, record.duration, record.rows, record.succeeded());
    }

    fn flush(&self) {
        tracing::debug!("cell store observer flushed");
    }
}

/// Record one operation (counter + latency histogram + rows counter).
///
/// - `cellar.operations_total` – counter with `op` and `outcome` labels
/// - `cellar.operation_duration_seconds` – histogram with `op` label
/// - `cellar.rows_returned_total` – counter with `op` label, read operations only
#[inline]
pub fn record_operation(operation: Operation, duration: Duration, rows: usize, success: bool) {
    #[cfg(feature = "observe")]
    {
        let op = operation.as_str();
        let outcome = if success { "ok" } else { "fail" };
        metrics::counter!("cellar.operations_total", "op" => op, "outcome" => outcome).increment(1);
        metrics::histogram!("cellar.operation_duration_seconds", "op" => op)
            .record(duration.as_secs_f64());
        if operation.is_read() {
            metrics::counter!("cellar.rows_returned_total", "op" => op).increment(rows as u64);
        }
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = (operation, duration, rows, success);
    }
}
