//! Mapping from SQLite failures to the store's error taxonomy.

use cellar_core::error::CellarError;
use cellar_core::{CellKey, OpContext};
use rusqlite::{ffi, ErrorCode};

/// Map a failure of any statement.
///
/// An interrupted statement, or a lock wait cut short once the caller's context
/// expired, is reported as `Cancelled`.
pub(crate) fn storage_err(ctx: &OpContext, e: rusqlite::Error) -> CellarError {
    match e.sqlite_error_code() {
        Some(ErrorCode::OperationInterrupted) => ctx.interrupted_error(),
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) if ctx.should_interrupt() => {
            ctx.interrupted_error()
        }
        _ => CellarError::StorageUnavailable(e.to_string()),
    }
}

/// Map a failure of an insert of `key`.
pub(crate) fn insert_err(ctx: &OpContext, key: &CellKey, e: rusqlite::Error) -> CellarError {
    if is_unique_violation(&e) {
        key.duplicate()
    } else {
        storage_err(ctx, e)
    }
}

pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
    match e {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.code == ErrorCode::ConstraintViolation
                && (failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                    || failure.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
        }
        _ => false,
    }
}

pub(crate) fn closed_err() -> CellarError {
    CellarError::StorageUnavailable("store has been destroyed".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(ffi::Error::new(code), None)
    }

    #[test]
    fn test_unique_violation_maps_to_constraint() {
        let key = CellKey::new("r", "c", 1);
        let err = insert_err(
            &OpContext::background(),
            &key,
            failure(ffi::SQLITE_CONSTRAINT_UNIQUE),
        );
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_other_constraints_are_storage_errors() {
        let key = CellKey::new("r", "c", 1);
        let err = insert_err(
            &OpContext::background(),
            &key,
            failure(ffi::SQLITE_CONSTRAINT_NOTNULL),
        );
        assert!(!err.is_constraint_violation());
        assert!(err.is_storage_unavailable());
    }

    #[test]
    fn test_interrupt_maps_to_cancelled() {
        let err = storage_err(&OpContext::background(), failure(ffi::SQLITE_INTERRUPT));
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_busy_is_cancelled_only_when_context_expired() {
        let live = storage_err(&OpContext::background(), failure(ffi::SQLITE_BUSY));
        assert!(!live.is_cancelled());
        assert!(live.is_storage_unavailable());

        let expired = OpContext::background().with_deadline(std::time::Instant::now());
        assert!(storage_err(&expired, failure(ffi::SQLITE_BUSY)).is_cancelled());
    }
}
