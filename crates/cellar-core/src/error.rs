use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CellarError {
    /// A write reused an existing (row_key, column_name, ref_key) triple.
    #[error("Cell already exists: row_key={row_key} column_name={column_name} ref_key={ref_key}")]
    ConstraintViolation {
        row_key: String,
        column_name: String,
        ref_key: i64,
    },

    /// A lookup that must match at most one row matched several.
    ///
    /// Only reachable when the uniqueness guarantee has been bypassed underneath
    /// the store, so callers should treat it as fatal.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The caller's context was cancelled or its deadline passed.
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl CellarError {
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, CellarError::ConstraintViolation { .. })
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, CellarError::InvariantViolation(_))
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, CellarError::InvalidArgument(_))
    }

    /// Failures of the underlying handle, including cancellation and timeouts.
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(
            self,
            CellarError::StorageUnavailable(_) | CellarError::Cancelled(_) | CellarError::Io(_)
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, CellarError::Cancelled(_))
    }
}

pub type Result<T> = std::result::Result<T, CellarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let dup = CellarError::ConstraintViolation {
            row_key: "r".into(),
            column_name: "c".into(),
            ref_key: 1,
        };
        assert!(dup.is_constraint_violation());
        assert!(!dup.is_storage_unavailable());

        let cancelled = CellarError::Cancelled("deadline exceeded".into());
        assert!(cancelled.is_cancelled());
        assert!(cancelled.is_storage_unavailable());

        let io = CellarError::from(io::Error::new(io::ErrorKind::Other, "disk"));
        assert!(io.is_storage_unavailable());

        assert!(CellarError::InvariantViolation("x".into()).is_invariant_violation());
        assert!(CellarError::InvalidArgument("x".into()).is_invalid_argument());
    }

    #[test]
    fn test_display_names_the_triple() {
        let dup = CellarError::ConstraintViolation {
            row_key: "user-1".into(),
            column_name: "email".into(),
            ref_key: 7,
        };
        let msg = dup.to_string();
        assert!(msg.contains("user-1"));
        assert!(msg.contains("email"));
        assert!(msg.contains("ref_key=7"));
    }
}
