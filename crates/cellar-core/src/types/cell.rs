use crate::error::{CellarError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-wide insertion sequence number (`added_at`), strictly increasing
pub type Sequence = i64;

/// Opaque cell payload
pub type Body = Vec<u8>;

/// Maximum length of a row key in characters (UUID-sized)
pub const MAX_ROW_KEY_LEN: usize = 36;

/// Maximum length of a column name in characters
pub const MAX_COLUMN_NAME_LEN: usize = 64;

/// One immutable, versioned fact about an attribute of a row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Insertion sequence assigned by the store
    pub added_at: Sequence,

    pub row_key: String,

    pub column_name: String,

    /// Writer-supplied version of this (row_key, column_name)
    pub ref_key: i64,

    pub body: Body,

    /// Wall-clock time recorded at insertion
    pub created_at: DateTime<Utc>,
}

impl Cell {
    pub fn key(&self) -> CellKey {
        CellKey {
            row_key: self.row_key.clone(),
            column_name: self.column_name.clone(),
            ref_key: self.ref_key,
        }
    }
}

/// The unique identity of a cell version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellKey {
    pub row_key: String,
    pub column_name: String,
    pub ref_key: i64,
}

impl CellKey {
    pub fn new(row_key: impl Into<String>, column_name: impl Into<String>, ref_key: i64) -> Self {
        Self {
            row_key: row_key.into(),
            column_name: column_name.into(),
            ref_key,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_identifiers(&self.row_key, &self.column_name)
    }

    /// The error reported when this key is written twice
    pub fn duplicate(&self) -> CellarError {
        CellarError::ConstraintViolation {
            row_key: self.row_key.clone(),
            column_name: self.column_name.clone(),
            ref_key: self.ref_key,
        }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.row_key, self.column_name, self.ref_key)
    }
}

/// A cell to be appended as part of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewCell<'a> {
    pub row_key: &'a str,
    pub column_name: &'a str,
    pub ref_key: i64,
    pub body: &'a [u8],
}

impl<'a> NewCell<'a> {
    pub fn new(row_key: &'a str, column_name: &'a str, ref_key: i64, body: &'a [u8]) -> Self {
        Self {
            row_key,
            column_name,
            ref_key,
            body,
        }
    }

    pub fn key(&self) -> CellKey {
        CellKey::new(self.row_key, self.column_name, self.ref_key)
    }
}

/// Check a (row_key, column_name) pair against the persisted column limits.
pub fn validate_identifiers(row_key: &str, column_name: &str) -> Result<()> {
    validate_identifier("row_key", row_key, MAX_ROW_KEY_LEN)?;
    validate_identifier("column_name", column_name, MAX_COLUMN_NAME_LEN)
}

fn validate_identifier(field: &str, value: &str, max_len: usize) -> Result<()> {
    if value.is_empty() {
        return Err(CellarError::InvalidArgument(format!("{} must not be empty", field)));
    }
    let len = value.chars().count();
    if len > max_len {
        return Err(CellarError::InvalidArgument(format!(
            "{} is {} characters, limit is {}",
            field, len, max_len
        )));
    }
    Ok(())
}
