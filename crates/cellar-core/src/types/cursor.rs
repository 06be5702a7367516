use super::cell::{Cell, Sequence};
use crate::error::{CellarError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column a partition scan orders and filters by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorDimension {
    /// Store-wide insertion sequence. Gap-free and tie-free.
    AddedAt,
    /// Insertion wall-clock time. Subject to clock skew and ties.
    CreatedAt,
}

impl CursorDimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            CursorDimension::AddedAt => "added_at",
            CursorDimension::CreatedAt => "created_at",
        }
    }
}

impl fmt::Display for CursorDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CursorDimension {
    type Err = CellarError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "added_at" => Ok(CursorDimension::AddedAt),
            // "timestamp" is kept as an alias for older consumers
            "created_at" | "timestamp" => Ok(CursorDimension::CreatedAt),
            other => Err(CellarError::InvalidArgument(format!(
                "Unrecognized cursor dimension: {}",
                other
            ))),
        }
    }
}

/// Position of a partition scan: cells strictly after it are returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cursor {
    AddedAt(Sequence),
    CreatedAt(DateTime<Utc>),
}

impl Cursor {
    /// Cursor positioned before every cell along `dimension`
    pub fn origin(dimension: CursorDimension) -> Self {
        match dimension {
            CursorDimension::AddedAt => Cursor::AddedAt(0),
            CursorDimension::CreatedAt => Cursor::CreatedAt(DateTime::<Utc>::MIN_UTC),
        }
    }

    /// Cursor positioned at `cell` along `dimension`
    pub fn at(cell: &Cell, dimension: CursorDimension) -> Self {
        match dimension {
            CursorDimension::AddedAt => Cursor::AddedAt(cell.added_at),
            CursorDimension::CreatedAt => Cursor::CreatedAt(cell.created_at),
        }
    }

    pub fn dimension(&self) -> CursorDimension {
        match self {
            Cursor::AddedAt(_) => CursorDimension::AddedAt,
            Cursor::CreatedAt(_) => CursorDimension::CreatedAt,
        }
    }

    /// Integer form of the cursor as stored in the backing column.
    ///
    /// `created_at` is persisted as microseconds since the Unix epoch.
    pub fn column_value(&self) -> i64 {
        match self {
            Cursor::AddedAt(seq) => *seq,
            Cursor::CreatedAt(ts) => ts.timestamp_micros(),
        }
    }

    /// Parse a cursor from a dimension name and a textual value.
    ///
    /// `added_at` takes an integer. `created_at` takes either an RFC 3339
    /// timestamp or integer microseconds since the Unix epoch.
    pub fn parse(dimension: &str, value: &str) -> Result<Self> {
        let dimension: CursorDimension = dimension.parse()?;
        let value = value.trim();
        match dimension {
            CursorDimension::AddedAt => value.parse::<Sequence>().map(Cursor::AddedAt).map_err(|e| {
                CellarError::InvalidArgument(format!("Invalid added_at cursor '{}': {}", value, e))
            }),
            CursorDimension::CreatedAt => {
                if let Ok(micros) = value.parse::<i64>() {
                    return timestamp_from_micros(micros).map(Cursor::CreatedAt);
                }
                DateTime::parse_from_rfc3339(value)
                    .map(|ts| Cursor::CreatedAt(ts.with_timezone(&Utc)))
                    .map_err(|e| {
                        CellarError::InvalidArgument(format!(
                            "Invalid created_at cursor '{}': {}",
                            value, e
                        ))
                    })
            }
        }
    }
}

/// Convert stored microseconds back to a timestamp.
pub fn timestamp_from_micros(micros: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros).ok_or_else(|| {
        CellarError::InvalidArgument(format!("Timestamp out of range: {} us", micros))
    })
}
