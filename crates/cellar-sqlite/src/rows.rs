use cellar_core::error::{CellarError, Result};
use cellar_core::types::cursor::timestamp_from_micros;
use cellar_core::Cell;
use rusqlite::types::ValueRef;
use rusqlite::Row;

/// A cell row as read from SQLite, before timestamp conversion
pub(crate) struct RawCell {
    added_at: i64,
    row_key: String,
    column_name: String,
    ref_key: i64,
    body: Vec<u8>,
    created_at: i64,
}

impl RawCell {
    /// Map a row selected as `added_at, row_key, column_name, ref_key, body, created_at`
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        // NULL bodies read back as empty; TEXT bodies are taken as their bytes
        let body = match row.get_ref(4)? {
            ValueRef::Null => Vec::new(),
            ValueRef::Blob(b) | ValueRef::Text(b) => b.to_vec(),
            other => {
                return Err(rusqlite::Error::InvalidColumnType(
                    4,
                    "body".into(),
                    other.data_type(),
                ))
            }
        };

        Ok(Self {
            added_at: row.get(0)?,
            row_key: row.get(1)?,
            column_name: row.get(2)?,
            ref_key: row.get(3)?,
            body,
            created_at: row.get(5)?,
        })
    }

    pub(crate) fn ref_key(&self) -> i64 {
        self.ref_key
    }

    pub(crate) fn into_cell(self) -> Result<Cell> {
        let created_at = timestamp_from_micros(self.created_at).map_err(|_| {
            CellarError::StorageUnavailable(format!(
                "cell {} has unreadable created_at {}",
                self.added_at, self.created_at
            ))
        })?;

        Ok(Cell {
            added_at: self.added_at,
            row_key: self.row_key,
            column_name: self.column_name,
            ref_key: self.ref_key,
            body: self.body,
            created_at,
        })
    }
}
