use cellar_core::error::{CellarError, Result};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};

/// Schema version written by this crate
pub const SCHEMA_VERSION: u32 = 1;

/// Name of the index enforcing (row_key, column_name, ref_key) uniqueness
pub const UNIQUE_INDEX: &str = "uniqcell_idx";

const CREATE_CELL_TABLE: &str = "CREATE TABLE IF NOT EXISTS cell (
    added_at INTEGER PRIMARY KEY AUTOINCREMENT,
    row_key VARCHAR(36) NOT NULL,
    column_name VARCHAR(64) NOT NULL,
    ref_key INTEGER NOT NULL,
    body BLOB,
    created_at INTEGER NOT NULL
        DEFAULT (CAST((julianday('now') - 2440587.5) * 86400000000.0 AS INTEGER))
)";

const CREATE_UNIQUE_INDEX: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS uniqcell_idx ON cell (row_key, column_name, ref_key)";

const CREATE_CREATED_AT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS cell_created_at_idx ON cell (created_at)";

const CREATE_META_TABLE: &str = "CREATE TABLE IF NOT EXISTS cell_meta (
    id INTEGER PRIMARY KEY CHECK (id = 0),
    schema_version INTEGER NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)";

const INSERT_META_ROW: &str =
    "INSERT OR IGNORE INTO cell_meta (id, schema_version) VALUES (0, ?1)";

/// Create the cell table and its indexes if absent.
///
/// Safe to call on every open. Runs in one transaction, so a failure leaves
/// nothing behind. Afterwards the unique index is verified; a store without it
/// must not be used.
pub fn ensure_schema(conn: &mut Connection) -> Result<()> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(schema_err)?;
    tx.execute(CREATE_CELL_TABLE, []).map_err(schema_err)?;
    tx.execute(CREATE_UNIQUE_INDEX, []).map_err(schema_err)?;
    tx.execute(CREATE_CREATED_AT_INDEX, []).map_err(schema_err)?;
    tx.execute(CREATE_META_TABLE, []).map_err(schema_err)?;
    tx.execute(INSERT_META_ROW, [SCHEMA_VERSION as i64])
        .map_err(schema_err)?;
    tx.commit().map_err(schema_err)?;

    verify_unique_index(conn)
}

/// Check that the uniqueness index exists and really is unique.
pub fn verify_unique_index(conn: &Connection) -> Result<()> {
    let unique: Option<bool> = conn
        .query_row(
            "SELECT \"unique\" FROM pragma_index_list('cell') WHERE name = ?1",
            [UNIQUE_INDEX],
            |row| row.get(0),
        )
        .optional()
        .map_err(schema_err)?;

    match unique {
        Some(true) => Ok(()),
        Some(false) => Err(CellarError::InvariantViolation(format!(
            "index {} exists but does not enforce uniqueness",
            UNIQUE_INDEX
        ))),
        None => Err(CellarError::InvariantViolation(format!(
            "index {} is missing",
            UNIQUE_INDEX
        ))),
    }
}

/// Schema version recorded in `cell_meta`
pub fn schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT schema_version FROM cell_meta WHERE id = 0",
        [],
        |row| {
            let v: i64 = row.get(0)?;
            u32::try_from(v).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(0, v))
        },
    )
}

fn schema_err(e: rusqlite::Error) -> CellarError {
    CellarError::StorageUnavailable(format!("schema setup failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_schema(&mut conn).unwrap();
        ensure_schema(&mut conn).unwrap();

        assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);

        let meta_rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM cell_meta", [], |row| row.get(0))
            .unwrap();
        assert_eq!(meta_rows, 1);
    }

    #[test]
    fn test_out_of_range_schema_version_is_an_error() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_schema(&mut conn).unwrap();

        for bad in [-1i64, i64::from(u32::MAX) + 1] {
            conn.execute("UPDATE cell_meta SET schema_version = ?1", [bad])
                .unwrap();
            assert!(matches!(
                schema_version(&conn),
                Err(rusqlite::Error::IntegralValueOutOfRange(0, v)) if v == bad
            ));
        }
    }

    #[test]
    fn test_unique_index_rejects_duplicates() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_schema(&mut conn).unwrap();

        let insert = "INSERT INTO cell (row_key, column_name, ref_key, body) VALUES ('r', 'c', 1, x'00')";
        conn.execute(insert, []).unwrap();
        let err = conn.execute(insert, []).unwrap_err();
        assert_eq!(
            err.sqlite_error_code(),
            Some(rusqlite::ErrorCode::ConstraintViolation)
        );
    }

    #[test]
    fn test_created_at_default_is_unix_micros() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_schema(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO cell (row_key, column_name, ref_key) VALUES ('r', 'c', 1)",
            [],
        )
        .unwrap();

        let created_at: i64 = conn
            .query_row("SELECT created_at FROM cell", [], |row| row.get(0))
            .unwrap();
        let now = chrono::Utc::now().timestamp_micros();
        assert!((now - created_at).abs() < 60_000_000);
    }

    #[test]
    fn test_verify_detects_missing_or_non_unique_index() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_schema(&mut conn).unwrap();

        conn.execute("DROP INDEX uniqcell_idx", []).unwrap();
        assert!(verify_unique_index(&conn)
            .unwrap_err()
            .is_invariant_violation());

        conn.execute(
            "CREATE INDEX uniqcell_idx ON cell (row_key, column_name, ref_key)",
            [],
        )
        .unwrap();
        // CREATE UNIQUE INDEX IF NOT EXISTS skips an index of the same name
        assert!(ensure_schema(&mut conn)
            .unwrap_err()
            .is_invariant_violation());
    }
}
