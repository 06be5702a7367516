use cellar_core::{
    error::{CellarError, Result},
    traits::store::validate_limit,
    types::cell::validate_identifiers,
    Cell, CellKey, CellStore, Cursor, CursorDimension, Location, NewCell, OpContext, Operation,
    OperationRecord, Sequence, StoreConfig, StoreObserver, TracingObserver,
};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags, Transaction, TransactionBehavior};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::errors::{closed_err, insert_err, storage_err};
use crate::interrupt::CallGuard;
use crate::read_pool::SqliteReadPool;
use crate::rows::RawCell;
use crate::schema;

const PUT_CELL_SQL: &str =
    "INSERT INTO cell (row_key, column_name, ref_key, body, created_at) VALUES (?1, ?2, ?3, ?4, ?5)";

// LIMIT 2 so that a second match is detected rather than hidden
const GET_CELL_SQL: &str = "SELECT added_at, row_key, column_name, ref_key, body, created_at
    FROM cell WHERE row_key = ?1 AND column_name = ?2 AND ref_key = ?3 LIMIT 2";

const GET_CELL_LATEST_SQL: &str = "SELECT added_at, row_key, column_name, ref_key, body, created_at
    FROM cell WHERE row_key = ?1 AND column_name = ?2 ORDER BY ref_key DESC LIMIT 2";

const SCAN_ADDED_AT_SQL: &str = "SELECT added_at, row_key, column_name, ref_key, body, created_at
    FROM cell WHERE added_at > ?1 ORDER BY added_at ASC LIMIT ?2";

const SCAN_CREATED_AT_SQL: &str = "SELECT added_at, row_key, column_name, ref_key, body, created_at
    FROM cell WHERE created_at > ?1 ORDER BY created_at ASC, added_at ASC LIMIT ?2";

const HEAD_SQL: &str = "SELECT MAX(added_at) FROM cell";

/// SQLite-backed cell store
///
/// Writes go through a single read-write connection. Reads use a pool of
/// read-only connections when the store is file-backed and pooling is enabled,
/// otherwise they share the writer connection.
pub struct SqliteCellStore {
    writer: Mutex<Option<Connection>>,
    readers: Option<SqliteReadPool>,
    config: StoreConfig,
    observer: Arc<dyn StoreObserver>,
    destroyed: AtomicBool,
}

impl SqliteCellStore {
    /// Open with a custom observer instead of [`TracingObserver`]
    pub fn open_with_observer(cfg: StoreConfig, observer: Arc<dyn StoreObserver>) -> Result<Self> {
        let start = Instant::now();
        let result = Self::open_inner(cfg, observer.clone());
        observer.on_operation(&OperationRecord {
            operation: Operation::Open,
            key: None,
            rows: 0,
            duration: start.elapsed(),
            error: result.as_ref().err(),
        });
        result
    }

    fn open_inner(cfg: StoreConfig, observer: Arc<dyn StoreObserver>) -> Result<Self> {
        let mut conn = match &cfg.location {
            Location::File(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                Connection::open_with_flags(
                    path,
                    OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
                )
            }
            Location::Memory => Connection::open_in_memory(),
        }
        .map_err(|e| CellarError::StorageUnavailable(e.to_string()))?;

        Self::configure_connection(&conn, &cfg)?;
        schema::ensure_schema(&mut conn)?;

        let readers = match cfg.location.path() {
            Some(path) if cfg.read_pool.enabled => Some(SqliteReadPool::new(
                path,
                &cfg.read_pool,
                Duration::from_millis(cfg.busy_timeout_ms),
            )?),
            _ => None,
        };

        tracing::debug!(
            location = ?cfg.location,
            read_pool = readers.as_ref().map_or(0, SqliteReadPool::pool_size),
            "opened cell store"
        );

        Ok(Self {
            writer: Mutex::new(Some(conn)),
            readers,
            config: cfg,
            observer,
            destroyed: AtomicBool::new(false),
        })
    }

    /// Configure SQLite connection
    fn configure_connection(conn: &Connection, cfg: &StoreConfig) -> Result<()> {
        if cfg.wal_mode && !cfg.location.is_memory() {
            let mode: String = conn
                .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
                .map_err(|e| CellarError::Config(e.to_string()))?;
            if !mode.eq_ignore_ascii_case("wal") {
                return Err(CellarError::Config(format!(
                    "journal_mode WAL not accepted, database reports {}",
                    mode
                )));
            }
        }

        conn.pragma_update(None, "synchronous", cfg.synchronous.as_pragma())
            .map_err(|e| CellarError::Config(e.to_string()))?;

        conn.pragma_update(None, "cache_size", cfg.cache_size)
            .map_err(|e| CellarError::Config(e.to_string()))?;

        conn.busy_timeout(Duration::from_millis(cfg.busy_timeout_ms))
            .map_err(|e| CellarError::Config(e.to_string()))?;

        Ok(())
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Whether reads run on a separate read-only pool
    pub fn has_read_pool(&self) -> bool {
        self.readers.is_some()
    }

    fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.config.busy_timeout_ms)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.destroyed.load(Ordering::SeqCst) {
            return Err(closed_err());
        }
        Ok(())
    }

    /// Run `f` on the writer connection with the context bound to it
    fn with_writer<T>(
        &self,
        ctx: &OpContext,
        f: impl FnOnce(&Connection) -> Result<T>,
    ) -> Result<T> {
        self.ensure_open()?;
        ctx.check()?;

        let guard = self.writer.lock();
        let conn = guard.as_ref().ok_or_else(closed_err)?;
        let _call = CallGuard::install(conn, ctx, self.busy_timeout())?;
        f(conn)
    }

    /// Run `f` on a reader connection with the context bound to it
    fn with_reader<T>(
        &self,
        ctx: &OpContext,
        f: impl FnOnce(&Connection) -> Result<T>,
    ) -> Result<T> {
        let Some(pool) = &self.readers else {
            return self.with_writer(ctx, f);
        };

        self.ensure_open()?;
        ctx.check()?;

        let pooled = pool.acquire(ctx)?;
        let conn = pooled.connection()?;
        let _call = CallGuard::install(conn, ctx, self.busy_timeout())?;
        f(conn)
    }

    /// Report `result` to the observer and hand it back unchanged
    fn observed<T>(
        &self,
        operation: Operation,
        key: Option<&CellKey>,
        start: Instant,
        result: Result<T>,
        rows: impl FnOnce(&T) -> usize,
    ) -> Result<T> {
        self.observer.on_operation(&OperationRecord {
            operation,
            key,
            rows: result.as_ref().map_or(0, rows),
            duration: start.elapsed(),
            error: result.as_ref().err(),
        });
        result
    }

    fn insert(
        conn: &Connection,
        ctx: &OpContext,
        key: &CellKey,
        body: &[u8],
    ) -> Result<Sequence> {
        let mut stmt = conn
            .prepare_cached(PUT_CELL_SQL)
            .map_err(|e| storage_err(ctx, e))?;
        stmt.execute(params![
            key.row_key,
            key.column_name,
            key.ref_key,
            body,
            chrono::Utc::now().timestamp_micros()
        ])
        .map_err(|e| insert_err(ctx, key, e))?;
        Ok(conn.last_insert_rowid())
    }

    fn query_cells(
        conn: &Connection,
        ctx: &OpContext,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<RawCell>> {
        let mut stmt = conn.prepare_cached(sql).map_err(|e| storage_err(ctx, e))?;
        let rows = stmt
            .query_map(params, RawCell::from_row)
            .map_err(|e| storage_err(ctx, e))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(|e| storage_err(ctx, e))?);
        }
        Ok(out)
    }
}

impl CellStore for SqliteCellStore {
    fn open(cfg: StoreConfig) -> Result<Self> {
        Self::open_with_observer(cfg, Arc::new(TracingObserver))
    }

    fn put_cell(
        &self,
        ctx: &OpContext,
        row_key: &str,
        column_name: &str,
        ref_key: i64,
        body: &[u8],
    ) -> Result<Sequence> {
        let start = Instant::now();
        let key = CellKey::new(row_key, column_name, ref_key);

        let result = key
            .validate()
            .and_then(|()| self.with_writer(ctx, |conn| Self::insert(conn, ctx, &key, body)));

        self.observed(Operation::PutCell, Some(&key), start, result, |_| 1)
    }

    fn put_cells(&self, ctx: &OpContext, cells: &[NewCell<'_>]) -> Result<Vec<Sequence>> {
        let start = Instant::now();

        let result = (|| -> Result<Vec<Sequence>> {
            let keys = cells
                .iter()
                .map(|cell| {
                    let key = cell.key();
                    key.validate().map(|()| key)
                })
                .collect::<Result<Vec<_>>>()?;

            if keys.is_empty() {
                self.ensure_open()?;
                return Ok(Vec::new());
            }

            self.with_writer(ctx, |conn| {
                let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
                    .map_err(|e| storage_err(ctx, e))?;

                let mut sequences = Vec::with_capacity(keys.len());
                for (cell, key) in cells.iter().zip(&keys) {
                    sequences.push(Self::insert(&tx, ctx, key, cell.body)?);
                }

                tx.commit().map_err(|e| storage_err(ctx, e))?;
                Ok(sequences)
            })
        })();

        self.observed(Operation::PutCells, None, start, result, Vec::len)
    }

    fn get_cell(
        &self,
        ctx: &OpContext,
        row_key: &str,
        column_name: &str,
        ref_key: i64,
    ) -> Result<Option<Cell>> {
        let start = Instant::now();
        let key = CellKey::new(row_key, column_name, ref_key);

        let result = key.validate().and_then(|()| {
            let mut rows = self.with_reader(ctx, |conn| {
                Self::query_cells(
                    conn,
                    ctx,
                    GET_CELL_SQL,
                    params![row_key, column_name, ref_key],
                )
            })?;

            match rows.len() {
                0 => Ok(None),
                1 => rows.pop().map(RawCell::into_cell).transpose(),
                n => Err(CellarError::InvariantViolation(format!(
                    "{} cells share key {}",
                    n, key
                ))),
            }
        });

        self.observed(Operation::GetCell, Some(&key), start, result, |c| {
            usize::from(c.is_some())
        })
    }

    fn get_cell_latest(
        &self,
        ctx: &OpContext,
        row_key: &str,
        column_name: &str,
    ) -> Result<Option<Cell>> {
        let start = Instant::now();
        let key = CellKey::new(row_key, column_name, i64::MAX);

        let result = validate_identifiers(row_key, column_name).and_then(|()| {
            let rows = self.with_reader(ctx, |conn| {
                Self::query_cells(conn, ctx, GET_CELL_LATEST_SQL, params![row_key, column_name])
            })?;

            let mut rows = rows.into_iter();
            let Some(first) = rows.next() else {
                return Ok(None);
            };
            if let Some(second) = rows.next() {
                if second.ref_key() == first.ref_key() {
                    return Err(CellarError::InvariantViolation(format!(
                        "latest version of {}/{} is ambiguous: ref_key {} appears twice",
                        row_key,
                        column_name,
                        first.ref_key()
                    )));
                }
            }
            first.into_cell().map(Some)
        });

        self.observed(Operation::GetCellLatest, Some(&key), start, result, |c| {
            usize::from(c.is_some())
        })
    }

    fn partition_read(&self, ctx: &OpContext, cursor: Cursor, limit: usize) -> Result<Vec<Cell>> {
        let start = Instant::now();

        let result = validate_limit(limit).and_then(|limit| {
            let sql = match cursor.dimension() {
                CursorDimension::AddedAt => SCAN_ADDED_AT_SQL,
                CursorDimension::CreatedAt => SCAN_CREATED_AT_SQL,
            };
            let rows = self.with_reader(ctx, |conn| {
                Self::query_cells(conn, ctx, sql, params![cursor.column_value(), limit])
            })?;
            rows.into_iter().map(RawCell::into_cell).collect()
        });

        self.observed(Operation::PartitionRead, None, start, result, Vec::len)
    }

    fn head(&self, ctx: &OpContext) -> Result<Option<Sequence>> {
        let start = Instant::now();
        let result = self.with_reader(ctx, |conn| {
            conn.query_row(HEAD_SQL, [], |row| row.get::<_, Option<i64>>(0))
                .map_err(|e| storage_err(ctx, e))
        });
        self.observed(Operation::Head, None, start, result, |_| 0)
    }

    fn schema_version(&self, ctx: &OpContext) -> Result<u32> {
        let start = Instant::now();
        let result = self.with_reader(ctx, |conn| {
            schema::schema_version(conn).map_err(|e| storage_err(ctx, e))
        });
        self.observed(Operation::SchemaVersion, None, start, result, |_| 0)
    }

    fn reset_connection(&self, ctx: &OpContext) -> Result<()> {
        let start = Instant::now();
        // Nothing to reset for a local database; the data stays where it is.
        let result = self.ensure_open().and_then(|()| ctx.check());
        self.observed(Operation::ResetConnection, None, start, result, |_| 0)
    }

    fn destroy(&self, _ctx: &OpContext) -> Result<()> {
        let start = Instant::now();

        // An expired or cancelled context still releases the handles
        let result = if self.destroyed.swap(true, Ordering::SeqCst) {
            Err(closed_err())
        } else {
            let readers = self.readers.as_ref().map_or(Ok(()), SqliteReadPool::close);
            let writer = match self.writer.lock().take() {
                Some(conn) => conn
                    .close()
                    .map_err(|(_, e)| CellarError::StorageUnavailable(e.to_string())),
                None => Ok(()),
            };
            tracing::debug!(location = ?self.config.location, "closed cell store");
            readers.and(writer)
        };

        let result = self.observed(Operation::Destroy, None, start, result, |_| 0);
        self.observer.flush();
        result
    }
}
