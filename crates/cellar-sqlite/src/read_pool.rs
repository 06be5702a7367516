//! SQLite Read Connection Pool
//!
//! Provides a pool of read-only SQLite connections for concurrent reads.
//! SQLite requires separate connections for true concurrency; in WAL mode the
//! readers never block the writer.

use crate::errors::closed_err;
use cellar_core::error::{CellarError, Result};
use cellar_core::{OpContext, ReadPoolConfig};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// How long a blocked acquire waits on one slot before re-checking the others
const ACQUIRE_SLICE: Duration = Duration::from_millis(2);

/// A pooled read-only connection, returned to the pool on drop
pub struct PooledSqliteConnection<'a> {
    guard: MutexGuard<'a, Option<Connection>>,
}

impl<'a> PooledSqliteConnection<'a> {
    /// Get direct access to the underlying connection
    pub fn connection(&self) -> Result<&Connection> {
        self.guard.as_ref().ok_or_else(closed_err)
    }
}

/// SQLite Read Connection Pool
///
/// Each connection is opened with `SQLITE_OPEN_READ_ONLY`. Acquisition honours
/// both the configured acquire timeout and the caller's [`OpContext`].
pub struct SqliteReadPool {
    connections: Vec<Mutex<Option<Connection>>>,
    next: AtomicUsize,
    acquire_timeout: Duration,
    db_path: PathBuf,
}

impl SqliteReadPool {
    /// Open `pool_size` read-only connections to an existing database
    pub fn new(db_path: &Path, config: &ReadPoolConfig, busy_timeout: Duration) -> Result<Self> {
        let pool_size = config.pool_size.max(1);
        let mut connections = Vec::with_capacity(pool_size);

        for _ in 0..pool_size {
            let conn = Connection::open_with_flags(
                db_path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(|e| CellarError::StorageUnavailable(e.to_string()))?;
            conn.busy_timeout(busy_timeout)
                .map_err(|e| CellarError::StorageUnavailable(e.to_string()))?;

            connections.push(Mutex::new(Some(conn)));
        }

        Ok(Self {
            connections,
            next: AtomicUsize::new(0),
            acquire_timeout: Duration::from_millis(config.acquire_timeout_ms),
            db_path: db_path.to_path_buf(),
        })
    }

    /// Acquire a pooled read-only connection
    ///
    /// Waits up to the acquire timeout, or less if the context expires first.
    pub fn acquire(&self, ctx: &OpContext) -> Result<PooledSqliteConnection<'_>> {
        let wait = ctx
            .remaining()
            .map_or(self.acquire_timeout, |left| left.min(self.acquire_timeout));
        let give_up = Instant::now() + wait;
        let start = self.next.fetch_add(1, Ordering::Relaxed) % self.connections.len();

        loop {
            if let Some(pooled) = self.try_acquire_from(start)? {
                return Ok(pooled);
            }
            ctx.check()?;
            if Instant::now() >= give_up {
                return Err(CellarError::StorageUnavailable(format!(
                    "Read pool acquire timeout after {:?}",
                    wait
                )));
            }
            if let Some(guard) = self.connections[start].try_lock_for(ACQUIRE_SLICE) {
                return Self::wrap(guard);
            }
        }
    }

    /// Try to acquire a pooled read-only connection without waiting
    ///
    /// Returns `None` if no connection is immediately available.
    pub fn try_acquire(&self) -> Result<Option<PooledSqliteConnection<'_>>> {
        let start = self.next.fetch_add(1, Ordering::Relaxed) % self.connections.len();
        self.try_acquire_from(start)
    }

    fn try_acquire_from(&self, start: usize) -> Result<Option<PooledSqliteConnection<'_>>> {
        let n = self.connections.len();
        for i in 0..n {
            if let Some(guard) = self.connections[(start + i) % n].try_lock() {
                return Self::wrap(guard).map(Some);
            }
        }
        Ok(None)
    }

    fn wrap(guard: MutexGuard<'_, Option<Connection>>) -> Result<PooledSqliteConnection<'_>> {
        if guard.is_none() {
            return Err(closed_err());
        }
        Ok(PooledSqliteConnection { guard })
    }

    /// Close every connection, waiting for in-flight reads to finish.
    ///
    /// Later acquires fail. Returns the first close error, after attempting all.
    pub fn close(&self) -> Result<()> {
        let mut first_err = None;
        for slot in &self.connections {
            if let Some(conn) = slot.lock().take() {
                if let Err((_, e)) = conn.close() {
                    first_err.get_or_insert(CellarError::StorageUnavailable(e.to_string()));
                }
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Get the database path
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Get the pool size
    pub fn pool_size(&self) -> usize {
        self.connections.len()
    }
}
