use crate::errors::storage_err;
use cellar_core::error::Result;
use cellar_core::OpContext;
use rusqlite::Connection;
use std::time::Duration;

/// Virtual machine instructions between progress checks
const PROGRESS_INTERVAL_OPS: i32 = 1000;

/// Binds an [`OpContext`] to a connection for the duration of one call.
///
/// Sets the busy timeout to the smaller of the configured wait and the time
/// left on the context, and installs a progress handler that aborts the running
/// statement once the context is cancelled or expires. Both are reset on drop.
pub(crate) struct CallGuard<'c> {
    conn: &'c Connection,
    busy_timeout: Duration,
    hooked: bool,
}

impl<'c> CallGuard<'c> {
    pub(crate) fn install(
        conn: &'c Connection,
        ctx: &OpContext,
        busy_timeout: Duration,
    ) -> Result<Self> {
        ctx.check()?;

        let wait = ctx
            .remaining()
            .map_or(busy_timeout, |left| left.min(busy_timeout));
        conn.busy_timeout(wait).map_err(|e| storage_err(ctx, e))?;

        let hooked = ctx.is_bounded();
        if hooked {
            let ctx = ctx.clone();
            conn.progress_handler(PROGRESS_INTERVAL_OPS, Some(move || ctx.should_interrupt()));
        }

        Ok(Self {
            conn,
            busy_timeout,
            hooked,
        })
    }
}

impl<'c> Drop for CallGuard<'c> {
    fn drop(&mut self) {
        if self.hooked {
            self.conn.progress_handler(0, None::<fn() -> bool>);
        }
        let _ = self.conn.busy_timeout(self.busy_timeout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellar_core::CancelToken;

    const SLOW_QUERY: &str = "WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n WHERE x < 50000000) SELECT COUNT(*) FROM n";

    #[test]
    fn test_cancelled_context_fails_before_install() {
        let conn = Connection::open_in_memory().unwrap();
        let token = CancelToken::new();
        token.cancel();
        let ctx = OpContext::background().with_cancel(token);
        assert!(CallGuard::install(&conn, &ctx, Duration::from_secs(1))
            .err()
            .unwrap()
            .is_cancelled());
    }

    #[test]
    fn test_deadline_interrupts_running_statement() {
        let conn = Connection::open_in_memory().unwrap();
        let ctx = OpContext::background().with_timeout(Duration::from_millis(20));
        let guard = CallGuard::install(&conn, &ctx, Duration::from_secs(1)).unwrap();

        let err = conn
            .query_row(SLOW_QUERY, [], |row| row.get::<_, i64>(0))
            .unwrap_err();
        assert!(storage_err(&ctx, err).is_cancelled());
        drop(guard);

        // Handler removed: the same connection runs queries normally again
        let one: i64 = conn.query_row("SELECT 1", [], |row| row.get(0)).unwrap();
        assert_eq!(one, 1);
    }
}
