//! Lifecycle tests: open, reset, destroy, and per-call cancellation

use cellar::prelude::*;
use std::time::{Duration, Instant};

fn ctx() -> OpContext {
    OpContext::background()
}

#[test]
fn test_open_creates_cell_file_for_location() {
    let temp_dir = tempfile::tempdir().unwrap();
    let location = temp_dir.path().join("shard-7");

    let store = cellar::open(location.to_str().unwrap()).unwrap();
    store.put_cell(&ctx(), "r", "c", 1, b"x").unwrap();

    assert!(temp_dir.path().join("shard-7_cell.db").exists());
    assert_eq!(store.schema_version(&ctx()).unwrap(), cellar::SCHEMA_VERSION);
}

#[test]
fn test_reopen_preserves_cells_and_sequence() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("cells.db");

    {
        let store = SqliteCellStore::open(StoreConfig::new(&path)).unwrap();
        store.put_cell(&ctx(), "r", "c", 1, b"one").unwrap();
        store.put_cell(&ctx(), "r", "c", 2, b"two").unwrap();
        store.destroy(&ctx()).unwrap();
    }

    let store = SqliteCellStore::open(StoreConfig::new(&path)).unwrap();
    assert_eq!(store.get_cell(&ctx(), "r", "c", 1).unwrap().unwrap().body, b"one");
    assert!(store.put_cell(&ctx(), "r", "c", 2, b"dup").unwrap_err().is_constraint_violation());

    // Sequence continues after the highest value ever handed out
    let next = store.put_cell(&ctx(), "r", "c", 3, b"three").unwrap();
    assert_eq!(next, 3);
}

#[test]
fn test_sequence_not_reused_after_external_delete() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("cells.db");

    let store = SqliteCellStore::open(StoreConfig::new(&path)).unwrap();
    store.put_cell(&ctx(), "r", "c", 1, b"x").unwrap();
    store.put_cell(&ctx(), "r", "c", 2, b"y").unwrap();
    store.destroy(&ctx()).unwrap();

    // Compaction is someone else's job; simulate it removing the newest cell
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute("DELETE FROM cell WHERE added_at = 2", []).unwrap();
    drop(conn);

    let store = SqliteCellStore::open(StoreConfig::new(&path)).unwrap();
    assert_eq!(store.head(&ctx()).unwrap(), Some(1));
    assert_eq!(store.put_cell(&ctx(), "r", "c", 3, b"z").unwrap(), 3);
}

#[test]
fn test_reset_connection_keeps_data() {
    let store = cellar::open_in_memory().unwrap();
    store.put_cell(&ctx(), "r", "c", 1, b"x").unwrap();

    store.reset_connection(&ctx()).unwrap();
    store.reset_connection(&ctx()).unwrap();

    assert!(store.get_cell(&ctx(), "r", "c", 1).unwrap().is_some());
}

#[test]
fn test_destroy_is_final() {
    let store = cellar::open_in_memory().unwrap();
    store.put_cell(&ctx(), "r", "c", 1, b"x").unwrap();

    store.destroy(&ctx()).unwrap();

    let errors = [
        store.put_cell(&ctx(), "r", "c", 2, b"y").map(|_| ()).unwrap_err(),
        store.get_cell(&ctx(), "r", "c", 1).map(|_| ()).unwrap_err(),
        store.get_cell_latest(&ctx(), "r", "c").map(|_| ()).unwrap_err(),
        store
            .partition_read(&ctx(), Cursor::AddedAt(0), 10)
            .map(|_| ())
            .unwrap_err(),
        store.head(&ctx()).map(|_| ()).unwrap_err(),
        store.reset_connection(&ctx()).unwrap_err(),
        store.destroy(&ctx()).unwrap_err(),
    ];
    assert!(errors.iter().all(CellarError::is_storage_unavailable));
}

#[test]
fn test_destroy_file_store_closes_read_pool() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = SqliteCellStore::open(StoreConfig::new(temp_dir.path().join("cells.db"))).unwrap();
    assert!(store.has_read_pool());

    store.put_cell(&ctx(), "r", "c", 1, b"x").unwrap();
    store.destroy(&ctx()).unwrap();
    assert!(store.get_cell(&ctx(), "r", "c", 1).unwrap_err().is_storage_unavailable());
}

#[test]
fn test_destroy_flushes_observer() {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Flushing(AtomicBool);

    impl StoreObserver for Flushing {
        fn on_operation(&self, _record: &OperationRecord<'_>) {}

        fn flush(&self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    let observer = Arc::new(Flushing::default());
    let store =
        SqliteCellStore::open_with_observer(StoreConfig::in_memory(), observer.clone()).unwrap();
    assert!(!observer.0.load(Ordering::SeqCst));

    store.destroy(&ctx()).unwrap();
    assert!(observer.0.load(Ordering::SeqCst));
}

#[test]
fn test_cancelled_context_fails_without_writing() {
    let store = cellar::open_in_memory().unwrap();
    let token = CancelToken::new();
    let cancelled = OpContext::background().with_cancel(token.clone());
    token.cancel();

    let err = store.put_cell(&cancelled, "r", "c", 1, b"x").unwrap_err();
    assert!(err.is_cancelled());
    assert!(err.is_storage_unavailable());

    assert!(store.get_cell(&cancelled, "r", "c", 1).unwrap_err().is_cancelled());
    assert!(store
        .partition_read(&cancelled, Cursor::AddedAt(0), 10)
        .unwrap_err()
        .is_cancelled());

    // Nothing was written
    assert_eq!(store.head(&ctx()).unwrap(), None);
}

#[test]
fn test_destroy_with_expired_context_still_closes() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = SqliteCellStore::open(StoreConfig::new(temp_dir.path().join("cells.db"))).unwrap();
    store.put_cell(&ctx(), "r", "c", 1, b"x").unwrap();

    let token = CancelToken::new();
    token.cancel();
    let cancelled = OpContext::background().with_cancel(token);
    store.destroy(&cancelled).unwrap();

    assert!(store.get_cell(&ctx(), "r", "c", 1).unwrap_err().is_storage_unavailable());
    assert!(store.destroy(&ctx()).is_err());

    let expired = OpContext::background().with_deadline(Instant::now());
    let other = cellar::open_in_memory().unwrap();
    other.destroy(&expired).unwrap();
    assert!(other.head(&ctx()).unwrap_err().is_storage_unavailable());
}

#[test]
fn test_expired_deadline_fails_promptly() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = SqliteCellStore::open(StoreConfig::new(temp_dir.path().join("cells.db"))).unwrap();

    let expired = OpContext::background().with_deadline(Instant::now());
    let started = Instant::now();
    assert!(store
        .get_cell_latest(&expired, "r", "c")
        .unwrap_err()
        .is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(1));

    // A generous deadline does not get in the way
    let relaxed = OpContext::background().with_timeout(Duration::from_secs(30));
    store.put_cell(&relaxed, "r", "c", 1, b"x").unwrap();
    assert!(store.get_cell(&relaxed, "r", "c", 1).unwrap().is_some());
}
