use super::read_pool::ReadPoolConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Location string that selects an in-memory store
pub const MEMORY_LOCATION: &str = ":memory:";

/// Suffix appended to a location to form the store file name
pub const CELL_FILE_SUFFIX: &str = "_cell.db";

/// Where a store keeps its cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// A database file, created if missing
    File(PathBuf),
    /// Lives only as long as the store handle
    Memory,
}

impl Location {
    pub fn is_memory(&self) -> bool {
        matches!(self, Location::Memory)
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Location::File(path) => Some(path),
            Location::Memory => None,
        }
    }
}

/// Configuration for a cell store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub location: Location,

    /// Enable WAL mode (file-backed stores only)
    /// Default: true
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    #[serde(default)]
    pub synchronous: SynchronousMode,

    /// How long a call waits on a locked database before failing
    /// Default: 5000
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,

    /// Page cache size (in pages, negative = KB)
    /// Default: -64000 (64MB)
    #[serde(default = "default_cache_size")]
    pub cache_size: i32,

    #[serde(default = "default_read_pool")]
    pub read_pool: ReadPoolConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SynchronousMode {
    /// Full fsync (safest, slowest)
    Full,
    /// fsync at critical moments (good balance)
    #[default]
    Normal,
    /// No fsync (fastest, least safe)
    Off,
}

impl SynchronousMode {
    pub fn as_pragma(&self) -> &'static str {
        match self {
            SynchronousMode::Full => "FULL",
            SynchronousMode::Normal => "NORMAL",
            SynchronousMode::Off => "OFF",
        }
    }
}

fn default_wal_mode() -> bool {
    true
}

fn default_busy_timeout() -> u64 {
    5000
}

fn default_cache_size() -> i32 {
    -64000 // 64MB
}

fn default_read_pool() -> ReadPoolConfig {
    ReadPoolConfig::enabled(4)
}

impl StoreConfig {
    /// File-backed store at exactly `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_location(Location::File(path.into()))
    }

    pub fn in_memory() -> Self {
        Self::with_location(Location::Memory)
    }

    /// Resolve a location string: `:memory:` or a prefix for `<location>_cell.db`
    pub fn for_location(location: &str) -> Self {
        if location == MEMORY_LOCATION {
            Self::in_memory()
        } else {
            Self::new(format!("{}{}", location, CELL_FILE_SUFFIX))
        }
    }

    fn with_location(location: Location) -> Self {
        Self {
            location,
            wal_mode: default_wal_mode(),
            synchronous: SynchronousMode::default(),
            busy_timeout_ms: default_busy_timeout(),
            cache_size: default_cache_size(),
            read_pool: default_read_pool(),
        }
    }

    pub fn with_synchronous(mut self, synchronous: SynchronousMode) -> Self {
        self.synchronous = synchronous;
        self
    }

    pub fn with_wal_mode(mut self, wal_mode: bool) -> Self {
        self.wal_mode = wal_mode;
        self
    }

    pub fn with_busy_timeout(mut self, timeout_ms: u64) -> Self {
        self.busy_timeout_ms = timeout_ms;
        self
    }

    pub fn with_cache_size(mut self, cache_size: i32) -> Self {
        self.cache_size = cache_size;
        self
    }

    /// Configure read connection pooling
    pub fn with_read_pool(mut self, config: ReadPoolConfig) -> Self {
        self.read_pool = config;
        self
    }

    /// Enable read pooling with the specified pool size
    pub fn with_read_pool_size(mut self, pool_size: usize) -> Self {
        self.read_pool = ReadPoolConfig::enabled(pool_size);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_location() {
        assert_eq!(StoreConfig::for_location(":memory:").location, Location::Memory);
        assert_eq!(
            StoreConfig::for_location("/tmp/shard-3").location,
            Location::File(PathBuf::from("/tmp/shard-3_cell.db"))
        );
    }

    #[test]
    fn test_defaults_from_minimal_json() {
        let cfg: StoreConfig =
            serde_json::from_str(r#"{"location": {"file": "/var/lib/cells.db"}}"#).unwrap();
        assert!(cfg.wal_mode);
        assert_eq!(cfg.synchronous, SynchronousMode::Normal);
        assert_eq!(cfg.busy_timeout_ms, 5000);
        assert_eq!(cfg.cache_size, -64000);
        assert_eq!(cfg.read_pool, ReadPoolConfig::enabled(4));
        assert_eq!(cfg.location.path(), Some(Path::new("/var/lib/cells.db")));
    }

    #[test]
    fn test_builders() {
        let cfg = StoreConfig::in_memory()
            .with_synchronous(SynchronousMode::Full)
            .with_busy_timeout(250)
            .with_read_pool(ReadPoolConfig::disabled());
        assert!(cfg.location.is_memory());
        assert_eq!(cfg.synchronous.as_pragma(), "FULL");
        assert_eq!(cfg.busy_timeout_ms, 250);
        assert!(!cfg.read_pool.enabled);
    }
}
