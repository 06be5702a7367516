use serde::{Deserialize, Serialize};

/// Configuration for read connection pooling
///
/// When enabled, reads run on a pool of read-only connections so they do not
/// queue behind the writer. Ignored for in-memory stores, whose data is only
/// visible through the connection that created it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadPoolConfig {
    /// Whether pooling is enabled
    #[serde(default)]
    pub enabled: bool,

    /// Number of read-only connections in the pool (default: 4)
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Timeout in milliseconds when acquiring a pooled connection (default: 5000)
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_ms: u64,
}

impl Default for ReadPoolConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            pool_size: default_pool_size(),
            acquire_timeout_ms: default_acquire_timeout(),
        }
    }
}

impl ReadPoolConfig {
    /// Create a new enabled read pool configuration
    pub fn enabled(pool_size: usize) -> Self {
        Self {
            enabled: true,
            pool_size,
            acquire_timeout_ms: default_acquire_timeout(),
        }
    }

    /// Reads share the writer connection
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.acquire_timeout_ms = timeout_ms;
        self
    }
}

fn default_pool_size() -> usize {
    4
}

fn default_acquire_timeout() -> u64 {
    5000
}
