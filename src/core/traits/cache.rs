//! Cache backing store trait
//!
//! The intelligent cache consumes a key-value store with per-key expiry,
//! atomic set-if-absent and pattern deletion. Values are opaque bytes; the
//! cache layer owns serialization and compression.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Cache backend errors
///
/// Never surfaced past the cache manager: every error degrades to a miss or
/// a no-op there.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache codec error: {0}")]
    Codec(String),

    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Key-value store with TTL used behind the intelligent cache
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store `value` under `key`, expiring after `ttl`
    async fn set_ex(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;

    /// Atomically store `value` only if `key` is absent
    ///
    /// Returns `true` if the value was stored.
    async fn set_nx_ex(&self, key: &str, value: &[u8], ttl: Duration) -> Result<bool, CacheError>;

    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Delete `key` only if its current value equals `expected`
    async fn compare_and_delete(&self, key: &str, expected: &[u8]) -> Result<bool, CacheError>;

    /// Delete every key matching a glob pattern (`*` and `?`)
    ///
    /// Returns the number of keys removed.
    async fn delete_pattern(&self, pattern: &str) -> Result<u64, CacheError>;

    async fn ping(&self) -> Result<(), CacheError>;

    /// Drop expired entries eagerly; backends with native expiry do nothing
    async fn sweep(&self) -> usize {
        0
    }
}
