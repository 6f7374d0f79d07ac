//! Intelligent response cache
//!
//! A content-addressed cache in front of a [`CacheBackend`](crate::core::traits::CacheBackend)
//! with tiered TTLs, transparent compression, request deduplication,
//! non-blocking locks and a small in-process hot layer. Backend failures
//! never reach callers: they degrade to a miss or a no-op.
//!
//! # Module Structure
//!
//! - `types` - TTL classes, stored envelope and statistics
//! - `key` - Key derivation and namespaces
//! - `codec` - Marker-prefixed optional gzip payload encoding
//! - `hot` - Bounded LRU of recently used entries
//! - `manager` - The cache itself
//! - `tests` - Test suite

pub mod codec;
mod hot;
pub mod key;
pub mod manager;
pub mod types;

pub use key::{CacheKey, CacheNamespace};
pub use manager::{CacheLock, IntelligentCache};
pub use types::{CacheStats, TtlClass};
