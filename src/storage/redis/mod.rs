//! Redis cache backend
//!
//! ## Module Structure
//!
//! - `pool` - Connection setup and health checks
//! - `cache` - [`CacheBackend`](crate::core::traits::CacheBackend) operations
//! - `tests` - Module tests

mod cache;
mod pool;

pub use pool::RedisBackend;
