//! Cache backing stores
//!
//! [`memory::MemoryBackend`] is always available; the Redis backend is
//! compiled in with the `redis` feature.

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use memory::MemoryBackend;
#[cfg(feature = "redis")]
pub use self::redis::RedisBackend;

use crate::config::{CacheBackendKind, CacheConfig};
use crate::core::traits::CacheBackend;
use crate::utils::error::{GatewayError, Result};
use std::sync::Arc;
use tracing::info;

/// Build the backend selected by `config`
pub async fn create_backend(config: &CacheConfig) -> Result<Arc<dyn CacheBackend>> {
    match config.backend {
        CacheBackendKind::Memory => {
            info!("Using in-memory cache backend");
            Ok(Arc::new(MemoryBackend::new()))
        }
        #[cfg(feature = "redis")]
        CacheBackendKind::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .ok_or_else(|| GatewayError::config("cache.redis_url is required for the redis backend"))?;
            let backend = RedisBackend::connect(url)
                .await
                .map_err(|e| GatewayError::config(format!("Redis cache backend: {}", e)))?;
            Ok(Arc::new(backend))
        }
        #[cfg(not(feature = "redis"))]
        CacheBackendKind::Redis => Err(GatewayError::config(
            "redis cache backend requested but the `redis` feature is disabled",
        )),
    }
}
