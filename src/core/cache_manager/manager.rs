//! Intelligent cache implementation

use super::codec;
use super::hot::HotLayer;
use super::key::{CacheKey, CacheNamespace};
use super::types::{AtomicCacheStats, CacheEnvelope, CacheStats, TtlClass};
use crate::config::CacheConfig;
use crate::core::providers::ProviderId;
use crate::core::traits::{CacheBackend, CacheError};
use crate::monitoring::metrics::{MetricsSink, NoopMetrics};
use crate::storage::memory::glob_to_regex;
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{debug, warn};

/// Response cache in front of a backing store
pub struct IntelligentCache {
    backend: Arc<dyn CacheBackend>,
    config: CacheConfig,
    hot: HotLayer,
    stats: AtomicCacheStats,
    metrics: Arc<dyn MetricsSink>,
}

impl std::fmt::Debug for IntelligentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntelligentCache")
            .field("backend", &self.backend.name())
            .field("enabled", &self.config.enabled)
            .field("hot_cache_size", &self.hot.len())
            .finish_non_exhaustive()
    }
}

impl IntelligentCache {
    pub fn new(config: CacheConfig, backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            hot: HotLayer::new(config.hot_capacity, config.hot_max_age_duration()),
            backend,
            config,
            stats: AtomicCacheStats::default(),
            metrics: Arc::new(NoopMetrics),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// TTL configured for a data class
    pub fn ttl_for(&self, class: TtlClass) -> Duration {
        class.ttl(&self.config.ttl)
    }

    /// Key of `prompt` asked of `providers`
    pub fn query_key(&self, prompt: &str, providers: &[ProviderId]) -> CacheKey {
        CacheKey::query(&self.config.key_prefix, prompt, providers)
    }

    /// Key of an analysis result of `kind` over `content`
    pub fn analysis_key(&self, kind: &str, content: &str) -> CacheKey {
        CacheKey::new(
            &self.config.key_prefix,
            CacheNamespace::Analysis(kind.to_string()),
            content,
        )
    }

    pub fn summary_key(&self, id: &str) -> CacheKey {
        CacheKey::new(&self.config.key_prefix, CacheNamespace::Summary, id)
    }

    /// Look up a value; any failure is a miss
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        if !self.config.enabled {
            return None;
        }

        if let Some(payload) = self.hot.get(key.as_str()) {
            match serde_json::from_slice::<CacheEnvelope<T>>(&payload) {
                Ok(envelope) => {
                    self.stats.hot_hits.fetch_add(1, Ordering::Relaxed);
                    self.record_lookup(true);
                    debug!(%key, "Hot cache hit");
                    return Some(envelope.value);
                }
                Err(e) => {
                    self.hot.remove(key.as_str());
                    self.record_error(key, &CacheError::Serialization(e));
                }
            }
        }

        let raw = match self.backend.get(key.as_str()).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.record_lookup(false);
                return None;
            }
            Err(e) => {
                self.record_error(key, &e);
                self.record_lookup(false);
                return None;
            }
        };

        let decoded = codec::decode(&raw).and_then(|bytes| {
            let envelope = serde_json::from_slice::<CacheEnvelope<T>>(&bytes)?;
            Ok((bytes, envelope))
        });
        match decoded {
            Ok((bytes, envelope)) => {
                let remaining = envelope.remaining(Utc::now());
                self.hot.insert(key.as_str(), Arc::new(bytes), remaining);
                self.record_lookup(true);
                debug!(%key, "Cache hit");
                Some(envelope.value)
            }
            Err(e) => {
                self.record_error(key, &e);
                self.record_lookup(false);
                None
            }
        }
    }

    /// Store a value for `ttl`; returns whether the write reached the backend
    pub async fn set<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: Duration) -> bool {
        self.store(key, value, ttl, None).await
    }

    /// Store a value with the TTL of its data class
    pub async fn set_class<T: Serialize>(&self, key: &CacheKey, value: &T, class: TtlClass) -> bool {
        self.store(key, value, self.ttl_for(class), Some(class)).await
    }

    async fn store<T: Serialize>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl: Duration,
        class: Option<TtlClass>,
    ) -> bool {
        if !self.config.enabled {
            return false;
        }

        let envelope = CacheEnvelope::new(value, ttl, class);
        let encoded = serde_json::to_vec(&envelope)
            .map_err(CacheError::from)
            .and_then(|bytes| {
                codec::encode(&bytes, self.config.compression_threshold).map(|e| (bytes, e))
            });
        let (bytes, encoded) = match encoded {
            Ok(pair) => pair,
            Err(e) => {
                self.record_error(key, &e);
                return false;
            }
        };

        match self.backend.set_ex(key.as_str(), &encoded.bytes, ttl).await {
            Ok(()) => {
                self.stats.writes.fetch_add(1, Ordering::Relaxed);
                self.stats
                    .compression_saves
                    .fetch_add(encoded.saved, Ordering::Relaxed);
                self.hot.insert(key.as_str(), Arc::new(bytes), ttl);
                debug!(%key, ttl_secs = ttl.as_secs(), compressed = encoded.saved > 0, "Cached value");
                true
            }
            Err(e) => {
                // a stale hot copy must not outlive a failed overwrite
                self.hot.remove(key.as_str());
                self.record_error(key, &e);
                false
            }
        }
    }

    pub async fn delete(&self, key: &CacheKey) -> bool {
        self.hot.remove(key.as_str());
        match self.backend.delete(key.as_str()).await {
            Ok(removed) => removed,
            Err(e) => {
                self.record_error(key, &e);
                false
            }
        }
    }

    /// Whether `request_id` was already admitted within `window`
    ///
    /// The first call for an id claims it and returns `false`; repeats
    /// within the window return `true`. A backend failure claims nothing and
    /// returns `false`, so the request proceeds.
    pub async fn check_duplicate(&self, request_id: &str, window: Duration) -> bool {
        let key = CacheKey::new(&self.config.key_prefix, CacheNamespace::Dedup, request_id);
        match self.backend.set_nx_ex(key.as_str(), b"1", window).await {
            Ok(claimed) => {
                if !claimed {
                    debug!(request_id, "Duplicate request suppressed");
                }
                !claimed
            }
            Err(e) => {
                self.record_error(&key, &e);
                false
            }
        }
    }

    /// Try to take the lock on `resource_id`, held for at most `timeout`
    ///
    /// Never waits: returns `None` at once if the lock is held elsewhere or
    /// the backend is unreachable.
    pub async fn acquire_lock(&self, resource_id: &str, timeout: Duration) -> Option<CacheLock> {
        let key = CacheKey::new(&self.config.key_prefix, CacheNamespace::Lock, resource_id);
        let token = uuid::Uuid::new_v4().to_string();
        match self
            .backend
            .set_nx_ex(key.as_str(), token.as_bytes(), timeout)
            .await
        {
            Ok(true) => {
                debug!(resource_id, "Lock acquired");
                Some(CacheLock {
                    backend: self.backend.clone(),
                    key,
                    token,
                })
            }
            Ok(false) => None,
            Err(e) => {
                self.record_error(&key, &e);
                None
            }
        }
    }

    /// Delete every key matching a glob, in both layers
    pub async fn invalidate(&self, pattern: &str) -> u64 {
        match glob_to_regex(pattern) {
            Ok(matcher) => {
                self.hot.remove_matching(&matcher);
            }
            Err(e) => {
                warn!(pattern, "Cannot invalidate hot entries: {}", e);
                self.hot.clear();
            }
        }
        match self.backend.delete_pattern(pattern).await {
            Ok(removed) => {
                debug!(pattern, removed, "Invalidated cache entries");
                removed
            }
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                warn!(pattern, "Cache invalidation failed: {}", e);
                0
            }
        }
    }

    /// Drop every entry of a namespace
    pub async fn invalidate_namespace(&self, namespace: &CacheNamespace) -> u64 {
        self.invalidate(&CacheKey::namespace_pattern(&self.config.key_prefix, namespace))
            .await
    }

    /// Expire stale entries eagerly in both layers
    pub async fn sweep(&self) -> usize {
        self.hot.purge_expired() + self.backend.sweep().await
    }

    /// Whether the backend answers
    pub async fn ping(&self) -> bool {
        match self.backend.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!(backend = self.backend.name(), "Cache backend ping failed: {}", e);
                false
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.hot.len())
    }

    fn record_lookup(&self, hit: bool) {
        let counter = if hit {
            &self.stats.hits
        } else {
            &self.stats.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.metrics.cache_lookup(hit);
    }

    fn record_error(&self, key: &CacheKey, error: &CacheError) {
        self.stats.errors.fetch_add(1, Ordering::Relaxed);
        warn!(%key, backend = self.backend.name(), "Cache operation failed: {}", error);
    }
}

/// A held lock on a shared resource
///
/// Expires on its own after the timeout it was taken with. `release` frees
/// it early, and only if this holder still owns it.
pub struct CacheLock {
    backend: Arc<dyn CacheBackend>,
    key: CacheKey,
    token: String,
}

impl CacheLock {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Release the lock; returns `false` if it had already expired or been
    /// taken over
    pub async fn release(self) -> bool {
        match self
            .backend
            .compare_and_delete(self.key.as_str(), self.token.as_bytes())
            .await
        {
            Ok(released) => released,
            Err(e) => {
                warn!(key = %self.key, "Failed to release lock: {}", e);
                false
            }
        }
    }
}

impl std::fmt::Debug for CacheLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheLock").field("key", &self.key).finish()
    }
}
