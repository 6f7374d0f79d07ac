//! Cache manager type definitions

use crate::config::TtlPolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Data class deciding how long an entry lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TtlClass {
    /// Raw provider responses
    ProviderResponse,
    /// Post-analysis results
    Analysis,
    /// Aggregate summaries
    Summary,
}

impl TtlClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TtlClass::ProviderResponse => "provider_response",
            TtlClass::Analysis => "analysis",
            TtlClass::Summary => "summary",
        }
    }

    /// TTL of this class under `policy`
    pub fn ttl(&self, policy: &TtlPolicy) -> Duration {
        let secs = match self {
            TtlClass::ProviderResponse => policy.provider_response,
            TtlClass::Analysis => policy.analysis,
            TtlClass::Summary => policy.summary,
        };
        Duration::from_secs(secs)
    }
}

impl fmt::Display for TtlClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What is serialized into the backend: the value plus its metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct CacheEnvelope<T> {
    pub cached_at: DateTime<Utc>,
    pub ttl_ms: u64,
    #[serde(default)]
    pub ttl_class: Option<TtlClass>,
    pub value: T,
}

impl<T> CacheEnvelope<T> {
    pub fn new(value: T, ttl: Duration, ttl_class: Option<TtlClass>) -> Self {
        Self {
            cached_at: Utc::now(),
            ttl_ms: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
            ttl_class,
            value,
        }
    }

    /// Lifetime left in the backend, measured from now
    ///
    /// A TTL reaching past the representable calendar never runs out.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        let expires_at = i64::try_from(self.ttl_ms)
            .ok()
            .and_then(chrono::Duration::try_milliseconds)
            .and_then(|ttl| self.cached_at.checked_add_signed(ttl));
        match expires_at {
            Some(expires_at) => (expires_at - now).to_std().unwrap_or(Duration::ZERO),
            None => Duration::MAX,
        }
    }
}

/// Lock-free counters updated on the hot path
#[derive(Debug, Default)]
pub(super) struct AtomicCacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub hot_hits: AtomicU64,
    pub writes: AtomicU64,
    pub errors: AtomicU64,
    pub compression_saves: AtomicU64,
}

impl AtomicCacheStats {
    pub fn snapshot(&self, hot_cache_size: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            hot_hits: self.hot_hits.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            compression_saves: self.compression_saves.load(Ordering::Relaxed),
            hot_cache_size,
        }
    }
}

/// Cache statistics snapshot
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups answered, from either layer
    pub hits: u64,
    pub misses: u64,
    /// Hits answered by the hot layer alone
    pub hot_hits: u64,
    pub writes: u64,
    /// Backend or codec errors degraded to a miss or no-op
    pub errors: u64,
    /// Bytes saved by compression across all writes
    pub compression_saves: u64,
    /// Entries currently in the hot layer
    pub hot_cache_size: usize,
}

impl CacheStats {
    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
