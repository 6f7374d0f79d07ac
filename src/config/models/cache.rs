//! Cache configuration

use super::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backing store for the response cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackendKind {
    /// In-process store
    #[default]
    Memory,
    /// Shared Redis store
    Redis,
}

/// TTL per data class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtlPolicy {
    /// Raw provider responses
    #[serde(default = "default_response_ttl")]
    pub provider_response: u64,
    /// Post-analysis results
    #[serde(default = "default_analysis_ttl")]
    pub analysis: u64,
    /// Aggregate summaries
    #[serde(default = "default_summary_ttl")]
    pub summary: u64,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            provider_response: default_response_ttl(),
            analysis: default_analysis_ttl(),
            summary: default_summary_ttl(),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Enable caching
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Backing store
    #[serde(default)]
    pub backend: CacheBackendKind,
    /// Redis connection URL when `backend` is `redis`
    #[serde(default)]
    pub redis_url: Option<String>,
    /// Prefix of every key written
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Payloads at least this large are compressed
    #[serde(default = "default_compression_threshold")]
    pub compression_threshold: usize,
    /// Entries kept in the in-process hot layer
    #[serde(default = "default_hot_capacity")]
    pub hot_capacity: usize,
    /// Seconds a hot entry stays valid
    #[serde(default = "default_hot_max_age")]
    pub hot_max_age: u64,
    /// TTL tiers
    #[serde(default)]
    pub ttl: TtlPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackendKind::default(),
            redis_url: None,
            key_prefix: default_key_prefix(),
            compression_threshold: default_compression_threshold(),
            hot_capacity: default_hot_capacity(),
            hot_max_age: default_hot_max_age(),
            ttl: TtlPolicy::default(),
        }
    }
}

impl CacheConfig {
    pub fn hot_max_age_duration(&self) -> Duration {
        Duration::from_secs(self.hot_max_age)
    }
}
