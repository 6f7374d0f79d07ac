//! Fallback orchestrator configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How candidate providers are dispatched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// All admitted providers are called concurrently
    #[default]
    Parallel,
    /// Providers are tried one at a time in priority order
    Sequential,
}

/// Confidence heuristic weights
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Lowest value the response-time factor may take
    pub response_time_floor: f64,
    /// Length factor for a one-character response
    pub min_length_factor: f64,
    /// Response length in characters at which the length factor saturates
    pub target_length: usize,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            response_time_floor: 0.5,
            min_length_factor: 0.3,
            target_length: 400,
        }
    }
}

/// Orchestrator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub dispatch_mode: DispatchMode,
    /// Upper bound on admitted providers dispatched for one query
    ///
    /// Providers denied admission do not count against it.
    pub max_parallel_providers: usize,
    /// Confidence required when the caller does not pass one
    pub default_required_confidence: f64,
    /// Base delay between retries of one provider, in milliseconds
    pub retry_base_delay_ms: u64,
    /// Cap on the retry delay, in milliseconds
    pub retry_max_delay_ms: u64,
    /// Characters per token when estimating prompt size
    pub chars_per_token: usize,
    pub confidence: ConfidenceConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            dispatch_mode: DispatchMode::default(),
            max_parallel_providers: 4,
            default_required_confidence: 0.7,
            retry_base_delay_ms: 250,
            retry_max_delay_ms: 2_000,
            chars_per_token: 4,
            confidence: ConfidenceConfig::default(),
        }
    }
}

impl OrchestratorConfig {
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }
}
