//! Health monitor policy

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Heuristic thresholds for marking providers unhealthy
///
/// These numbers are policy, not a statistical guarantee.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// A provider is unhealthy once consecutive failures exceed this
    pub unhealthy_after_failures: u32,
    /// A provider is unhealthy once its smoothed success rate drops below this
    pub min_success_rate: f64,
    /// Unhealthy providers not checked for this many seconds are retried
    pub stale_after_secs: u64,
    /// Multiplicative gain applied to the success rate on success
    pub success_gain: f64,
    /// Multiplicative decay applied to the success rate on failure
    pub failure_decay: f64,
    /// Weight of a new latency sample in the moving average
    pub latency_smoothing: f64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            unhealthy_after_failures: 5,
            min_success_rate: 0.3,
            stale_after_secs: 300,
            success_gain: 1.01,
            failure_decay: 0.9,
            latency_smoothing: 0.1,
        }
    }
}

impl HealthConfig {
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }
}
