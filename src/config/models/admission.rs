//! Admission control configuration: rate limiting, circuit breaking and cost budgets

use super::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Combined admission policy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdmissionConfig {
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
    #[serde(default)]
    pub cost: CostConfig,
}

/// Sliding-window rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Enable per-caller rate limiting
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Calls a caller may make per window
    #[serde(default = "default_customer_limit")]
    pub customer_limit: u32,
    /// Sliding window length in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// Outbound calls in flight across all callers
    #[serde(default = "default_max_concurrent_calls")]
    pub max_concurrent_calls: usize,
    /// Per-caller limit overrides
    #[serde(default)]
    pub overrides: HashMap<String, u32>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            customer_limit: default_customer_limit(),
            window_secs: default_window_secs(),
            max_concurrent_calls: default_max_concurrent_calls(),
            overrides: HashMap::new(),
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Limit applying to `caller`
    pub fn limit_for(&self, caller: &str) -> u32 {
        self.overrides
            .get(caller)
            .copied()
            .unwrap_or(self.customer_limit)
    }
}

/// Per-provider circuit breaker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Seconds an open circuit waits after the last failure before probing
    #[serde(default = "default_recovery_timeout")]
    pub recovery_timeout: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            recovery_timeout: default_recovery_timeout(),
        }
    }
}

impl CircuitBreakerConfig {
    pub fn recovery_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.recovery_timeout)
    }
}

/// Spend ceilings for one caller, in USD
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostLimits {
    #[serde(default = "default_hourly_limit")]
    pub hourly: f64,
    #[serde(default = "default_daily_limit")]
    pub daily: f64,
    #[serde(default = "default_monthly_limit")]
    pub monthly: f64,
}

impl Default for CostLimits {
    fn default() -> Self {
        Self {
            hourly: default_hourly_limit(),
            daily: default_daily_limit(),
            monthly: default_monthly_limit(),
        }
    }
}

/// Cost budget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostConfig {
    /// Enable cost budgets
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Default limits applied to every caller
    #[serde(default)]
    pub limits: CostLimits,
    /// Per-caller limit overrides
    #[serde(default)]
    pub overrides: HashMap<String, CostLimits>,
    /// Fraction of a limit at which an alert fires
    #[serde(default = "default_alert_ratio")]
    pub alert_ratio: f64,
    /// Price per 1K tokens for models missing from `model_prices`
    #[serde(default = "default_price_per_1k")]
    pub default_price_per_1k: f64,
    /// Price per 1K tokens by model name
    #[serde(default)]
    pub model_prices: HashMap<String, f64>,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            limits: CostLimits::default(),
            overrides: HashMap::new(),
            alert_ratio: default_alert_ratio(),
            default_price_per_1k: default_price_per_1k(),
            model_prices: HashMap::new(),
        }
    }
}

impl CostConfig {
    pub fn limits_for(&self, caller: &str) -> CostLimits {
        self.overrides.get(caller).copied().unwrap_or(self.limits)
    }
}
