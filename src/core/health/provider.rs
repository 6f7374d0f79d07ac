//! Provider health record
//!
//! The update rules are a heuristic, not a statistical guarantee: success
//! nudges the success rate up by a fixed gain, failure decays it by a fixed
//! factor, and two thresholds decide health. No SLA is implied.

use super::types::HealthSnapshot;
use crate::config::HealthConfig;
use crate::core::providers::ProviderId;
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

/// Health change caused by one recorded outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthTransition {
    Unchanged,
    BecameHealthy,
    BecameUnhealthy,
}

/// Mutable health record of one provider
#[derive(Debug, Clone)]
pub struct ProviderHealth {
    pub provider: ProviderId,
    /// Registry priority, lower is preferred
    pub priority: u32,
    pub healthy: bool,
    pub success_rate: f64,
    pub avg_response_time_ms: f64,
    pub consecutive_failures: u32,
    pub last_check: Instant,
    pub last_check_at: DateTime<Utc>,
    pub last_error: Option<String>,
    samples: u64,
}

impl ProviderHealth {
    pub fn new(provider: ProviderId, priority: u32) -> Self {
        Self {
            provider,
            priority,
            healthy: true,
            success_rate: 1.0,
            avg_response_time_ms: 0.0,
            consecutive_failures: 0,
            last_check: Instant::now(),
            last_check_at: Utc::now(),
            last_error: None,
            samples: 0,
        }
    }

    /// Record a successful call
    pub fn record_success(&mut self, latency: Duration, policy: &HealthConfig) -> HealthTransition {
        let sample = latency.as_secs_f64() * 1000.0;
        self.avg_response_time_ms = if self.samples == 0 {
            sample
        } else {
            self.avg_response_time_ms * (1.0 - policy.latency_smoothing)
                + sample * policy.latency_smoothing
        };
        self.samples += 1;
        self.success_rate = (self.success_rate * policy.success_gain).min(1.0);
        self.consecutive_failures = 0;
        self.touch();
        self.reevaluate(policy)
    }

    /// Record a failed call
    pub fn record_failure(&mut self, error: &str, policy: &HealthConfig) -> HealthTransition {
        self.success_rate *= policy.failure_decay;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_error = Some(error.to_string());
        self.touch();
        self.reevaluate(policy)
    }

    /// Restore the pristine record, keeping identity and priority
    pub fn reset(&mut self) {
        *self = Self::new(self.provider, self.priority);
    }

    /// Healthy, or unhealthy but unchecked for longer than `stale_after`
    pub fn is_available_at(&self, now: Instant, stale_after: Duration) -> bool {
        self.healthy || now.saturating_duration_since(self.last_check) > stale_after
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            provider: self.provider,
            healthy: self.healthy,
            success_rate: self.success_rate,
            avg_response_time_ms: self.avg_response_time_ms,
            consecutive_failures: self.consecutive_failures,
            last_check: self.last_check_at,
            last_error: self.last_error.clone(),
        }
    }

    fn touch(&mut self) {
        self.last_check = Instant::now();
        self.last_check_at = Utc::now();
    }

    fn reevaluate(&mut self, policy: &HealthConfig) -> HealthTransition {
        let healthy = self.consecutive_failures <= policy.unhealthy_after_failures
            && self.success_rate >= policy.min_success_rate;
        let transition = match (self.healthy, healthy) {
            (false, true) => HealthTransition::BecameHealthy,
            (true, false) => HealthTransition::BecameUnhealthy,
            _ => HealthTransition::Unchanged,
        };
        self.healthy = healthy;
        transition
    }
}
