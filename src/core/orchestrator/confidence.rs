//! Confidence heuristic
//!
//! `weight * success_rate * response_time_factor * content_length_factor`,
//! clamped to [0, 1]. This is a heuristic ranking, not a calibrated
//! probability.

use crate::config::ConfidenceConfig;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct ConfidenceScorer {
    config: ConfidenceConfig,
}

impl ConfidenceScorer {
    pub fn new(config: ConfidenceConfig) -> Self {
        Self { config }
    }

    /// Score one reply
    pub fn score(
        &self,
        weight: f64,
        success_rate: f64,
        elapsed: Duration,
        timeout: Duration,
        text: &str,
    ) -> f64 {
        let raw = weight
            * success_rate
            * self.response_time_factor(elapsed, timeout)
            * self.content_length_factor(text.chars().count());
        if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) }
    }

    /// 1 for an instant reply, falling linearly to the floor at twice the
    /// timeout
    pub fn response_time_factor(&self, elapsed: Duration, timeout: Duration) -> f64 {
        let floor = self.config.response_time_floor.clamp(0.0, 1.0);
        if timeout.is_zero() {
            return floor;
        }
        let ratio = elapsed.as_secs_f64() / (2.0 * timeout.as_secs_f64());
        (1.0 - ratio).clamp(floor, 1.0)
    }

    /// 0 for an empty reply, otherwise growing with length up to 1
    pub fn content_length_factor(&self, chars: usize) -> f64 {
        if chars == 0 {
            return 0.0;
        }
        let target = self.config.target_length.max(1) as f64;
        (self.config.min_length_factor + chars as f64 / target).min(1.0)
    }
}
