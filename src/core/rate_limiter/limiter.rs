//! Core rate limiter implementation

use super::types::{RateLimitResult, RateWindow};
use crate::config::RateLimitConfig;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

const MIN_RETRY_AFTER: Duration = Duration::from_millis(1);

/// Rate limiter implementation
///
/// Windows live in a sharded map, so callers only contend with requests
/// carrying the same caller id.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: DashMap<String, RateWindow>,
    window: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimitConfig) -> Self {
        let window = config.window();
        Self::with_window(config, window)
    }

    /// Create a rate limiter with custom window
    pub fn with_window(config: RateLimitConfig, window: Duration) -> Self {
        Self {
            config,
            windows: DashMap::new(),
            window,
        }
    }

    /// Atomically check and record a request
    pub fn check_and_record(&self, caller: &str) -> RateLimitResult {
        self.check_and_record_at(caller, Instant::now())
    }

    pub fn check_and_record_at(&self, caller: &str, now: Instant) -> RateLimitResult {
        if !self.config.enabled {
            return RateLimitResult::unlimited();
        }
        let limit = self.config.limit_for(caller);

        let mut window = match self.windows.get_mut(caller) {
            Some(w) => w,
            None => self.windows.entry(caller.to_string()).or_default(),
        };
        window.prune(now.checked_sub(self.window));

        let current_count = window.timestamps.len() as u32;
        if current_count >= limit {
            let retry_after = window
                .timestamps
                .front()
                .map(|&oldest| self.window.saturating_sub(now.saturating_duration_since(oldest)))
                .unwrap_or(self.window)
                .max(MIN_RETRY_AFTER);
            debug!(
                "Rate limit exceeded for {}: {}/{} requests",
                caller, current_count, limit
            );
            return RateLimitResult {
                allowed: false,
                current_count,
                limit,
                remaining: 0,
                retry_after: Some(retry_after),
                recorded_at: None,
            };
        }

        window.timestamps.push_back(now);
        RateLimitResult {
            allowed: true,
            current_count: current_count + 1,
            limit,
            remaining: limit - current_count - 1,
            retry_after: None,
            recorded_at: Some(now),
        }
    }

    /// Current window status for a caller, without recording
    pub fn check(&self, caller: &str) -> RateLimitResult {
        if !self.config.enabled {
            return RateLimitResult::unlimited();
        }
        let now = Instant::now();
        let limit = self.config.limit_for(caller);
        let window_start = now.checked_sub(self.window);
        let current_count = self
            .windows
            .get(caller)
            .map(|w| {
                w.timestamps
                    .iter()
                    .filter(|&&t| window_start.is_none_or(|start| t > start))
                    .count() as u32
            })
            .unwrap_or(0);

        RateLimitResult {
            allowed: current_count < limit,
            current_count,
            limit,
            remaining: limit.saturating_sub(current_count),
            retry_after: None,
            recorded_at: None,
        }
    }

    /// Remove a previously recorded request from the caller's window
    pub fn rollback(&self, caller: &str, recorded_at: Instant) {
        if let Some(mut window) = self.windows.get_mut(caller) {
            if let Some(pos) = window.timestamps.iter().rposition(|&t| t == recorded_at) {
                window.timestamps.remove(pos);
            }
        }
    }

    /// Cleanup expired entries, dropping idle callers
    ///
    /// Returns the number of callers removed.
    pub fn cleanup(&self) -> usize {
        let window_start = Instant::now().checked_sub(self.window);
        let before = self.windows.len();
        self.windows.retain(|_, window| {
            window.prune(window_start);
            !window.timestamps.is_empty()
        });
        before.saturating_sub(self.windows.len())
    }

    /// Check if rate limiting is enabled
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Get the limit applying to a caller
    pub fn limit_for(&self, caller: &str) -> u32 {
        self.config.limit_for(caller)
    }

    /// Number of callers with a live window
    pub fn tracked_callers(&self) -> usize {
        self.windows.len()
    }
}
