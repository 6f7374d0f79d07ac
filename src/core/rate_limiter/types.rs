//! Rate limiter types and data structures

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Rate limit result
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    /// Whether the request is allowed
    pub allowed: bool,
    /// Request count in the window, including this one if recorded
    pub current_count: u32,
    /// Maximum requests allowed
    pub limit: u32,
    /// Remaining requests in the window
    pub remaining: u32,
    /// Time until the oldest entry leaves the window (only set when denied)
    pub retry_after: Option<Duration>,
    /// Timestamp recorded for this request, used to roll it back
    pub recorded_at: Option<Instant>,
}

impl RateLimitResult {
    pub(super) fn unlimited() -> Self {
        Self {
            allowed: true,
            current_count: 0,
            limit: u32::MAX,
            remaining: u32::MAX,
            retry_after: None,
            recorded_at: None,
        }
    }
}

/// Call timestamps of one caller, oldest first
#[derive(Debug, Default)]
pub(super) struct RateWindow {
    pub(super) timestamps: VecDeque<Instant>,
}

impl RateWindow {
    /// Drop timestamps at or before `window_start`
    pub(super) fn prune(&mut self, window_start: Option<Instant>) {
        let Some(window_start) = window_start else {
            return;
        };
        while self
            .timestamps
            .front()
            .is_some_and(|&t| t <= window_start)
        {
            self.timestamps.pop_front();
        }
    }
}
