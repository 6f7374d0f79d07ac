//! Circuit breaker implementation for fault tolerance

use super::types::{CallDecision, CircuitBreakerMetrics, CircuitState, CircuitTransition};
use crate::config::CircuitBreakerConfig;
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How long a caller should wait while the half-open trial is in flight
const TRIAL_IN_FLIGHT_RETRY: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    last_failure: Option<Instant>,
    trial_in_flight: bool,
}

/// Circuit breaker guarding one provider
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    recovery_timeout: Duration,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker
    pub fn new(failure_threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            recovery_timeout,
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure: None,
                trial_in_flight: false,
            }),
        }
    }

    pub fn from_config(config: &CircuitBreakerConfig) -> Self {
        Self::new(
            config.failure_threshold,
            config.recovery_timeout_duration(),
        )
    }

    /// Ask permission to call; may advance OPEN to HALF_OPEN
    pub fn try_acquire(&self) -> (CallDecision, Option<CircuitTransition>) {
        self.try_acquire_at(Instant::now())
    }

    pub fn try_acquire_at(&self, now: Instant) -> (CallDecision, Option<CircuitTransition>) {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => (CallDecision::Allowed { trial: false }, None),
            CircuitState::Open => {
                let elapsed = inner
                    .last_failure
                    .map(|t| now.saturating_duration_since(t))
                    .unwrap_or(self.recovery_timeout);
                if elapsed >= self.recovery_timeout {
                    debug!("Circuit breaker transitioning from Open to HalfOpen");
                    inner.state = CircuitState::HalfOpen;
                    inner.trial_in_flight = true;
                    (
                        CallDecision::Allowed { trial: true },
                        Some(CircuitTransition {
                            from: CircuitState::Open,
                            to: CircuitState::HalfOpen,
                        }),
                    )
                } else {
                    (
                        CallDecision::Rejected {
                            retry_after: self.recovery_timeout - elapsed,
                        },
                        None,
                    )
                }
            }
            CircuitState::HalfOpen => {
                if inner.trial_in_flight {
                    (
                        CallDecision::Rejected {
                            retry_after: TRIAL_IN_FLIGHT_RETRY,
                        },
                        None,
                    )
                } else {
                    inner.trial_in_flight = true;
                    (CallDecision::Allowed { trial: true }, None)
                }
            }
        }
    }

    /// Handle successful request
    pub fn record_success(&self) -> Option<CircuitTransition> {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.failure_count = 0;
                None
            }
            CircuitState::HalfOpen => {
                debug!("Circuit breaker transitioning from HalfOpen to Closed");
                inner.state = CircuitState::Closed;
                inner.failure_count = 0;
                inner.trial_in_flight = false;
                inner.last_failure = None;
                Some(CircuitTransition {
                    from: CircuitState::HalfOpen,
                    to: CircuitState::Closed,
                })
            }
            // a straggler admitted before the circuit opened
            CircuitState::Open => None,
        }
    }

    /// Handle failed request
    pub fn record_failure(&self) -> Option<CircuitTransition> {
        self.record_failure_at(Instant::now())
    }

    pub fn record_failure_at(&self, now: Instant) -> Option<CircuitTransition> {
        let mut inner = self.inner.lock();
        inner.last_failure = Some(now);
        match inner.state {
            CircuitState::Closed => {
                inner.failure_count = inner.failure_count.saturating_add(1);
                if inner.failure_count >= self.failure_threshold {
                    warn!(
                        "Circuit breaker opening after {} consecutive failures",
                        inner.failure_count
                    );
                    inner.state = CircuitState::Open;
                    Some(CircuitTransition {
                        from: CircuitState::Closed,
                        to: CircuitState::Open,
                    })
                } else {
                    None
                }
            }
            CircuitState::HalfOpen => {
                warn!("Circuit breaker trial call failed, reopening");
                inner.state = CircuitState::Open;
                inner.trial_in_flight = false;
                Some(CircuitTransition {
                    from: CircuitState::HalfOpen,
                    to: CircuitState::Open,
                })
            }
            CircuitState::Open => None,
        }
    }

    /// Release the half-open trial slot without recording an outcome
    pub fn abandon_trial(&self) {
        let mut inner = self.inner.lock();
        if inner.state == CircuitState::HalfOpen {
            inner.trial_in_flight = false;
        }
    }

    /// Get current circuit breaker state
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub fn failure_count(&self) -> u32 {
        self.inner.lock().failure_count
    }

    /// Get current metrics
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let inner = self.inner.lock();
        CircuitBreakerMetrics {
            state: inner.state,
            failure_count: inner.failure_count,
            trial_in_flight: inner.trial_in_flight,
        }
    }

    /// Time until an open circuit would admit a trial call
    pub fn remaining_open_time(&self) -> Option<Duration> {
        let inner = self.inner.lock();
        if inner.state != CircuitState::Open {
            return None;
        }
        let elapsed = inner.last_failure.map(|t| t.elapsed())?;
        Some(self.recovery_timeout.saturating_sub(elapsed))
    }

    /// Reset the circuit breaker
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.last_failure = None;
        inner.trial_in_flight = false;
        debug!("Circuit breaker reset");
    }
}
