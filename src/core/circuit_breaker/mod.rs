//! Per-provider circuit breaker
//!
//! CLOSED -> OPEN after a run of consecutive failures, OPEN -> HALF_OPEN once
//! the recovery timeout has elapsed since the last failure, and HALF_OPEN
//! admits exactly one trial call whose outcome closes or re-opens the circuit.
//! There is no terminal state.

mod breaker;
mod types;

pub use breaker::CircuitBreaker;
pub use types::{CallDecision, CircuitBreakerMetrics, CircuitState, CircuitTransition};
