//! Admission decision types

use super::permit::AdmissionPermit;
use crate::core::cost::CostPeriod;
use crate::core::providers::CallerId;
use crate::utils::error::GatewayError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Machine-readable reason for refusing a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// The caller's sliding window is full
    RateLimited,
    /// The global concurrent-call budget is exhausted
    ConcurrencyExhausted,
    /// The call would push the caller past a cost threshold
    CostLimitExceeded,
    /// The provider's circuit is open
    CircuitOpen,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::RateLimited => "rate_limited",
            DenialReason::ConcurrencyExhausted => "concurrency_exhausted",
            DenialReason::CostLimitExceeded => "cost_limit_exceeded",
            DenialReason::CircuitOpen => "circuit_open",
        }
    }

    /// Rank used to pick the error reported when every provider was denied
    ///
    /// Higher wins: a cost denial needs operator action and outranks
    /// anything retryable.
    pub(crate) fn severity(&self) -> u8 {
        match self {
            DenialReason::CostLimitExceeded => 3,
            DenialReason::RateLimited => 2,
            DenialReason::ConcurrencyExhausted => 1,
            DenialReason::CircuitOpen => 0,
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A refused call
#[derive(Debug, Clone, PartialEq)]
pub struct Denial {
    pub reason: DenialReason,
    /// How long the caller should wait, when the gate can tell
    pub retry_after: Option<Duration>,
    /// Budget period that refused the call (cost denials only)
    pub period: Option<CostPeriod>,
    pub message: String,
}

impl Denial {
    pub(crate) fn new(
        reason: DenialReason,
        retry_after: Option<Duration>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            reason,
            retry_after,
            period: None,
            message: message.into(),
        }
    }

    /// Caller-visible error for this denial
    pub fn into_error(self, caller: &CallerId) -> GatewayError {
        let retry_after = self.retry_after.unwrap_or(Duration::from_secs(1));
        match self.reason {
            DenialReason::RateLimited | DenialReason::ConcurrencyExhausted => {
                GatewayError::RateLimited {
                    caller: caller.to_string(),
                    retry_after,
                }
            }
            DenialReason::CostLimitExceeded => GatewayError::CostLimitExceeded {
                caller: caller.to_string(),
                period: self
                    .period
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
            },
            DenialReason::CircuitOpen => GatewayError::AllCircuitsOpen { retry_after },
        }
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reason, self.message)
    }
}

/// Outcome of an admission check
#[derive(Debug)]
pub enum Admission {
    Allow(AdmissionPermit),
    Deny(Denial),
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allow(_))
    }
}

/// Result of an admitted provider call, fed back through `settle`
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    Success {
        latency: Duration,
        /// Tokens the provider reported; the estimate stands when absent
        tokens_used: Option<u32>,
    },
    Failure {
        latency: Duration,
        error: String,
    },
}

impl CallOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Success { .. })
    }

    pub fn latency(&self) -> Duration {
        match self {
            CallOutcome::Success { latency, .. } | CallOutcome::Failure { latency, .. } => *latency,
        }
    }
}
