//! Error handling for the gateway
//!
//! This module defines the crate-level error type. Only policy denials
//! (rate, cost, circuit exhaustion), configuration problems and I/O reach
//! callers through it; provider failures are absorbed into health scoring.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for the gateway
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type for the gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Redis errors
    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// The caller exhausted its sliding-window or the global concurrency budget
    #[error("Rate limit exceeded for {caller}: retry after {}s", retry_after.as_secs())]
    RateLimited {
        caller: String,
        retry_after: Duration,
    },

    /// The caller's cost budget would be exceeded; needs operator action
    #[error("Cost limit exceeded for {caller} ({period} budget)")]
    CostLimitExceeded { caller: String, period: String },

    /// Every candidate provider has an open circuit
    #[error("All provider circuits are open: retry after {}s", retry_after.as_secs())]
    AllCircuitsOpen { retry_after: Duration },

    /// No provider is registered at all
    #[error("No providers configured")]
    NoProviders,

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the caller may retry the same request later without changes
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::AllCircuitsOpen { .. }
        )
    }

    /// Suggested delay before retrying, when one is known
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } | Self::AllCircuitsOpen { retry_after } => {
                Some(*retry_after)
            }
            _ => None,
        }
    }
}
