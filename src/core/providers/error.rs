//! Provider-local error type
//!
//! These errors never reach a gateway caller directly: they are scored into
//! the failing provider's health and circuit breaker, and the orchestrator
//! moves on to the next candidate.
//!
//! | Variant | Retryable |
//! |------|--------|
//! | Timeout | Yes |
//! | Network | Yes |
//! | RateLimited | Yes |
//! | Http 5xx / 429 | Yes |
//! | Http other | No |
//! | InvalidResponse | No |
//! | NotConfigured | No |

use super::types::ProviderId;
use std::time::Duration;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("{provider} timed out after {}ms", elapsed.as_millis())]
    Timeout {
        provider: ProviderId,
        elapsed: Duration,
    },

    #[error("{provider} returned HTTP {status}: {message}")]
    Http {
        provider: ProviderId,
        status: u16,
        message: String,
    },

    #[error("{provider} rate limited the request")]
    RateLimited {
        provider: ProviderId,
        retry_after: Option<Duration>,
    },

    #[error("Network error for {provider}: {message}")]
    Network {
        provider: ProviderId,
        message: String,
    },

    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse {
        provider: ProviderId,
        message: String,
    },

    #[error("{provider} is not configured: {message}")]
    NotConfigured {
        provider: ProviderId,
        message: String,
    },
}

impl ProviderError {
    pub fn timeout(provider: ProviderId, elapsed: Duration) -> Self {
        Self::Timeout { provider, elapsed }
    }

    pub fn http(provider: ProviderId, status: u16, message: impl Into<String>) -> Self {
        if status == 429 {
            return Self::RateLimited {
                provider,
                retry_after: None,
            };
        }
        Self::Http {
            provider,
            status,
            message: message.into(),
        }
    }

    pub fn network(provider: ProviderId, message: impl Into<String>) -> Self {
        Self::Network {
            provider,
            message: message.into(),
        }
    }

    pub fn invalid_response(provider: ProviderId, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider,
            message: message.into(),
        }
    }

    pub fn not_configured(provider: ProviderId, message: impl Into<String>) -> Self {
        Self::NotConfigured {
            provider,
            message: message.into(),
        }
    }

    /// Map a reqwest transport error
    pub fn from_reqwest(provider: ProviderId, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                provider,
                elapsed: Duration::ZERO,
            }
        } else if err.is_decode() {
            Self::invalid_response(provider, err.to_string())
        } else if let Some(status) = err.status() {
            Self::http(provider, status.as_u16(), err.to_string())
        } else {
            Self::network(provider, err.to_string())
        }
    }

    pub fn provider(&self) -> ProviderId {
        match self {
            Self::Timeout { provider, .. }
            | Self::Http { provider, .. }
            | Self::RateLimited { provider, .. }
            | Self::Network { provider, .. }
            | Self::InvalidResponse { provider, .. }
            | Self::NotConfigured { provider, .. } => *provider,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Network { .. } | Self::RateLimited { .. } => true,
            Self::Http { status, .. } => matches!(*status, 429 | 500..=599),
            Self::InvalidResponse { .. } | Self::NotConfigured { .. } => false,
        }
    }

    /// Provider-suggested backoff, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}
