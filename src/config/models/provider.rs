//! Provider configuration

use super::*;
use crate::core::providers::ProviderId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Static configuration of one upstream provider
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider identity
    pub id: ProviderId,
    /// Base URL of the API
    #[serde(default)]
    pub endpoint: String,
    /// Model requested from the provider
    #[serde(default)]
    pub model: String,
    /// API key; never serialized back out
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Lower value = preferred
    #[serde(default)]
    pub priority: u32,
    /// Confidence multiplier in [0, 1]
    #[serde(default)]
    pub weight: f64,
    /// Completion token ceiling per call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Per-call timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Retries after the first attempt on retryable errors
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
}

impl ProviderConfig {
    /// Configuration with the provider's stock endpoint, model, priority and weight
    pub fn for_provider(id: ProviderId) -> Self {
        Self {
            id,
            endpoint: id.default_endpoint().to_string(),
            model: id.default_model().to_string(),
            api_key: None,
            priority: id.default_priority(),
            weight: id.default_weight(),
            max_tokens: default_max_tokens(),
            timeout: default_timeout(),
            retry_count: default_retry_count(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout = timeout_secs;
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    /// Fill fields left empty in a config file with the provider's stock values
    pub fn with_stock_defaults(mut self) -> Self {
        if self.endpoint.is_empty() {
            self.endpoint = self.id.default_endpoint().to_string();
        }
        if self.model.is_empty() {
            self.model = self.id.default_model().to_string();
        }
        if self.priority == 0 {
            self.priority = self.id.default_priority();
        }
        if self.weight == 0.0 {
            self.weight = self.id.default_weight();
        }
        self
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
