//! Orchestrator result types

use crate::core::providers::ProviderId;
use serde::{Deserialize, Serialize};

/// One answer returned to a caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Provider that produced the text; `None` for the degraded sentinel
    pub provider: Option<ProviderId>,
    pub text: String,
    /// Confidence in [0, 1]
    pub confidence: f64,
    pub response_time_ms: u64,
    pub tokens_used: Option<u32>,
    /// Served from the cache
    #[serde(default)]
    pub cached: bool,
    /// Set only on the degraded sentinel
    #[serde(default)]
    pub partial: bool,
}

impl LlmResponse {
    /// Sentinel returned when no provider produced an answer
    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            provider: None,
            text: message.into(),
            confidence: 0.0,
            response_time_ms: 0,
            tokens_used: None,
            cached: false,
            partial: true,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.partial
    }
}

/// Replies collected from several providers for one prompt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResponse {
    /// Successful replies in arrival order
    pub responses: Vec<LlmResponse>,
    /// Mean confidence of `responses`; 0 when empty
    pub consensus_confidence: f64,
    /// Providers whose call failed or timed out
    pub failed_providers: Vec<ProviderId>,
    /// Providers refused by admission control
    pub skipped_providers: Vec<ProviderId>,
}

impl AggregatedResponse {
    pub(super) fn consensus(responses: &[LlmResponse]) -> f64 {
        if responses.is_empty() {
            return 0.0;
        }
        responses.iter().map(|r| r.confidence).sum::<f64>() / responses.len() as f64
    }
}
