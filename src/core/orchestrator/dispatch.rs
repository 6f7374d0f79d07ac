//! One provider call: timeout and retry
//!
//! Retries happen inside a single overall timeout, so a slow provider can
//! never hold a query longer than its configured limit. The caller sees one
//! outcome per call regardless of how many attempts it took.

use crate::core::providers::{ProviderError, ProviderReply};
use crate::core::traits::LlmClient;
use std::time::{Duration, Instant};
use tracing::debug;

/// Retry policy of one dispatched call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first
    pub retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Result of one dispatched call
#[derive(Debug)]
pub struct CallResult {
    pub reply: Result<ProviderReply, ProviderError>,
    pub elapsed: Duration,
    pub attempts: u32,
}

/// Call `client` with retries, all bounded by `timeout`
pub async fn call_with_retry(
    client: &dyn LlmClient,
    prompt: &str,
    max_tokens: u32,
    timeout: Duration,
    policy: RetryPolicy,
) -> CallResult {
    let provider = client.provider_id();
    let start = Instant::now();
    let mut attempts = 0u32;

    let attempt_loop = async {
        loop {
            attempts += 1;
            match client.call(prompt, max_tokens).await {
                Ok(reply) => return Ok(reply),
                Err(err) if err.is_retryable() && attempts <= policy.retries => {
                    let delay = err
                        .retry_after()
                        .map(|d| d.min(policy.max_delay))
                        .unwrap_or_else(|| policy.backoff(attempts));
                    debug!(%provider, attempt = attempts, "Retrying in {:?}: {}", delay, err);
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    };

    let reply = match tokio::time::timeout(timeout, attempt_loop).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::timeout(provider, start.elapsed())),
    };

    CallResult {
        reply,
        elapsed: start.elapsed(),
        attempts,
    }
}
