//! Scripted in-process client for tests and demos

use super::error::ProviderError;
use super::types::{ProviderId, ProviderReply};
use crate::core::traits::LlmClient;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// What a [`MockClient`] does on one call
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Reply(ProviderReply),
    Fail(ProviderError),
    /// Never answers; only a timeout ends the call
    Hang,
}

/// Fake provider returning scripted outcomes
///
/// Scripted outcomes are consumed in order; once exhausted every call gets the
/// default outcome.
#[derive(Debug)]
pub struct MockClient {
    provider: ProviderId,
    delay: Duration,
    default: MockOutcome,
    script: Mutex<VecDeque<MockOutcome>>,
    calls: AtomicUsize,
}

impl MockClient {
    pub fn new(provider: ProviderId, default: MockOutcome) -> Self {
        Self {
            provider,
            delay: Duration::ZERO,
            default,
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always answers `text`
    pub fn replying(provider: ProviderId, text: impl Into<String>) -> Self {
        Self::new(provider, MockOutcome::Reply(ProviderReply::new(text)))
    }

    /// Always fails with a 503
    pub fn failing(provider: ProviderId) -> Self {
        Self::new(
            provider,
            MockOutcome::Fail(ProviderError::http(provider, 503, "service unavailable")),
        )
    }

    /// Never answers
    pub fn hanging(provider: ProviderId) -> Self {
        Self::new(provider, MockOutcome::Hang)
    }

    /// Sleep this long before every outcome
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queue a one-shot outcome ahead of the default
    pub fn then(self, outcome: MockOutcome) -> Self {
        self.script.lock().push_back(outcome);
        self
    }

    /// Queue a one-shot failure with the given HTTP status
    pub fn then_fail(self, status: u16) -> Self {
        let provider = self.provider;
        self.then(MockOutcome::Fail(ProviderError::http(
            provider,
            status,
            "scripted failure",
        )))
    }

    /// Number of calls received so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for MockClient {
    fn provider_id(&self) -> ProviderId {
        self.provider
    }

    async fn call(&self, _prompt: &str, _max_tokens: u32) -> Result<ProviderReply, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.default.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match outcome {
            MockOutcome::Reply(reply) => Ok(reply),
            MockOutcome::Fail(err) => Err(err),
            MockOutcome::Hang => std::future::pending().await,
        }
    }
}
