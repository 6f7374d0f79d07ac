//! LLM client capability
//!
//! One implementation per wire protocol; the orchestrator selects clients by
//! [`ProviderId`] through the registry instead of branching on provider names.

use crate::core::providers::{ProviderError, ProviderId, ProviderReply};
use async_trait::async_trait;
use std::fmt::Debug;

/// A single upstream provider able to answer a prompt
#[async_trait]
pub trait LlmClient: Send + Sync + Debug {
    /// Provider this client talks to
    fn provider_id(&self) -> ProviderId;

    /// Send `prompt` and return the completion text
    ///
    /// Implementations perform exactly one upstream request; retries and
    /// timeouts are applied by the caller.
    async fn call(&self, prompt: &str, max_tokens: u32) -> Result<ProviderReply, ProviderError>;
}
