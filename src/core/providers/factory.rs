//! Build concrete clients from provider configuration

use super::anthropic::AnthropicClient;
use super::error::ProviderError;
use super::openai_compatible::OpenAiCompatibleClient;
use super::types::WireProtocol;
use crate::config::ProviderConfig;
use crate::core::traits::LlmClient;
use std::sync::Arc;

/// Create the HTTP client matching the provider's wire protocol
pub fn create_client(config: &ProviderConfig) -> Result<Arc<dyn LlmClient>, ProviderError> {
    let client: Arc<dyn LlmClient> = match config.id.wire_protocol() {
        WireProtocol::OpenAiCompatible => Arc::new(OpenAiCompatibleClient::new(config)?),
        WireProtocol::AnthropicMessages => Arc::new(AnthropicClient::new(config)?),
    };
    Ok(client)
}
