//! Provider test utilities

use serde_json::{Value, json};
use visibility_gateway::config::ProviderConfig;
use visibility_gateway::core::providers::ProviderId;

/// Provider config suited to mocks: short timeout, no retries
pub fn mock_provider(id: ProviderId, priority: u32) -> ProviderConfig {
    ProviderConfig::for_provider(id)
        .with_priority(priority)
        .with_weight(1.0)
        .with_timeout(1)
        .with_retry_count(0)
}

/// Provider config pointing at a local mock server
pub fn http_provider(id: ProviderId, endpoint: &str) -> ProviderConfig {
    ProviderConfig::for_provider(id)
        .with_endpoint(endpoint)
        .with_api_key("test-key")
        .with_timeout(2)
        .with_retry_count(0)
}

/// A reply long enough to score full marks on content length
pub fn thorough_answer() -> String {
    "Salesforce, HubSpot and Pipedrive are the usual picks. ".repeat(10)
}

/// OpenAI chat completions body
pub fn openai_completion(text: &str, total_tokens: u32) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": text },
            "finish_reason": "stop"
        }],
        "usage": {
            "prompt_tokens": 10,
            "completion_tokens": total_tokens.saturating_sub(10),
            "total_tokens": total_tokens
        }
    })
}

/// Anthropic messages body
pub fn anthropic_message(text: &str, input_tokens: u32, output_tokens: u32) -> Value {
    json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "content": [{ "type": "text", "text": text }],
        "stop_reason": "end_turn",
        "usage": { "input_tokens": input_tokens, "output_tokens": output_tokens }
    })
}
