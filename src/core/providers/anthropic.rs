//! Anthropic messages API client

use super::error::ProviderError;
use super::http::{build_http_client, error_from_response};
use super::types::{ProviderId, ProviderReply};
use crate::config::ProviderConfig;
use crate::core::traits::LlmClient;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

/// Client for `POST {endpoint}/messages`
#[derive(Clone)]
pub struct AnthropicClient {
    url: String,
    model: String,
    api_key: String,
    http: Client,
}

impl fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("url", &self.url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl AnthropicClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                ProviderError::not_configured(
                    ProviderId::Anthropic,
                    format!("{} is not set", ProviderId::Anthropic.api_key_env()),
                )
            })?;

        Ok(Self {
            url: format!("{}/messages", config.endpoint.trim_end_matches('/')),
            model: config.model.clone(),
            api_key,
            http: build_http_client(ProviderId::Anthropic, config.timeout_duration())?,
        })
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    fn provider_id(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    async fn call(&self, prompt: &str, max_tokens: u32) -> Result<ProviderReply, ProviderError> {
        let provider = ProviderId::Anthropic;
        let request = MessagesRequest {
            model: &self.model,
            max_tokens,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        debug!(model = %self.model, "Sending Anthropic messages request");
        let response = self
            .http
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(provider, e))?;

        if !response.status().is_success() {
            return Err(error_from_response(provider, response).await);
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_response(provider, e.to_string()))?;

        let text: String = body
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text)
            .collect();

        if text.is_empty() {
            return Err(ProviderError::invalid_response(provider, "No text content returned"));
        }

        let mut reply = ProviderReply::new(text);
        reply.tokens_used = body.usage.map(|u| u.input_tokens + u.output_tokens);
        Ok(reply)
    }
}
