//! OpenAI-compatible chat completions client
//!
//! Serves OpenAI itself plus the vendors exposing the same surface (Gemini's
//! compatibility endpoint, Perplexity, Mistral).

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

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: Option<u32>,
}

/// Client for `POST {endpoint}/chat/completions`
#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    provider: ProviderId,
    url: String,
    model: String,
    api_key: String,
    http: Client,
}

impl fmt::Debug for OpenAiCompatibleClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiCompatibleClient")
            .field("provider", &self.provider)
            .field("url", &self.url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiCompatibleClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                ProviderError::not_configured(
                    config.id,
                    format!("{} is not set", config.id.api_key_env()),
                )
            })?;

        Ok(Self {
            provider: config.id,
            url: format!("{}/chat/completions", config.endpoint.trim_end_matches('/')),
            model: config.model.clone(),
            api_key,
            http: build_http_client(config.id, config.timeout_duration())?,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    fn provider_id(&self) -> ProviderId {
        self.provider
    }

    async fn call(&self, prompt: &str, max_tokens: u32) -> Result<ProviderReply, ProviderError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
        };

        debug!(provider = %self.provider, model = %self.model, "Sending chat completion");
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(self.provider, e))?;

        if !response.status().is_success() {
            return Err(error_from_response(self.provider, response).await);
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_response(self.provider, e.to_string()))?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::invalid_response(self.provider, "No choices returned"))?;

        let mut reply = ProviderReply::new(text);
        reply.tokens_used = body.usage.and_then(|u| u.total_tokens);
        Ok(reply)
    }
}
