//! Provider identity and call result types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Known upstream LLM providers
///
/// All per-provider state (health, circuit, registry entries) is keyed by this
/// enum rather than free-form strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
    Gemini,
    Perplexity,
    Mistral,
}

/// Wire protocol spoken by a provider endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireProtocol {
    /// `POST {endpoint}/chat/completions` with bearer auth
    OpenAiCompatible,
    /// `POST {endpoint}/messages` with `x-api-key` auth
    AnthropicMessages,
}

impl ProviderId {
    /// Every known provider, in default priority order
    pub const ALL: [ProviderId; 5] = [
        ProviderId::OpenAi,
        ProviderId::Anthropic,
        ProviderId::Gemini,
        ProviderId::Perplexity,
        ProviderId::Mistral,
    ];

    /// Stable lowercase name used in logs, metrics and cache keys
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Anthropic => "anthropic",
            ProviderId::Gemini => "gemini",
            ProviderId::Perplexity => "perplexity",
            ProviderId::Mistral => "mistral",
        }
    }

    /// Environment variable holding the API key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "OPENAI_API_KEY",
            ProviderId::Anthropic => "ANTHROPIC_API_KEY",
            ProviderId::Gemini => "GEMINI_API_KEY",
            ProviderId::Perplexity => "PERPLEXITY_API_KEY",
            ProviderId::Mistral => "MISTRAL_API_KEY",
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "https://api.openai.com/v1",
            ProviderId::Anthropic => "https://api.anthropic.com/v1",
            ProviderId::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
            ProviderId::Perplexity => "https://api.perplexity.ai",
            ProviderId::Mistral => "https://api.mistral.ai/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "gpt-4o-mini",
            ProviderId::Anthropic => "claude-3-5-haiku-latest",
            ProviderId::Gemini => "gemini-1.5-flash",
            ProviderId::Perplexity => "sonar",
            ProviderId::Mistral => "mistral-small-latest",
        }
    }

    /// Default priority (lower = preferred)
    pub fn default_priority(&self) -> u32 {
        match self {
            ProviderId::OpenAi => 1,
            ProviderId::Anthropic => 2,
            ProviderId::Gemini => 3,
            ProviderId::Perplexity => 4,
            ProviderId::Mistral => 5,
        }
    }

    /// Default confidence multiplier
    pub fn default_weight(&self) -> f64 {
        match self {
            ProviderId::OpenAi => 1.0,
            ProviderId::Anthropic => 0.95,
            ProviderId::Gemini => 0.9,
            ProviderId::Perplexity => 0.9,
            ProviderId::Mistral => 0.85,
        }
    }

    pub fn wire_protocol(&self) -> WireProtocol {
        match self {
            ProviderId::Anthropic => WireProtocol::AnthropicMessages,
            _ => WireProtocol::OpenAiCompatible,
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "open_ai" | "chatgpt" => Ok(ProviderId::OpenAi),
            "anthropic" | "claude" => Ok(ProviderId::Anthropic),
            "gemini" | "google" => Ok(ProviderId::Gemini),
            "perplexity" => Ok(ProviderId::Perplexity),
            "mistral" => Ok(ProviderId::Mistral),
            other => Err(format!("unknown provider: {}", other)),
        }
    }
}

/// Identity of the customer / API key a request is billed and rate limited to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallerId(String);

impl CallerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Shared identity for requests that carry none
    pub fn anonymous() -> Self {
        Self("anonymous".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CallerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Raw text returned by one provider call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderReply {
    pub text: String,
    /// Tokens reported by the provider, when it reports usage
    pub tokens_used: Option<u32>,
}

impl ProviderReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tokens_used: None,
        }
    }

    pub fn with_tokens(mut self, tokens: u32) -> Self {
        self.tokens_used = Some(tokens);
        self
    }
}
