//! Upstream LLM providers
//!
//! Typed provider identities, the concrete HTTP clients, a scripted mock and
//! the registry the orchestrator dispatches through.

pub mod anthropic;
pub mod error;
pub mod factory;
mod http;
pub mod mock;
pub mod openai_compatible;
pub mod provider_registry;
pub mod types;

pub use anthropic::AnthropicClient;
pub use error::ProviderError;
pub use factory::create_client;
pub use mock::{MockClient, MockOutcome};
pub use openai_compatible::OpenAiCompatibleClient;
pub use provider_registry::{ProviderRegistry, RegisteredProvider};
pub use types::{CallerId, ProviderId, ProviderReply, WireProtocol};
