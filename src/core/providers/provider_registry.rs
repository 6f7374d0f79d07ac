//! Provider Registry
//!
//! Static provider configuration paired with the client serving it. Built once
//! at startup and read-only afterwards.

use super::types::ProviderId;
use crate::config::ProviderConfig;
use crate::core::traits::LlmClient;
use std::collections::HashMap;
use std::sync::Arc;

/// One registered provider
#[derive(Debug, Clone)]
pub struct RegisteredProvider {
    pub config: ProviderConfig,
    pub client: Arc<dyn LlmClient>,
}

/// Provider registry keyed by [`ProviderId`]
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderId, RegisteredProvider>,
}

impl ProviderRegistry {
    /// Create new provider registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider, replacing any earlier registration
    pub fn register(
        &mut self,
        config: ProviderConfig,
        client: Arc<dyn LlmClient>,
    ) -> Option<RegisteredProvider> {
        self.providers
            .insert(config.id, RegisteredProvider { config, client })
    }

    /// Get provider by id
    pub fn get(&self, id: ProviderId) -> Option<&RegisteredProvider> {
        self.providers.get(&id)
    }

    /// Check if provider is registered
    pub fn contains(&self, id: ProviderId) -> bool {
        self.providers.contains_key(&id)
    }

    /// Registered ids ordered by priority, then id
    pub fn ids(&self) -> Vec<ProviderId> {
        let mut entries: Vec<_> = self
            .providers
            .values()
            .map(|p| (p.config.priority, p.config.id))
            .collect();
        entries.sort();
        entries.into_iter().map(|(_, id)| id).collect()
    }

    /// Priority of a registered provider
    pub fn priority(&self, id: ProviderId) -> Option<u32> {
        self.providers.get(&id).map(|p| p.config.priority)
    }

    /// Get provider count
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
