//! Gateway builder

use super::VisibilityGateway;
use crate::config::{GatewayConfig, ProviderConfig, Validate};
use crate::core::admission::AdmissionController;
use crate::core::cache_manager::IntelligentCache;
use crate::core::cost::UsageSink;
use crate::core::health::HealthMonitor;
use crate::core::orchestrator::FallbackOrchestrator;
use crate::core::providers::{ProviderError, ProviderRegistry, create_client};
use crate::core::traits::{CacheBackend, LlmClient};
use crate::monitoring::{MetricsSink, NoopMetrics};
use crate::storage::create_backend;
use crate::utils::error::{GatewayError, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builder for [`VisibilityGateway`]
#[derive(Default)]
pub struct GatewayBuilder {
    config: Option<GatewayConfig>,
    clients: Vec<(ProviderConfig, Arc<dyn LlmClient>)>,
    cache_backend: Option<Arc<dyn CacheBackend>>,
    usage_sink: Option<Arc<dyn UsageSink>>,
    metrics: Option<Arc<dyn MetricsSink>>,
}

impl GatewayBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set configuration
    pub fn config(mut self, config: GatewayConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Register a provider with a ready-made client
    ///
    /// Takes precedence over a configured provider with the same id.
    pub fn client(mut self, config: ProviderConfig, client: Arc<dyn LlmClient>) -> Self {
        self.clients.retain(|(existing, _)| existing.id != config.id);
        self.clients.push((config, client));
        self
    }

    /// Use this backend instead of the one the cache section selects
    pub fn cache_backend(mut self, backend: Arc<dyn CacheBackend>) -> Self {
        self.cache_backend = Some(backend);
        self
    }

    pub fn usage_sink(mut self, sink: Arc<dyn UsageSink>) -> Self {
        self.usage_sink = Some(sink);
        self
    }

    pub fn metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the gateway
    ///
    /// Configured providers without an API key are skipped with a warning;
    /// any other client construction failure is a configuration error.
    pub async fn build(self) -> Result<VisibilityGateway> {
        let config = self.config.unwrap_or_default();
        config.validate().map_err(GatewayError::Config)?;

        let metrics = self.metrics.unwrap_or_else(|| Arc::new(NoopMetrics));
        let health = Arc::new(HealthMonitor::new(config.health.clone()));

        let mut admission =
            AdmissionController::new(config.admission.clone(), health.clone())
                .with_metrics(metrics.clone());
        if let Some(sink) = self.usage_sink {
            admission = admission.with_usage_sink(sink);
        }
        let admission = Arc::new(admission);

        let mut registry = ProviderRegistry::new();
        for provider in &config.providers {
            if self.clients.iter().any(|(c, _)| c.id == provider.id) {
                continue;
            }
            match create_client(provider) {
                Ok(client) => {
                    registry.register(provider.clone(), client);
                }
                Err(ProviderError::NotConfigured { .. }) => {
                    warn!(provider = %provider.id, "Skipping provider without API key");
                }
                Err(e) => {
                    return Err(GatewayError::Config(format!(
                        "Failed to create client for {}: {}",
                        provider.id, e
                    )));
                }
            }
        }
        for (provider, client) in self.clients {
            registry.register(provider, client);
        }

        for id in registry.ids() {
            if let Some(entry) = registry.get(id) {
                health.register(id, entry.config.priority);
                admission.register(id, entry.config.model.clone());
                debug!(provider = %id, priority = entry.config.priority, "Provider registered");
            }
        }

        let backend = match self.cache_backend {
            Some(backend) => backend,
            None => create_backend(&config.cache).await?,
        };
        let cache = Arc::new(
            IntelligentCache::new(config.cache.clone(), backend).with_metrics(metrics.clone()),
        );

        let registry = Arc::new(registry);
        let orchestrator = FallbackOrchestrator::new(
            config.orchestrator.clone(),
            registry.clone(),
            health.clone(),
            admission.clone(),
            cache.clone(),
        )
        .with_metrics(metrics.clone());

        info!(
            providers = registry.len(),
            cache_backend = cache.backend_name(),
            "Gateway initialized"
        );

        Ok(VisibilityGateway {
            config: Arc::new(config),
            registry,
            health,
            admission,
            cache,
            orchestrator,
            metrics,
            maintenance: Mutex::new(None),
        })
    }
}

impl std::fmt::Debug for GatewayBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayBuilder")
            .field("has_config", &self.config.is_some())
            .field("clients", &self.clients.len())
            .field("has_cache_backend", &self.cache_backend.is_some())
            .finish()
    }
}
