//! Test fixtures
//!
//! Builds real gateways over the in-memory cache backend with scripted mock
//! providers in place of HTTP clients.

use super::providers::mock_provider;
use std::sync::Arc;
use visibility_gateway::config::GatewayConfig;
use visibility_gateway::core::cost::MemoryUsageSink;
use visibility_gateway::core::providers::{MockClient, ProviderId};
use visibility_gateway::monitoring::InMemoryMetrics;
use visibility_gateway::storage::MemoryBackend;
use visibility_gateway::{CallerId, LlmClient, VisibilityGateway};

/// A gateway plus handles to everything a test wants to inspect
pub struct GatewayFixture {
    pub gateway: VisibilityGateway,
    pub clients: Vec<(ProviderId, Arc<MockClient>)>,
    pub metrics: Arc<InMemoryMetrics>,
    pub usage: Arc<MemoryUsageSink>,
    pub backend: Arc<MemoryBackend>,
}

impl GatewayFixture {
    /// Providers get priorities in the order given
    pub async fn new(clients: Vec<MockClient>) -> Self {
        Self::with_config(GatewayConfig::default(), clients).await
    }

    pub async fn with_config(config: GatewayConfig, clients: Vec<MockClient>) -> Self {
        let metrics = Arc::new(InMemoryMetrics::new());
        let usage = Arc::new(MemoryUsageSink::new());
        let backend = Arc::new(MemoryBackend::new());

        let mut builder = VisibilityGateway::builder()
            .config(config)
            .metrics(metrics.clone())
            .usage_sink(usage.clone())
            .cache_backend(backend.clone());

        let mut handles = Vec::new();
        for (index, client) in clients.into_iter().enumerate() {
            let client = Arc::new(client);
            let id = client.provider_id();
            builder = builder.client(mock_provider(id, index as u32 + 1), client.clone());
            handles.push((id, client));
        }

        let gateway = builder.build().await.expect("fixture gateway builds");
        Self {
            gateway,
            clients: handles,
            metrics,
            usage,
            backend,
        }
    }

    pub fn client(&self, id: ProviderId) -> &Arc<MockClient> {
        &self
            .clients
            .iter()
            .find(|(candidate, _)| *candidate == id)
            .expect("provider is part of the fixture")
            .1
    }

    pub fn calls(&self, id: ProviderId) -> usize {
        self.client(id).call_count()
    }
}

pub fn caller(name: &str) -> CallerId {
    CallerId::from(name)
}
