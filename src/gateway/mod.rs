//! Gateway service object
//!
//! [`VisibilityGateway`] owns one instance of every component and wires them
//! together; callers build it once and share it behind an `Arc`.

mod builder;

pub use builder::GatewayBuilder;

use crate::config::GatewayConfig;
use crate::core::admission::AdmissionController;
use crate::core::cache_manager::{CacheStats, IntelligentCache};
use crate::core::circuit_breaker::CircuitState;
use crate::core::cost::CustomerReport;
use crate::core::health::{HealthMonitor, HealthSnapshot};
use crate::core::orchestrator::{AggregatedResponse, FallbackOrchestrator, LlmResponse};
use crate::core::providers::{CallerId, ProviderRegistry};
use crate::monitoring::MetricsSink;
use crate::utils::error::Result;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Health and breaker state of one provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderStatus {
    #[serde(flatten)]
    pub health: HealthSnapshot,
    pub circuit_state: Option<CircuitState>,
}

/// Point-in-time view of every provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemStatus {
    pub total_providers: usize,
    pub healthy_providers: usize,
    pub cache_backend: &'static str,
    pub providers: Vec<ProviderStatus>,
}

/// Multi-provider query gateway
pub struct VisibilityGateway {
    config: Arc<GatewayConfig>,
    registry: Arc<ProviderRegistry>,
    health: Arc<HealthMonitor>,
    admission: Arc<AdmissionController>,
    cache: Arc<IntelligentCache>,
    orchestrator: FallbackOrchestrator,
    metrics: Arc<dyn MetricsSink>,
    maintenance: Mutex<Option<JoinHandle<()>>>,
}

impl VisibilityGateway {
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::new()
    }

    /// Spawn the periodic maintenance task
    ///
    /// Drops stale rate-limit windows and cost counters and sweeps expired
    /// cache entries. Calling this twice keeps the first task.
    pub fn start(&self) {
        let mut slot = self.maintenance.lock();
        if slot.is_some() {
            return;
        }

        let admission = self.admission.clone();
        let cache = self.cache.clone();
        let period = self.config.maintenance_interval();
        info!(interval_secs = period.as_secs(), "Starting gateway maintenance task");

        *slot = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                admission.maintenance();
                let swept = cache.sweep().await;
                debug!(swept, "Maintenance pass completed");
            }
        }));
    }

    pub fn is_running(&self) -> bool {
        self.maintenance
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop background work and flush buffered usage records
    pub async fn shutdown(&self) {
        info!("Shutting down gateway");
        if let Some(handle) = self.maintenance.lock().take() {
            handle.abort();
        }
        self.admission.flush().await;
        info!("Gateway shutdown completed");
    }

    /// Best single answer for a prompt, see [`FallbackOrchestrator::query_with_fallback`]
    pub async fn query_with_fallback(
        &self,
        caller: &CallerId,
        prompt: &str,
        required_confidence: f64,
        use_cache: bool,
    ) -> Result<LlmResponse> {
        self.orchestrator
            .query_with_fallback(caller, prompt, required_confidence, use_cache)
            .await
    }

    /// Same as [`Self::query_with_fallback`] with the configured confidence
    pub async fn query(&self, caller: &CallerId, prompt: &str) -> Result<LlmResponse> {
        let required = self.config.orchestrator.default_required_confidence;
        self.query_with_fallback(caller, prompt, required, true).await
    }

    pub async fn aggregate_responses(
        &self,
        caller: &CallerId,
        prompt: &str,
        min_providers: usize,
    ) -> Result<AggregatedResponse> {
        self.orchestrator
            .aggregate_responses(caller, prompt, min_providers)
            .await
    }

    pub fn system_status(&self) -> SystemStatus {
        let providers: Vec<ProviderStatus> = self
            .health
            .snapshot_all()
            .into_iter()
            .map(|health| ProviderStatus {
                circuit_state: self.admission.circuit_state(health.provider),
                health,
            })
            .collect();

        SystemStatus {
            total_providers: self.registry.len(),
            healthy_providers: providers.iter().filter(|p| p.health.healthy).count(),
            cache_backend: self.cache.backend_name(),
            providers,
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn customer_report(&self, caller: &CallerId) -> CustomerReport {
        self.admission.customer_report(caller)
    }

    /// Shared cache for analysis and summary results
    pub fn cache(&self) -> &Arc<IntelligentCache> {
        &self.cache
    }

    pub fn admission(&self) -> &Arc<AdmissionController> {
        &self.admission
    }

    pub fn health(&self) -> &Arc<HealthMonitor> {
        &self.health
    }

    pub fn metrics(&self) -> &Arc<dyn MetricsSink> {
        &self.metrics
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

impl Drop for VisibilityGateway {
    fn drop(&mut self) {
        if let Some(handle) = self.maintenance.get_mut().take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for VisibilityGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibilityGateway")
            .field("providers", &self.registry.ids())
            .field("cache_backend", &self.cache.backend_name())
            .field("running", &self.is_running())
            .finish()
    }
}
