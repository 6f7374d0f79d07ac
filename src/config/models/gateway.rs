//! Main gateway configuration

use super::*;
use crate::core::providers::ProviderId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Provider configurations
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    /// Health monitor policy
    #[serde(default)]
    pub health: HealthConfig,
    /// Rate limiting, circuit breaking and cost budgets
    #[serde(default)]
    pub admission: AdmissionConfig,
    /// Response cache
    #[serde(default)]
    pub cache: CacheConfig,
    /// Fallback orchestration
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Seconds between background maintenance passes
    #[serde(default = "default_maintenance_interval")]
    pub maintenance_interval_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            health: HealthConfig::default(),
            admission: AdmissionConfig::default(),
            cache: CacheConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            logging: LoggingConfig::default(),
            maintenance_interval_secs: default_maintenance_interval(),
        }
    }
}

impl GatewayConfig {
    /// Get provider by id
    pub fn get_provider(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.id == id)
    }

    pub fn maintenance_interval(&self) -> Duration {
        Duration::from_secs(self.maintenance_interval_secs)
    }

    /// Merge two configurations, with other taking precedence per provider
    pub fn merge(mut self, other: Self) -> Self {
        for provider in other.providers {
            match self.providers.iter_mut().find(|p| p.id == provider.id) {
                Some(existing) => *existing = provider,
                None => self.providers.push(provider),
            }
        }
        self.health = other.health;
        self.admission = other.admission;
        self.cache = other.cache;
        self.orchestrator = other.orchestrator;
        self.logging = other.logging;
        self.maintenance_interval_secs = other.maintenance_interval_secs;
        self
    }
}
