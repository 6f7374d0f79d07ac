//! Core configuration validators
//!
//! This module provides validation implementations for the main gateway configuration
//! structures including GatewayConfig, ProviderConfig and HealthConfig.

use super::trait_def::Validate;
use crate::config::models::*;
use std::collections::HashSet;
use tracing::debug;

impl Validate for GatewayConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating gateway configuration");

        let mut provider_ids = HashSet::new();
        for provider in &self.providers {
            if !provider_ids.insert(provider.id) {
                return Err(format!("Duplicate provider: {}", provider.id));
            }
            provider.validate()?;
        }

        self.health.validate()?;
        self.admission.validate()?;
        self.cache.validate()?;
        self.orchestrator.validate()?;

        if self.maintenance_interval_secs == 0 {
            return Err("Maintenance interval must be greater than 0".to_string());
        }

        debug!("Gateway configuration validation completed");
        Ok(())
    }
}

impl Validate for ProviderConfig {
    fn validate(&self) -> Result<(), String> {
        if self.endpoint.is_empty() {
            return Err(format!("Endpoint is required for provider: {}", self.id));
        }
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(format!(
                "Endpoint for provider {} must be an http(s) URL",
                self.id
            ));
        }
        if self.model.is_empty() {
            return Err(format!("Model is required for provider: {}", self.id));
        }
        if !(0.0..=1.0).contains(&self.weight) || self.weight == 0.0 {
            return Err(format!(
                "Weight for provider {} must be in (0, 1]",
                self.id
            ));
        }
        if self.timeout == 0 {
            return Err(format!("Timeout for provider {} must be greater than 0", self.id));
        }
        if self.max_tokens == 0 {
            return Err(format!(
                "Max tokens for provider {} must be greater than 0",
                self.id
            ));
        }
        Ok(())
    }
}

impl Validate for HealthConfig {
    fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.min_success_rate) {
            return Err("Health min_success_rate must be between 0 and 1".to_string());
        }
        if self.success_gain < 1.0 {
            return Err("Health success_gain must be at least 1".to_string());
        }
        if !(0.0..1.0).contains(&self.failure_decay) {
            return Err("Health failure_decay must be in [0, 1)".to_string());
        }
        if !(0.0..=1.0).contains(&self.latency_smoothing) {
            return Err("Health latency_smoothing must be between 0 and 1".to_string());
        }
        Ok(())
    }
}
