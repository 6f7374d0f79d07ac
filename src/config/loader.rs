//! Configuration loading utilities
//!
//! This module provides utilities for loading configuration from YAML files and
//! from environment variables.

use super::models::*;
use super::validation::Validate;
use crate::core::providers::ProviderId;
use crate::utils::error::{GatewayError, Result};
use std::env;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

impl GatewayConfig {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GatewayError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_yaml_str(&content)
    }

    /// Parse and validate configuration from YAML text
    ///
    /// Providers listed without an `api_key` take it from their environment
    /// variable.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let mut config: GatewayConfig = serde_yaml::from_str(content)
            .map_err(|e| GatewayError::Config(format!("Failed to parse config: {}", e)))?;

        config.providers = config
            .providers
            .into_iter()
            .map(|provider| {
                let mut provider = provider.with_stock_defaults();
                if provider.api_key.is_none() {
                    provider.api_key = env::var(provider.id.api_key_env())
                        .ok()
                        .filter(|key| !key.trim().is_empty());
                }
                provider
            })
            .collect();

        config.validate().map_err(GatewayError::Config)?;
        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from environment variables
    ///
    /// Every provider whose API key variable is set gets a stock configuration.
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");
        let mut config = Self::default();

        for id in ProviderId::ALL {
            if let Ok(key) = env::var(id.api_key_env()) {
                if !key.trim().is_empty() {
                    config
                        .providers
                        .push(ProviderConfig::for_provider(id).with_api_key(key));
                }
            }
        }

        if let Some(limit) = parse_env("VG_CUSTOMER_LIMIT")? {
            config.admission.rate_limit.customer_limit = limit;
        }
        if let Some(calls) = parse_env("VG_MAX_CONCURRENT_CALLS")? {
            config.admission.rate_limit.max_concurrent_calls = calls;
        }
        if let Some(threshold) = parse_env("VG_FAILURE_THRESHOLD")? {
            config.admission.circuit_breaker.failure_threshold = threshold;
        }
        if let Some(timeout) = parse_env("VG_RECOVERY_TIMEOUT")? {
            config.admission.circuit_breaker.recovery_timeout = timeout;
        }
        if let Some(limit) = parse_env("VG_HOURLY_COST_LIMIT")? {
            config.admission.cost.limits.hourly = limit;
        }
        if let Some(limit) = parse_env("VG_DAILY_COST_LIMIT")? {
            config.admission.cost.limits.daily = limit;
        }
        if let Some(limit) = parse_env("VG_MONTHLY_COST_LIMIT")? {
            config.admission.cost.limits.monthly = limit;
        }
        if let Some(confidence) = parse_env("VG_REQUIRED_CONFIDENCE")? {
            config.orchestrator.default_required_confidence = confidence;
        }
        if let Ok(level) = env::var("VG_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(url) = env::var("REDIS_URL") {
            config.cache.backend = CacheBackendKind::Redis;
            config.cache.redis_url = Some(url);
        }

        config.validate().map_err(GatewayError::Config)?;
        Ok(config)
    }

    /// Convert to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| GatewayError::Config(format!("Failed to serialize config to YAML: {}", e)))
    }
}

fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| GatewayError::Config(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(None),
    }
}
