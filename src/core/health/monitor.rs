//! Health monitor implementation
//!
//! Records live in a sharded map keyed by provider, so concurrent requests
//! only contend on the provider they update. Nothing here performs I/O.

use super::provider::{HealthTransition, ProviderHealth};
use super::types::HealthSnapshot;
use crate::config::HealthConfig;
use crate::core::providers::ProviderId;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Health monitor for tracking provider health
#[derive(Debug)]
pub struct HealthMonitor {
    policy: HealthConfig,
    records: DashMap<ProviderId, ProviderHealth>,
}

impl HealthMonitor {
    /// Create a new health monitor
    pub fn new(policy: HealthConfig) -> Self {
        Self {
            policy,
            records: DashMap::new(),
        }
    }

    pub fn policy(&self) -> &HealthConfig {
        &self.policy
    }

    /// Register a provider for health monitoring
    pub fn register(&self, provider: ProviderId, priority: u32) {
        debug!(%provider, priority, "Registering provider for health monitoring");
        self.records
            .insert(provider, ProviderHealth::new(provider, priority));
    }

    /// Record a successful call and its latency
    pub fn record_success(&self, provider: ProviderId, latency: Duration) {
        let transition = match self.records.get_mut(&provider) {
            Some(mut record) => record.record_success(latency, &self.policy),
            None => return,
        };
        if transition == HealthTransition::BecameHealthy {
            info!(%provider, "Provider recovered and is healthy again");
        }
    }

    /// Record a failed call
    pub fn record_failure(&self, provider: ProviderId, error: &str) {
        let (transition, failures, rate) = match self.records.get_mut(&provider) {
            Some(mut record) => {
                let t = record.record_failure(error, &self.policy);
                (t, record.consecutive_failures, record.success_rate)
            }
            None => return,
        };
        if transition == HealthTransition::BecameUnhealthy {
            warn!(
                %provider,
                consecutive_failures = failures,
                success_rate = rate,
                "Provider marked unhealthy: {}",
                error
            );
        }
    }

    /// Whether the provider is currently healthy; unknown providers are not
    pub fn is_healthy(&self, provider: ProviderId) -> bool {
        self.records
            .get(&provider)
            .map(|r| r.healthy)
            .unwrap_or(false)
    }

    /// Providers eligible for dispatch, ordered by priority
    ///
    /// Healthy providers qualify, as do unhealthy ones whose last check is
    /// older than the stale window so they get retried eventually.
    pub fn list_available(&self) -> Vec<ProviderId> {
        self.list_available_at(Instant::now())
    }

    pub fn list_available_at(&self, now: Instant) -> Vec<ProviderId> {
        let stale_after = self.policy.stale_after();
        let mut available: Vec<(u32, ProviderId)> = self
            .records
            .iter()
            .filter(|r| r.is_available_at(now, stale_after))
            .map(|r| (r.priority, r.provider))
            .collect();
        available.sort();
        available.into_iter().map(|(_, id)| id).collect()
    }

    /// Current smoothed success rate, if registered
    pub fn success_rate(&self, provider: ProviderId) -> Option<f64> {
        self.records.get(&provider).map(|r| r.success_rate)
    }

    pub fn snapshot(&self, provider: ProviderId) -> Option<HealthSnapshot> {
        self.records.get(&provider).map(|r| r.snapshot())
    }

    /// Snapshots of every provider, ordered by priority
    pub fn snapshot_all(&self) -> Vec<HealthSnapshot> {
        let mut records: Vec<(u32, HealthSnapshot)> = self
            .records
            .iter()
            .map(|r| (r.priority, r.snapshot()))
            .collect();
        records.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.provider.cmp(&b.1.provider)));
        records.into_iter().map(|(_, s)| s).collect()
    }

    /// Manually restore a provider to a pristine healthy record
    pub fn reset(&self, provider: ProviderId) {
        if let Some(mut record) = self.records.get_mut(&provider) {
            record.reset();
            info!(%provider, "Provider health reset");
        }
    }

    pub fn healthy_count(&self) -> usize {
        self.records.iter().filter(|r| r.healthy).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
