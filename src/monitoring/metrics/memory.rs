//! In-process metrics backed by atomic counters

use super::sink::MetricsSink;
use crate::core::admission::DenialReason;
use crate::core::circuit_breaker::CircuitState;
use crate::core::cost::CostPeriod;
use crate::core::providers::ProviderId;
use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Call counters of one provider
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProviderCallCounts {
    pub successes: u64,
    pub failures: u64,
    pub total_latency_ms: u64,
    pub circuit_state: Option<CircuitState>,
}

/// Point-in-time copy of every counter
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub providers: BTreeMap<ProviderId, ProviderCallCounts>,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub circuit_opened: u64,
    pub cost_alerts: u64,
    pub denied_rate_limited: u64,
    pub denied_concurrency: u64,
    pub denied_cost: u64,
    pub denied_circuit_open: u64,
    pub degraded_responses: u64,
}

/// Metrics kept in memory, readable through [`InMemoryMetrics::snapshot`]
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    providers: DashMap<ProviderId, ProviderCallCounts>,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    circuit_opened: AtomicU64,
    cost_alerts: AtomicU64,
    denied_rate_limited: AtomicU64,
    denied_concurrency: AtomicU64,
    denied_cost: AtomicU64,
    denied_circuit_open: AtomicU64,
    degraded_responses: AtomicU64,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            providers: self
                .providers
                .iter()
                .map(|e| (*e.key(), e.value().clone()))
                .collect(),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            circuit_opened: self.circuit_opened.load(Ordering::Relaxed),
            cost_alerts: self.cost_alerts.load(Ordering::Relaxed),
            denied_rate_limited: self.denied_rate_limited.load(Ordering::Relaxed),
            denied_concurrency: self.denied_concurrency.load(Ordering::Relaxed),
            denied_cost: self.denied_cost.load(Ordering::Relaxed),
            denied_circuit_open: self.denied_circuit_open.load(Ordering::Relaxed),
            degraded_responses: self.degraded_responses.load(Ordering::Relaxed),
        }
    }
}

impl MetricsSink for InMemoryMetrics {
    fn provider_call(&self, provider: ProviderId, success: bool, latency: Duration) {
        let mut counts = self.providers.entry(provider).or_default();
        if success {
            counts.successes += 1;
        } else {
            counts.failures += 1;
        }
        counts.total_latency_ms += latency.as_millis() as u64;
    }

    fn cache_lookup(&self, hit: bool) {
        if hit {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cache_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn circuit_transition(&self, provider: ProviderId, _from: CircuitState, to: CircuitState) {
        if to == CircuitState::Open {
            self.circuit_opened.fetch_add(1, Ordering::Relaxed);
        }
        self.providers.entry(provider).or_default().circuit_state = Some(to);
    }

    fn cost_alert(&self, _caller: &str, _period: CostPeriod) {
        self.cost_alerts.fetch_add(1, Ordering::Relaxed);
    }

    fn admission_denied(&self, reason: DenialReason) {
        let counter = match reason {
            DenialReason::RateLimited => &self.denied_rate_limited,
            DenialReason::ConcurrencyExhausted => &self.denied_concurrency,
            DenialReason::CostLimitExceeded => &self.denied_cost,
            DenialReason::CircuitOpen => &self.denied_circuit_open,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn degraded_response(&self) {
        self.degraded_responses.fetch_add(1, Ordering::Relaxed);
    }
}
