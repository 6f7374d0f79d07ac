//! Prometheus-backed metrics

use super::sink::MetricsSink;
use crate::core::admission::DenialReason;
use crate::core::circuit_breaker::CircuitState;
use crate::core::cost::CostPeriod;
use crate::core::providers::ProviderId;
use crate::utils::error::{GatewayError, Result};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;

/// Metrics registered in a Prometheus registry
#[derive(Debug, Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    provider_calls: IntCounterVec,
    provider_latency: HistogramVec,
    cache_lookups: IntCounterVec,
    circuit_state: IntGaugeVec,
    circuit_transitions: IntCounterVec,
    cost_alerts: IntCounterVec,
    admission_denials: IntCounterVec,
    degraded_responses: IntCounter,
}

fn register_err(e: prometheus::Error) -> GatewayError {
    GatewayError::Internal(format!("Failed to register metric: {}", e))
}

impl PrometheusMetrics {
    /// Register every gateway metric in a fresh registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Registry::new())
    }

    pub fn with_registry(registry: Registry) -> Result<Self> {
        let provider_calls = IntCounterVec::new(
            Opts::new("vg_provider_calls_total", "Provider calls by outcome"),
            &["provider", "outcome"],
        )
        .map_err(register_err)?;
        let provider_latency = HistogramVec::new(
            HistogramOpts::new("vg_provider_latency_seconds", "Provider call latency"),
            &["provider"],
        )
        .map_err(register_err)?;
        let cache_lookups = IntCounterVec::new(
            Opts::new("vg_cache_lookups_total", "Cache lookups by result"),
            &["result"],
        )
        .map_err(register_err)?;
        let circuit_state = IntGaugeVec::new(
            Opts::new(
                "vg_circuit_state",
                "Circuit state per provider (0 closed, 1 half-open, 2 open)",
            ),
            &["provider"],
        )
        .map_err(register_err)?;
        let circuit_transitions = IntCounterVec::new(
            Opts::new("vg_circuit_transitions_total", "Circuit breaker transitions"),
            &["provider", "to"],
        )
        .map_err(register_err)?;
        let cost_alerts = IntCounterVec::new(
            Opts::new("vg_cost_alerts_total", "Cost threshold alerts"),
            &["period"],
        )
        .map_err(register_err)?;
        let admission_denials = IntCounterVec::new(
            Opts::new("vg_admission_denials_total", "Admission denials by reason"),
            &["reason"],
        )
        .map_err(register_err)?;
        let degraded_responses = IntCounter::new(
            "vg_degraded_responses_total",
            "Queries answered with the degraded sentinel",
        )
        .map_err(register_err)?;

        registry
            .register(Box::new(provider_calls.clone()))
            .map_err(register_err)?;
        registry
            .register(Box::new(provider_latency.clone()))
            .map_err(register_err)?;
        registry
            .register(Box::new(cache_lookups.clone()))
            .map_err(register_err)?;
        registry
            .register(Box::new(circuit_state.clone()))
            .map_err(register_err)?;
        registry
            .register(Box::new(circuit_transitions.clone()))
            .map_err(register_err)?;
        registry
            .register(Box::new(cost_alerts.clone()))
            .map_err(register_err)?;
        registry
            .register(Box::new(admission_denials.clone()))
            .map_err(register_err)?;
        registry
            .register(Box::new(degraded_responses.clone()))
            .map_err(register_err)?;

        Ok(Self {
            registry,
            provider_calls,
            provider_latency,
            cache_lookups,
            circuit_state,
            circuit_transitions,
            cost_alerts,
            admission_denials,
            degraded_responses,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render every metric in the text exposition format
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| GatewayError::Internal(format!("Failed to encode metrics: {}", e)))?;
        String::from_utf8(buffer)
            .map_err(|e| GatewayError::Internal(format!("Metrics are not UTF-8: {}", e)))
    }
}

impl MetricsSink for PrometheusMetrics {
    fn provider_call(&self, provider: ProviderId, success: bool, latency: Duration) {
        let outcome = if success { "success" } else { "failure" };
        self.provider_calls
            .with_label_values(&[provider.as_str(), outcome])
            .inc();
        self.provider_latency
            .with_label_values(&[provider.as_str()])
            .observe(latency.as_secs_f64());
    }

    fn cache_lookup(&self, hit: bool) {
        let result = if hit { "hit" } else { "miss" };
        self.cache_lookups.with_label_values(&[result]).inc();
    }

    fn circuit_transition(&self, provider: ProviderId, _from: CircuitState, to: CircuitState) {
        let gauge = match to {
            CircuitState::Closed => 0,
            CircuitState::HalfOpen => 1,
            CircuitState::Open => 2,
        };
        self.circuit_state
            .with_label_values(&[provider.as_str()])
            .set(gauge);
        self.circuit_transitions
            .with_label_values(&[provider.as_str(), to.as_str()])
            .inc();
    }

    fn cost_alert(&self, _caller: &str, period: CostPeriod) {
        self.cost_alerts.with_label_values(&[period.as_str()]).inc();
    }

    fn admission_denied(&self, reason: DenialReason) {
        self.admission_denials
            .with_label_values(&[reason.as_str()])
            .inc();
    }

    fn degraded_response(&self) {
        self.degraded_responses.inc();
    }
}
