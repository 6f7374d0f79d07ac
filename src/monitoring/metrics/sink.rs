//! Metrics sink trait

use crate::core::admission::DenialReason;
use crate::core::circuit_breaker::CircuitState;
use crate::core::cost::CostPeriod;
use crate::core::providers::ProviderId;
use std::time::Duration;

/// Receiver of gateway counters and gauges
///
/// Every method is synchronous and must not block.
pub trait MetricsSink: Send + Sync {
    /// One provider call finished
    fn provider_call(&self, provider: ProviderId, success: bool, latency: Duration);

    /// One cache lookup
    fn cache_lookup(&self, hit: bool);

    fn circuit_transition(&self, provider: ProviderId, from: CircuitState, to: CircuitState);

    fn cost_alert(&self, caller: &str, period: CostPeriod);

    fn admission_denied(&self, reason: DenialReason);

    /// A query ended with the degraded sentinel
    fn degraded_response(&self) {}
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn provider_call(&self, _provider: ProviderId, _success: bool, _latency: Duration) {}

    fn cache_lookup(&self, _hit: bool) {}

    fn circuit_transition(&self, _provider: ProviderId, _from: CircuitState, _to: CircuitState) {}

    fn cost_alert(&self, _caller: &str, _period: CostPeriod) {}

    fn admission_denied(&self, _reason: DenialReason) {}
}
