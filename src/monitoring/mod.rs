//! Monitoring and observability
//!
//! Counters and gauges for provider calls, cache lookups, circuit breaker
//! transitions, cost alerts and admission denials.

pub mod metrics;

pub use metrics::{InMemoryMetrics, MetricsSink, MetricsSnapshot, NoopMetrics};
#[cfg(feature = "metrics")]
pub use metrics::PrometheusMetrics;
