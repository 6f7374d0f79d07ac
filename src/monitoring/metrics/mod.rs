//! Metrics sinks
//!
//! The gateway reports through the [`MetricsSink`] trait; the concrete sink
//! is chosen when the gateway is built.

mod memory;
#[cfg(feature = "metrics")]
mod prometheus_sink;
mod sink;


pub use memory::{InMemoryMetrics, MetricsSnapshot, ProviderCallCounts};
#[cfg(feature = "metrics")]
pub use prometheus_sink::PrometheusMetrics;
pub use sink::{MetricsSink, NoopMetrics};
