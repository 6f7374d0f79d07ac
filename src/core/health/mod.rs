//! Provider health monitoring
//!
//! Rolling per-provider health records updated from every call outcome, and
//! the availability ordering the orchestrator dispatches from.
//!
//! # Module Structure
//!
//! - `types` - Serializable health snapshots
//! - `provider` - Per-provider health record and its update rules
//! - `monitor` - Concurrent health monitor keyed by provider
//! - `tests` - Test suite for health monitoring

pub mod monitor;
pub mod provider;
pub mod types;

pub use monitor::HealthMonitor;
pub use provider::{HealthTransition, ProviderHealth};
pub use types::HealthSnapshot;
