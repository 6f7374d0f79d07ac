//! Health snapshot types

use crate::core::providers::ProviderId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time copy of one provider's health record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub provider: ProviderId,
    pub healthy: bool,
    /// Exponentially smoothed success rate in [0, 1]
    pub success_rate: f64,
    pub avg_response_time_ms: f64,
    pub consecutive_failures: u32,
    /// Wall-clock time of the last recorded outcome (or registration)
    pub last_check: DateTime<Utc>,
    pub last_error: Option<String>,
}
