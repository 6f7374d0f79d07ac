//! Cost tracking types

use crate::core::providers::ProviderId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Budget period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostPeriod {
    Hourly,
    Daily,
    Monthly,
}

impl CostPeriod {
    pub const ALL: [CostPeriod; 3] = [CostPeriod::Hourly, CostPeriod::Daily, CostPeriod::Monthly];

    pub fn as_str(&self) -> &'static str {
        match self {
            CostPeriod::Hourly => "hourly",
            CostPeriod::Daily => "daily",
            CostPeriod::Monthly => "monthly",
        }
    }
}

impl fmt::Display for CostPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spend crossed a fraction of a caller's limit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostAlert {
    pub caller: String,
    pub period: CostPeriod,
    pub threshold_ratio: f64,
    pub spent: f64,
    pub limit: f64,
    pub at: DateTime<Utc>,
}

/// One usage entry written to the durable sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub caller: String,
    pub provider: ProviderId,
    pub model: String,
    pub tokens: u64,
    /// USD
    pub cost: f64,
    /// True when the provider reported no usage and the estimate stands
    pub estimated: bool,
    pub at: DateTime<Utc>,
}

/// Cost booked at admission time, to be settled or released
#[derive(Debug, Clone, PartialEq)]
pub struct CostReservation {
    pub caller: String,
    pub provider: ProviderId,
    pub model: String,
    pub estimated_tokens: u64,
    pub estimated_cost: f64,
    pub reserved_at: DateTime<Utc>,
}

/// Reservation refused because a period limit would be exceeded
#[derive(Debug, Clone, PartialEq)]
pub struct CostDenial {
    pub period: CostPeriod,
    pub spent: f64,
    pub requested: f64,
    pub limit: f64,
}

impl fmt::Display for CostDenial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cost limit ${:.2} would be exceeded (spent ${:.4}, requested ${:.4})",
            self.period, self.limit, self.spent, self.requested
        )
    }
}

/// Usage within one budget period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodUsage {
    /// USD
    pub cost: f64,
    pub tokens: u64,
    pub requests: u64,
    /// USD
    pub limit: f64,
}

/// Spend report for one caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerReport {
    pub caller: String,
    pub hourly: PeriodUsage,
    pub daily: PeriodUsage,
    pub monthly: PeriodUsage,
    pub generated_at: DateTime<Utc>,
}
