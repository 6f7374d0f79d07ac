//! Cost budget tracking
//!
//! Per-caller spend ledgers with hourly, daily and monthly totals, a price
//! table to estimate call cost, threshold alerts, and an optional durable
//! sink for usage records.
//!
//! Reservations are pessimistic: the estimated cost is booked when a call is
//! admitted and corrected once the real token usage is known.

mod ledger;
pub mod pricing;
pub mod sink;
mod tracker;
pub mod types;


pub use pricing::PriceTable;
pub use sink::{JsonlUsageSink, MemoryUsageSink, NoopUsageSink, UsageSink};
pub use tracker::CostTracker;
pub use types::{
    CostAlert, CostDenial, CostPeriod, CostReservation, CustomerReport, PeriodUsage, UsageRecord,
};
