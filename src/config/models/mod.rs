//! Configuration data models
//!
//! This module defines all configuration structures used throughout the gateway.

#![allow(missing_docs)]

pub mod admission;
pub mod cache;
pub mod gateway;
pub mod health;
pub mod logging;
pub mod orchestrator;
pub mod provider;

pub use admission::*;
pub use cache::*;
pub use gateway::*;
pub use health::*;
pub use logging::*;
pub use orchestrator::*;
pub use provider::*;

/// Default provider call timeout in seconds
pub fn default_timeout() -> u64 {
    30
}

/// Default maximum retry attempts per provider call
pub fn default_retry_count() -> u32 {
    2
}

pub fn default_max_tokens() -> u32 {
    1024
}

pub fn default_true() -> bool {
    true
}

pub fn default_customer_limit() -> u32 {
    60
}

pub fn default_window_secs() -> u64 {
    60
}

pub fn default_max_concurrent_calls() -> usize {
    32
}

pub fn default_failure_threshold() -> u32 {
    5
}

pub fn default_recovery_timeout() -> u64 {
    60
}

pub fn default_hourly_limit() -> f64 {
    100.0
}

pub fn default_daily_limit() -> f64 {
    1000.0
}

pub fn default_monthly_limit() -> f64 {
    10_000.0
}

pub fn default_alert_ratio() -> f64 {
    0.8
}

pub fn default_price_per_1k() -> f64 {
    0.002
}

pub fn default_key_prefix() -> String {
    "vg".to_string()
}

pub fn default_compression_threshold() -> usize {
    1024
}

pub fn default_hot_capacity() -> usize {
    100
}

pub fn default_hot_max_age() -> u64 {
    60
}

pub fn default_response_ttl() -> u64 {
    3600 // 1 hour
}

pub fn default_analysis_ttl() -> u64 {
    7200 // 2 hours
}

pub fn default_summary_ttl() -> u64 {
    86_400 // 24 hours
}

pub fn default_maintenance_interval() -> u64 {
    30
}
