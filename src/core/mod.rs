//! Core functionality for the gateway
//!
//! Provider clients and their health, the admission gates every call passes
//! through, the response cache and the fallback orchestrator built on top.

pub mod admission;
pub mod cache_manager;
pub mod circuit_breaker;
pub mod cost; // Cost ledger and per-customer budgets
pub mod health; // Health monitoring system
pub mod orchestrator;
pub mod providers;
pub mod rate_limiter; // Sliding-window rate limiting
pub mod traits;
