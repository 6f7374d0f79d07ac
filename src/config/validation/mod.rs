//! Configuration validation
//!
//! This module provides validation logic for all configuration structures.
//!
//! The validation is organized into several submodules:
//! - `trait_def`: Core Validate trait definition
//! - `config_validators`: GatewayConfig, ProviderConfig and HealthConfig
//! - `admission_validators`: Rate limit, circuit breaker and cost validators
//! - `cache_validators`: Cache and orchestrator validators
//! - `tests`: Test suite for all validators

mod admission_validators;
mod cache_validators;
mod config_validators;
mod trait_def;

pub use trait_def::Validate;
