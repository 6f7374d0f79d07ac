//! Integration tests for visibility-gateway
//!
//! These tests drive a fully wired gateway through its public API. Providers
//! are scripted mocks or a local HTTP mock server; nothing leaves the host.

pub mod admission_tests;
pub mod cache_tests;
pub mod config_tests;
pub mod fallback_tests;
pub mod http_client_tests;
pub mod usage_sink_tests;
