//! # visibility-gateway
//!
//! Multi-provider LLM query gateway for brand-visibility analytics.
//!
//! Every query passes through per-customer admission control (sliding-window
//! rate limits, a cost ledger with hourly, daily and monthly budgets, and
//! per-provider circuit breakers), is served from a two-level response cache
//! when possible, and otherwise fans out to the healthiest providers until a
//! confident answer arrives.
//!
//! ## Features
//!
//! - **Health-aware fallback**: providers ordered by priority, filtered by an
//!   EWMA health record, scored by a confidence heuristic
//! - **Admission control**: rate limits, concurrency caps, cost budgets and
//!   circuit breakers checked before any provider is called
//! - **Intelligent cache**: hot in-process LRU over a memory or Redis backend,
//!   gzip for large payloads, dedup windows and distributed locks
//! - **Graceful degradation**: exhausted fallbacks return a marked degraded
//!   response instead of an error
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use visibility_gateway::{CallerId, GatewayConfig, VisibilityGateway};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GatewayConfig::from_file("config/gateway.yaml").await?;
//!     let gateway = VisibilityGateway::builder().config(config).build().await?;
//!     gateway.start();
//!
//!     let caller = CallerId::from("acme");
//!     let response = gateway
//!         .query_with_fallback(&caller, "Which CRM tools do you recommend?", 0.7, true)
//!         .await?;
//!     println!("{} (confidence {:.2})", response.text, response.confidence);
//!
//!     gateway.shutdown().await;
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod core;
pub mod gateway;
pub mod monitoring;
pub mod storage;
pub mod utils;

// Re-export main types
pub use config::GatewayConfig;
pub use gateway::{GatewayBuilder, ProviderStatus, SystemStatus, VisibilityGateway};
pub use utils::error::{GatewayError, Result};

pub use core::admission::{AdmissionController, DenialReason};
pub use core::cache_manager::{CacheKey, CacheNamespace, CacheStats, IntelligentCache, TtlClass};
pub use core::cost::{CustomerReport, UsageSink};
pub use core::orchestrator::{AggregatedResponse, LlmResponse};
pub use core::providers::{CallerId, MockClient, ProviderError, ProviderId, ProviderRegistry};
pub use core::traits::{CacheBackend, LlmClient};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Description of the crate
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
