//! Fallback orchestrator
//!
//! Entry point of the gateway's query path: consult the cache, pick the
//! available providers, admit and dispatch calls, score each reply and
//! return the first confident answer or the best one collected.
//!
//! # Module Structure
//!
//! - `types` - Response and aggregate types
//! - `confidence` - Confidence heuristic
//! - `dispatch` - One provider call with timeout and retry
//! - `coordinator` - The orchestrator
//! - `tests` - Test suite

pub mod confidence;
mod coordinator;
pub mod dispatch;
pub mod types;

pub use confidence::ConfidenceScorer;
pub use coordinator::FallbackOrchestrator;
pub use types::{AggregatedResponse, LlmResponse};
