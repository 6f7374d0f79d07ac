//! Core traits module
//!
//! Seams between the gateway core and its collaborators: upstream LLM
//! clients and the cache backing store.

pub mod cache;
pub mod client;

pub use cache::{CacheBackend, CacheError};
pub use client::LlmClient;
