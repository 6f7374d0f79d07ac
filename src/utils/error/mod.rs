//! Error handling utilities
//!
//! Crate-level error type and result alias. Provider-local and cache-local
//! errors live next to their components and are folded into [`GatewayError`]
//! only where they are allowed to reach a caller.

pub mod error;

pub use error::*;
