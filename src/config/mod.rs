//! Gateway configuration
//!
//! One [`GatewayConfig`] per process, loaded from YAML or the environment and
//! validated section by section before any component is built.

mod loader;
pub mod models;
pub mod validation;

pub use models::*;
pub use validation::Validate;
