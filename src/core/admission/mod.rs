//! Admission control
//!
//! Every outbound provider call passes through [`AdmissionController`]
//! first. It combines the provider's circuit breaker, the caller's sliding
//! rate window, the global concurrency budget and the caller's cost ledger
//! into a single allow/deny decision, and later settles the call outcome
//! back into the same state.

mod controller;
mod permit;
#[cfg(test)]
mod tests;
mod types;

pub use controller::AdmissionController;
pub use permit::AdmissionPermit;
pub use types::{Admission, CallOutcome, Denial, DenialReason};
