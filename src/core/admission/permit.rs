//! Admission permit

use crate::core::circuit_breaker::CircuitBreaker;
use crate::core::cost::CostReservation;
use crate::core::providers::{CallerId, ProviderId};
use std::sync::Arc;
use tokio::sync::OwnedSemaphorePermit;

/// Proof that a call was admitted
///
/// Holds one slot of the global concurrency budget until it is settled or
/// dropped. Dropping an unsettled permit frees a half-open trial slot so the
/// circuit can probe again; the cost reservation is kept.
pub struct AdmissionPermit {
    pub(super) caller: CallerId,
    pub(super) provider: ProviderId,
    pub(super) trial: bool,
    pub(super) breaker: Arc<CircuitBreaker>,
    pub(super) reservation: Option<CostReservation>,
    pub(super) _slot: Option<OwnedSemaphorePermit>,
    pub(super) settled: bool,
}

impl AdmissionPermit {
    pub fn caller(&self) -> &CallerId {
        &self.caller
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    /// Whether this call is the half-open trial probe
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    /// Cost booked against the caller for this call
    pub fn estimated_cost(&self) -> f64 {
        self.reservation
            .as_ref()
            .map(|r| r.estimated_cost)
            .unwrap_or(0.0)
    }
}

impl std::fmt::Debug for AdmissionPermit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionPermit")
            .field("caller", &self.caller)
            .field("provider", &self.provider)
            .field("trial", &self.trial)
            .field("estimated_cost", &self.estimated_cost())
            .finish()
    }
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        if !self.settled && self.trial {
            self.breaker.abandon_trial();
        }
    }
}
