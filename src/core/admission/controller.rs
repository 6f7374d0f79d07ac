//! Admission controller implementation

use super::permit::AdmissionPermit;
use super::types::{Admission, CallOutcome, Denial, DenialReason};
use crate::config::AdmissionConfig;
use crate::core::circuit_breaker::{
    CallDecision, CircuitBreaker, CircuitBreakerMetrics, CircuitState, CircuitTransition,
};
use crate::core::cost::{CostTracker, CustomerReport, UsageSink};
use crate::core::health::HealthMonitor;
use crate::core::providers::{CallerId, ProviderId};
use crate::core::rate_limiter::RateLimiter;
use crate::monitoring::metrics::{MetricsSink, NoopMetrics};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Retry hint when the global concurrency budget is exhausted
const CONCURRENCY_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Per-provider admission state
struct ProviderGate {
    breaker: Arc<CircuitBreaker>,
    model: String,
}

/// Combined rate, concurrency, cost and circuit gate
///
/// All state is keyed per caller or per provider, so unrelated requests never
/// contend on a shared lock. The health monitor is shared with the
/// orchestrator, which reads availability from it.
pub struct AdmissionController {
    config: AdmissionConfig,
    rate_limiter: RateLimiter,
    concurrency: Arc<Semaphore>,
    cost: CostTracker,
    gates: DashMap<ProviderId, ProviderGate>,
    health: Arc<HealthMonitor>,
    metrics: Arc<dyn MetricsSink>,
}

impl std::fmt::Debug for AdmissionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionController")
            .field("providers", &self.gates.len())
            .field("available_slots", &self.concurrency.available_permits())
            .field("cost", &self.cost)
            .finish_non_exhaustive()
    }
}

impl AdmissionController {
    pub fn new(config: AdmissionConfig, health: Arc<HealthMonitor>) -> Self {
        Self {
            rate_limiter: RateLimiter::new(config.rate_limit.clone()),
            concurrency: Arc::new(Semaphore::new(config.rate_limit.max_concurrent_calls)),
            cost: CostTracker::new(config.cost.clone()),
            gates: DashMap::new(),
            health,
            metrics: Arc::new(NoopMetrics),
            config,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Write settled usage records to `sink`
    pub fn with_usage_sink(mut self, sink: Arc<dyn UsageSink>) -> Self {
        self.cost = CostTracker::with_sink(self.config.cost.clone(), sink);
        self
    }

    /// Register a provider and the model its calls are priced at
    ///
    /// Re-registering keeps the existing circuit state.
    pub fn register(&self, provider: ProviderId, model: impl Into<String>) {
        let model = model.into();
        match self.gates.get_mut(&provider) {
            Some(mut gate) => gate.model = model,
            None => {
                self.gates.insert(
                    provider,
                    ProviderGate {
                        breaker: Arc::new(CircuitBreaker::from_config(
                            &self.config.circuit_breaker,
                        )),
                        model,
                    },
                );
            }
        }
    }

    /// Decide whether `caller` may call `provider` now
    ///
    /// On `Allow`, every gate has already booked the call: the rate window
    /// holds a timestamp, one concurrency slot is taken and the estimated
    /// cost is reserved. On `Deny`, nothing is left booked.
    pub fn check_and_reserve(
        &self,
        caller: &CallerId,
        provider: ProviderId,
        estimated_tokens: u64,
    ) -> Admission {
        let (breaker, model) = self.gate(provider);

        let (decision, transition) = breaker.try_acquire();
        if let Some(t) = transition {
            self.on_transition(provider, t);
        }
        let trial = match decision {
            CallDecision::Allowed { trial } => trial,
            CallDecision::Rejected { retry_after } => {
                return self.deny(Denial::new(
                    DenialReason::CircuitOpen,
                    Some(retry_after),
                    format!("circuit for {} is open", provider),
                ));
            }
        };
        let rollback_circuit = || {
            if trial {
                breaker.abandon_trial();
            }
        };

        let window = self.rate_limiter.check_and_record(caller.as_str());
        if !window.allowed {
            rollback_circuit();
            return self.deny(Denial::new(
                DenialReason::RateLimited,
                window.retry_after,
                format!(
                    "{} made {} calls in the current window (limit {})",
                    caller, window.current_count, window.limit
                ),
            ));
        }
        let rollback_window = || {
            if let Some(at) = window.recorded_at {
                self.rate_limiter.rollback(caller.as_str(), at);
            }
        };

        let slot = match self.concurrency.clone().try_acquire_owned() {
            Ok(slot) => slot,
            Err(_) => {
                rollback_window();
                rollback_circuit();
                return self.deny(Denial::new(
                    DenialReason::ConcurrencyExhausted,
                    Some(CONCURRENCY_RETRY_AFTER),
                    "global concurrent-call budget exhausted",
                ));
            }
        };

        let reservation = match self
            .cost
            .reserve(caller.as_str(), provider, &model, estimated_tokens)
        {
            Ok((reservation, alerts)) => {
                for alert in &alerts {
                    self.metrics.cost_alert(&alert.caller, alert.period);
                }
                reservation
            }
            Err(denial) => {
                drop(slot);
                rollback_window();
                rollback_circuit();
                let mut denied = Denial::new(
                    DenialReason::CostLimitExceeded,
                    None,
                    denial.to_string(),
                );
                denied.period = Some(denial.period);
                return self.deny(denied);
            }
        };

        debug!(
            %caller,
            %provider,
            trial,
            estimated_cost = reservation.estimated_cost,
            "Call admitted"
        );
        Admission::Allow(AdmissionPermit {
            caller: caller.clone(),
            provider,
            trial,
            breaker,
            reservation: Some(reservation),
            _slot: Some(slot),
            settled: false,
        })
    }

    /// Feed the outcome of an admitted call back into every gate
    ///
    /// Success books actual token usage; failure refunds the cost
    /// reservation since nothing billable was produced.
    pub async fn settle(&self, mut permit: AdmissionPermit, outcome: CallOutcome) {
        permit.settled = true;
        let provider = permit.provider;
        let reservation = permit.reservation.take();

        match outcome {
            CallOutcome::Success {
                latency,
                tokens_used,
            } => {
                if let Some(t) = permit.breaker.record_success() {
                    self.on_transition(provider, t);
                }
                self.health.record_success(provider, latency);
                self.metrics.provider_call(provider, true, latency);
                if let Some(reservation) = reservation {
                    self.cost
                        .settle(reservation, tokens_used.map(u64::from))
                        .await;
                }
            }
            CallOutcome::Failure { latency, error } => {
                if let Some(t) = permit.breaker.record_failure() {
                    self.on_transition(provider, t);
                }
                self.health.record_failure(provider, &error);
                self.metrics.provider_call(provider, false, latency);
                if let Some(reservation) = reservation {
                    self.cost.release(reservation);
                }
            }
        }
    }

    /// Whether a call to `provider` would currently pass its circuit
    ///
    /// Read-only: never advances the breaker or takes the trial slot.
    pub fn circuit_allows(&self, provider: ProviderId) -> bool {
        match self.gates.get(&provider) {
            Some(gate) => match gate.breaker.state() {
                CircuitState::Closed => true,
                CircuitState::HalfOpen => !gate.breaker.metrics().trial_in_flight,
                CircuitState::Open => gate.breaker.remaining_open_time() == Some(Duration::ZERO),
            },
            None => true,
        }
    }

    pub fn circuit_state(&self, provider: ProviderId) -> Option<CircuitState> {
        self.gates.get(&provider).map(|g| g.breaker.state())
    }

    /// Circuit breaker metrics for every registered provider, by id
    pub fn circuit_metrics(&self) -> Vec<(ProviderId, CircuitBreakerMetrics)> {
        let mut all: Vec<_> = self
            .gates
            .iter()
            .map(|entry| (*entry.key(), entry.value().breaker.metrics()))
            .collect();
        all.sort_by_key(|(id, _)| *id);
        all
    }

    pub fn breaker(&self, provider: ProviderId) -> Option<Arc<CircuitBreaker>> {
        self.gates.get(&provider).map(|g| g.breaker.clone())
    }

    /// Close the circuit and reset health for `provider`
    pub fn reset_provider(&self, provider: ProviderId) {
        if let Some(gate) = self.gates.get(&provider) {
            gate.breaker.reset();
        }
        self.health.reset(provider);
        info!(%provider, "Provider admission state reset");
    }

    pub fn customer_report(&self, caller: &CallerId) -> CustomerReport {
        self.cost.customer_report(caller.as_str())
    }

    pub fn cost(&self) -> &CostTracker {
        &self.cost
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    pub fn health(&self) -> &Arc<HealthMonitor> {
        &self.health
    }

    /// Free slots in the global concurrency budget
    pub fn available_concurrency(&self) -> usize {
        self.concurrency.available_permits()
    }

    /// Prune idle rate windows and cost ledgers
    pub fn maintenance(&self) {
        let windows = self.rate_limiter.cleanup();
        let ledgers = self.cost.cleanup();
        if windows > 0 || ledgers > 0 {
            debug!(windows, ledgers, "Pruned idle admission state");
        }
    }

    pub async fn flush(&self) {
        self.cost.flush().await;
    }

    fn gate(&self, provider: ProviderId) -> (Arc<CircuitBreaker>, String) {
        if let Some(gate) = self.gates.get(&provider) {
            return (gate.breaker.clone(), gate.model.clone());
        }
        let gate = self.gates.entry(provider).or_insert_with(|| ProviderGate {
            breaker: Arc::new(CircuitBreaker::from_config(&self.config.circuit_breaker)),
            model: provider.default_model().to_string(),
        });
        (gate.breaker.clone(), gate.model.clone())
    }

    fn deny(&self, denial: Denial) -> Admission {
        debug!(reason = %denial.reason, "Call denied: {}", denial.message);
        self.metrics.admission_denied(denial.reason);
        Admission::Deny(denial)
    }

    fn on_transition(&self, provider: ProviderId, transition: CircuitTransition) {
        if transition.to == CircuitState::Open {
            warn!(%provider, from = %transition.from, "Circuit opened");
        } else {
            info!(%provider, from = %transition.from, to = %transition.to, "Circuit state changed");
        }
        self.metrics
            .circuit_transition(provider, transition.from, transition.to);
    }
}
