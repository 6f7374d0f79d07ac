//! Tests for admission control

use super::*;
use crate::config::{AdmissionConfig, CostLimits, HealthConfig};
use crate::core::circuit_breaker::CircuitState;
use crate::core::cost::{CostPeriod, MemoryUsageSink};
use crate::core::health::HealthMonitor;
use crate::core::providers::{CallerId, ProviderId};
use crate::monitoring::metrics::InMemoryMetrics;
use std::sync::Arc;
use std::time::Duration;

const MODEL: &str = "test-model";

fn config() -> AdmissionConfig {
    let mut config = AdmissionConfig::default();
    config.rate_limit.customer_limit = 100;
    config.rate_limit.max_concurrent_calls = 8;
    config.circuit_breaker.failure_threshold = 2;
    config.circuit_breaker.recovery_timeout = 60;
    config.cost.model_prices.insert(MODEL.to_string(), 1.0);
    config
}

fn controller(config: AdmissionConfig) -> (AdmissionController, Arc<InMemoryMetrics>) {
    let health = Arc::new(HealthMonitor::new(HealthConfig::default()));
    health.register(ProviderId::OpenAi, 1);
    health.register(ProviderId::Anthropic, 2);
    let metrics = Arc::new(InMemoryMetrics::new());
    let controller = AdmissionController::new(config, health).with_metrics(metrics.clone());
    controller.register(ProviderId::OpenAi, MODEL);
    controller.register(ProviderId::Anthropic, MODEL);
    (controller, metrics)
}

fn admit(controller: &AdmissionController, caller: &CallerId, provider: ProviderId) -> AdmissionPermit {
    match controller.check_and_reserve(caller, provider, 100) {
        Admission::Allow(permit) => permit,
        Admission::Deny(denial) => panic!("unexpected denial: {}", denial),
    }
}

fn denial(admission: Admission) -> Denial {
    match admission {
        Admission::Deny(denial) => denial,
        Admission::Allow(permit) => panic!("unexpected admission: {:?}", permit),
    }
}

fn failure() -> CallOutcome {
    CallOutcome::Failure {
        latency: Duration::from_millis(5),
        error: "boom".to_string(),
    }
}

fn success(tokens: Option<u32>) -> CallOutcome {
    CallOutcome::Success {
        latency: Duration::from_millis(5),
        tokens_used: tokens,
    }
}

#[test]
fn test_denial_reason_names() {
    assert_eq!(DenialReason::RateLimited.as_str(), "rate_limited");
    assert_eq!(
        DenialReason::ConcurrencyExhausted.to_string(),
        "concurrency_exhausted"
    );
    assert!(DenialReason::CostLimitExceeded.severity() > DenialReason::RateLimited.severity());
    assert!(DenialReason::RateLimited.severity() > DenialReason::CircuitOpen.severity());
}

#[tokio::test]
async fn test_allow_books_every_gate() {
    let (controller, _) = controller(config());
    let caller = CallerId::from("acme");

    let permit = admit(&controller, &caller, ProviderId::OpenAi);
    assert_eq!(permit.provider(), ProviderId::OpenAi);
    assert!(!permit.is_trial());
    assert!((permit.estimated_cost() - 0.1).abs() < 1e-9);
    assert_eq!(controller.available_concurrency(), 7);
    assert_eq!(controller.rate_limiter().check("acme").current_count, 1);

    controller.settle(permit, success(Some(200))).await;
    assert_eq!(controller.available_concurrency(), 8);

    let report = controller.customer_report(&caller);
    assert_eq!(report.daily.tokens, 200);
    assert!((report.daily.cost - 0.2).abs() < 1e-9);
}

#[tokio::test]
async fn test_rate_limit_denial_carries_retry_after() {
    let mut config = config();
    config.rate_limit.customer_limit = 2;
    let (controller, metrics) = controller(config);
    let caller = CallerId::from("acme");

    for _ in 0..2 {
        let permit = admit(&controller, &caller, ProviderId::OpenAi);
        controller.settle(permit, success(None)).await;
    }

    let denied = denial(controller.check_and_reserve(&caller, ProviderId::OpenAi, 100));
    assert_eq!(denied.reason, DenialReason::RateLimited);
    assert!(denied.retry_after.unwrap() > Duration::ZERO);
    assert_eq!(metrics.snapshot().denied_rate_limited, 1);
    // the denied call booked nothing
    assert_eq!(controller.available_concurrency(), 8);
    assert_eq!(controller.customer_report(&caller).daily.requests, 2);

    // another caller is unaffected
    assert!(
        controller
            .check_and_reserve(&CallerId::from("other"), ProviderId::OpenAi, 100)
            .is_allowed()
    );
}

#[test]
fn test_concurrency_exhaustion_rolls_back_window() {
    let mut config = config();
    config.rate_limit.max_concurrent_calls = 1;
    let (controller, metrics) = controller(config);
    let caller = CallerId::from("acme");

    let held = admit(&controller, &caller, ProviderId::OpenAi);
    let denied = denial(controller.check_and_reserve(&caller, ProviderId::Anthropic, 100));
    assert_eq!(denied.reason, DenialReason::ConcurrencyExhausted);
    assert!(denied.retry_after.is_some());
    assert_eq!(controller.rate_limiter().check("acme").current_count, 1);
    assert_eq!(metrics.snapshot().denied_concurrency, 1);

    drop(held);
    assert!(
        controller
            .check_and_reserve(&caller, ProviderId::Anthropic, 100)
            .is_allowed()
    );
}

#[test]
fn test_cost_denial_reports_period_and_rolls_back() {
    let mut config = config();
    config.cost.limits = CostLimits {
        hourly: 1_000_000.0,
        daily: 1000.0,
        monthly: 1_000_000.0,
    };
    let (controller, metrics) = controller(config);
    let caller = CallerId::from("acme");

    // 300 USD each; the fourth would cross the daily limit
    let mut permits = Vec::new();
    for _ in 0..3 {
        match controller.check_and_reserve(&caller, ProviderId::OpenAi, 300_000) {
            Admission::Allow(p) => permits.push(p),
            Admission::Deny(d) => panic!("unexpected denial: {}", d),
        }
    }
    let denied = denial(controller.check_and_reserve(&caller, ProviderId::OpenAi, 300_000));
    assert_eq!(denied.reason, DenialReason::CostLimitExceeded);
    assert_eq!(denied.period, Some(CostPeriod::Daily));
    assert_eq!(denied.retry_after, None);
    assert_eq!(metrics.snapshot().denied_cost, 1);
    assert_eq!(controller.available_concurrency(), 5);
    assert_eq!(controller.rate_limiter().check("acme").current_count, 3);

    let err = denied.into_error(&caller);
    assert!(!err.is_retryable());
    assert!(err.to_string().contains("daily"));
}

#[tokio::test]
async fn test_failures_open_circuit_for_that_provider_only() {
    let (controller, metrics) = controller(config());
    let caller = CallerId::from("acme");

    for _ in 0..2 {
        let permit = admit(&controller, &caller, ProviderId::OpenAi);
        controller.settle(permit, failure()).await;
    }
    assert_eq!(
        controller.circuit_state(ProviderId::OpenAi),
        Some(CircuitState::Open)
    );
    assert!(!controller.circuit_allows(ProviderId::OpenAi));
    assert!(controller.circuit_allows(ProviderId::Anthropic));

    let denied = denial(controller.check_and_reserve(&caller, ProviderId::OpenAi, 100));
    assert_eq!(denied.reason, DenialReason::CircuitOpen);
    let retry_after = denied.retry_after.unwrap();
    assert!(retry_after > Duration::from_secs(55));
    assert!(retry_after <= Duration::from_secs(60));

    // a circuit denial books nothing
    assert_eq!(controller.rate_limiter().check("acme").current_count, 2);

    assert!(
        controller
            .check_and_reserve(&caller, ProviderId::Anthropic, 100)
            .is_allowed()
    );

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.circuit_opened, 1);
    assert_eq!(snapshot.denied_circuit_open, 1);
    assert_eq!(snapshot.providers[&ProviderId::OpenAi].failures, 2);
}

#[tokio::test]
async fn test_failures_feed_health_and_refund_cost() {
    let (controller, _) = controller(config());
    let caller = CallerId::from("acme");

    let permit = admit(&controller, &caller, ProviderId::Anthropic);
    controller.settle(permit, failure()).await;

    let health = controller.health().snapshot(ProviderId::Anthropic).unwrap();
    assert_eq!(health.consecutive_failures, 1);
    assert!(health.success_rate < 1.0);
    assert_eq!(health.last_error.as_deref(), Some("boom"));

    let report = controller.customer_report(&caller);
    assert_eq!(report.daily.cost, 0.0);
    assert_eq!(report.daily.requests, 0);
}

#[tokio::test]
async fn test_half_open_admits_single_trial() {
    let mut config = config();
    config.circuit_breaker.recovery_timeout = 0;
    let (controller, _) = controller(config);
    let caller = CallerId::from("acme");

    for _ in 0..2 {
        let permit = admit(&controller, &caller, ProviderId::OpenAi);
        controller.settle(permit, failure()).await;
    }

    let trial = admit(&controller, &caller, ProviderId::OpenAi);
    assert!(trial.is_trial());
    assert_eq!(
        controller.circuit_state(ProviderId::OpenAi),
        Some(CircuitState::HalfOpen)
    );
    let second = denial(controller.check_and_reserve(&caller, ProviderId::OpenAi, 100));
    assert_eq!(second.reason, DenialReason::CircuitOpen);

    controller.settle(trial, success(None)).await;
    assert_eq!(
        controller.circuit_state(ProviderId::OpenAi),
        Some(CircuitState::Closed)
    );
    assert_eq!(
        controller.breaker(ProviderId::OpenAi).unwrap().failure_count(),
        0
    );
}

#[tokio::test]
async fn test_dropped_trial_permit_frees_probe() {
    let mut config = config();
    config.circuit_breaker.recovery_timeout = 0;
    let (controller, _) = controller(config);
    let caller = CallerId::from("acme");

    for _ in 0..2 {
        let permit = admit(&controller, &caller, ProviderId::OpenAi);
        controller.settle(permit, failure()).await;
    }

    let trial = admit(&controller, &caller, ProviderId::OpenAi);
    drop(trial);
    assert!(admit(&controller, &caller, ProviderId::OpenAi).is_trial());
}

#[test]
fn test_trial_released_when_later_gate_denies() {
    let mut config = config();
    config.circuit_breaker.recovery_timeout = 0;
    config.rate_limit.customer_limit = 1;
    let (controller, _) = controller(config);
    let breaker = controller.breaker(ProviderId::OpenAi).unwrap();
    breaker.record_failure();
    breaker.record_failure();

    let caller = CallerId::from("acme");
    let _first = admit(&controller, &caller, ProviderId::Anthropic);

    // the trial slot is taken, then the rate window refuses
    let denied = denial(controller.check_and_reserve(&caller, ProviderId::OpenAi, 100));
    assert_eq!(denied.reason, DenialReason::RateLimited);
    assert!(!breaker.metrics().trial_in_flight);
}

#[tokio::test]
async fn test_usage_sink_receives_settled_calls() {
    let sink = Arc::new(MemoryUsageSink::new());
    let health = Arc::new(HealthMonitor::new(HealthConfig::default()));
    let controller = AdmissionController::new(config(), health).with_usage_sink(sink.clone());
    controller.register(ProviderId::Gemini, MODEL);
    let caller = CallerId::from("acme");

    let permit = admit(&controller, &caller, ProviderId::Gemini);
    controller.settle(permit, success(Some(50))).await;
    let permit = admit(&controller, &caller, ProviderId::Gemini);
    controller.settle(permit, failure()).await;

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].provider, ProviderId::Gemini);
    assert_eq!(records[0].tokens, 50);
    assert!(!records[0].estimated);
}

#[test]
fn test_unregistered_provider_gets_default_gate() {
    let (controller, _) = controller(config());
    assert_eq!(controller.circuit_state(ProviderId::Mistral), None);
    assert!(
        controller
            .check_and_reserve(&CallerId::from("acme"), ProviderId::Mistral, 100)
            .is_allowed()
    );
    assert_eq!(
        controller.circuit_state(ProviderId::Mistral),
        Some(CircuitState::Closed)
    );
}

#[test]
fn test_reset_provider_closes_circuit() {
    let (controller, _) = controller(config());
    let breaker = controller.breaker(ProviderId::OpenAi).unwrap();
    breaker.record_failure();
    breaker.record_failure();
    assert_eq!(breaker.state(), CircuitState::Open);

    controller.reset_provider(ProviderId::OpenAi);
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(controller.circuit_metrics().len(), 2);
}
