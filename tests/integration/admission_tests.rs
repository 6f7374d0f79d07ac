//! Admission control integration tests
//!
//! Rate limits, concurrency caps, cost budgets and circuit recovery as seen
//! by a caller of the gateway.

#[cfg(test)]
mod tests {
    use crate::common::GatewayFixture;
    use crate::common::fixtures::caller;
    use crate::{assert_err, assert_ok};
    use std::time::Duration;
    use visibility_gateway::GatewayError;
    use visibility_gateway::config::{CostLimits, GatewayConfig};
    use visibility_gateway::core::circuit_breaker::CircuitState;
    use visibility_gateway::core::providers::{MockClient, MockOutcome, ProviderId, ProviderReply};

    fn config_with(customize: impl FnOnce(&mut GatewayConfig)) -> GatewayConfig {
        let mut config = GatewayConfig::default();
        customize(&mut config);
        config
    }

    // ==================== Rate Limiting ====================

    #[tokio::test]
    async fn test_rate_limit_is_per_caller() {
        let config = config_with(|c| c.admission.rate_limit.customer_limit = 2);
        let fixture =
            GatewayFixture::with_config(config, vec![MockClient::replying(ProviderId::OpenAi, "ok")])
                .await;

        for _ in 0..2 {
            assert_ok!(
                fixture
                    .gateway
                    .query_with_fallback(&caller("acme"), "q", 0.5, false)
                    .await
            );
        }
        let err = assert_err!(
            fixture
                .gateway
                .query_with_fallback(&caller("acme"), "q", 0.5, false)
                .await
        );
        assert!(matches!(err, GatewayError::RateLimited { .. }));
        let retry_after = err.retry_after().unwrap();
        assert!(retry_after > Duration::ZERO && retry_after <= Duration::from_secs(60));

        // another caller is unaffected
        assert_ok!(
            fixture
                .gateway
                .query_with_fallback(&caller("globex"), "q", 0.5, false)
                .await
        );
        assert_eq!(fixture.metrics.snapshot().denied_rate_limited, 1);
    }

    #[tokio::test]
    async fn test_rate_limit_override_for_caller() {
        let config = config_with(|c| {
            c.admission.rate_limit.customer_limit = 1;
            c.admission
                .rate_limit
                .overrides
                .insert("enterprise".to_string(), 3);
        });
        let fixture =
            GatewayFixture::with_config(config, vec![MockClient::replying(ProviderId::OpenAi, "ok")])
                .await;

        for _ in 0..3 {
            assert_ok!(
                fixture
                    .gateway
                    .query_with_fallback(&caller("enterprise"), "q", 0.5, false)
                    .await
            );
        }
        assert!(
            fixture
                .gateway
                .query_with_fallback(&caller("enterprise"), "q", 0.5, false)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_concurrency_cap_denies_excess_calls() {
        let config = config_with(|c| c.admission.rate_limit.max_concurrent_calls = 1);
        let fixture = GatewayFixture::with_config(
            config,
            vec![
                MockClient::replying(ProviderId::OpenAi, "ok")
                    .with_delay(Duration::from_millis(200)),
            ],
        )
        .await;

        let acme = caller("acme");
        let globex = caller("globex");
        let (first, second) = tokio::join!(
            fixture
                .gateway
                .query_with_fallback(&acme, "q", 0.5, false),
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                fixture
                    .gateway
                    .query_with_fallback(&globex, "q", 0.5, false)
                    .await
            }
        );

        assert!(first.is_ok());
        assert!(matches!(second, Err(GatewayError::RateLimited { .. })));
        assert_eq!(fixture.metrics.snapshot().denied_concurrency, 1);
        assert_eq!(fixture.gateway.admission().available_concurrency(), 1);
    }

    // ==================== Cost Budgets ====================

    #[tokio::test]
    async fn test_cost_budget_blocks_further_calls() {
        let config = config_with(|c| {
            c.admission.cost.model_prices.insert("gpt-4o-mini".to_string(), 10.0);
            c.admission.cost.overrides.insert(
                "startup".to_string(),
                CostLimits {
                    hourly: 22.0,
                    daily: 22.0,
                    monthly: 22.0,
                },
            );
        });
        let reply = ProviderReply::new("answer").with_tokens(1_000);
        let fixture = GatewayFixture::with_config(
            config,
            vec![MockClient::new(ProviderId::OpenAi, MockOutcome::Reply(reply))],
        )
        .await;
        let startup = caller("startup");

        let mut served = 0;
        let mut denial = None;
        for _ in 0..5 {
            match fixture
                .gateway
                .query_with_fallback(&startup, "q", 0.5, false)
                .await
            {
                Ok(_) => served += 1,
                Err(e) => {
                    denial = Some(e);
                    break;
                }
            }
        }

        let denial = denial.expect("budget is exhausted within five calls");
        assert!(served >= 1);
        assert!(matches!(denial, GatewayError::CostLimitExceeded { .. }));
        assert!(!denial.is_retryable());

        let report = fixture.gateway.customer_report(&startup);
        assert_eq!(report.hourly.limit, 22.0);
        assert!(report.hourly.cost <= 22.0);
        assert_eq!(report.hourly.requests, served);
        assert_eq!(fixture.usage.len() as u64, served);
        assert!(fixture.metrics.snapshot().cost_alerts >= 1);
    }

    #[tokio::test]
    async fn test_failed_calls_are_not_billed() {
        let fixture =
            GatewayFixture::new(vec![MockClient::failing(ProviderId::Anthropic)]).await;
        let acme = caller("acme");

        let response = fixture
            .gateway
            .query_with_fallback(&acme, "q", 0.5, false)
            .await
            .unwrap();
        assert!(response.partial);

        let report = fixture.gateway.customer_report(&acme);
        assert_eq!(report.daily.cost, 0.0);
        assert_eq!(report.daily.requests, 0);
        assert!(fixture.usage.is_empty());
    }

    // ==================== Circuit Breaking ====================

    #[tokio::test]
    async fn test_circuit_recovers_after_timeout() {
        let config = config_with(|c| {
            c.admission.circuit_breaker.failure_threshold = 2;
            c.admission.circuit_breaker.recovery_timeout = 1;
        });
        let client = MockClient::replying(ProviderId::OpenAi, "back online")
            .then_fail(503)
            .then_fail(503);
        let fixture = GatewayFixture::with_config(config, vec![client]).await;
        let acme = caller("acme");

        for _ in 0..2 {
            let response = fixture
                .gateway
                .query_with_fallback(&acme, "q", 0.5, false)
                .await
                .unwrap();
            assert!(response.partial);
        }
        assert_eq!(
            fixture.gateway.admission().circuit_state(ProviderId::OpenAi),
            Some(CircuitState::Open)
        );

        let err = fixture
            .gateway
            .query_with_fallback(&acme, "q", 0.5, false)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::AllCircuitsOpen { .. }));

        tokio::time::sleep(Duration::from_millis(1_100)).await;

        let response = fixture
            .gateway
            .query_with_fallback(&acme, "q", 0.5, false)
            .await
            .unwrap();
        assert_eq!(response.text, "back online");
        assert_eq!(
            fixture.gateway.admission().circuit_state(ProviderId::OpenAi),
            Some(CircuitState::Closed)
        );
        assert_eq!(fixture.calls(ProviderId::OpenAi), 3);
    }
}
