//! Fallback orchestration integration tests

#[cfg(test)]
mod tests {
    use crate::common::GatewayFixture;
    use crate::common::fixtures::caller;
    use crate::common::providers::thorough_answer;
    use crate::{assert_approx_eq, assert_ok};
    use std::time::{Duration, Instant};
    use visibility_gateway::core::circuit_breaker::CircuitState;
    use visibility_gateway::core::providers::{MockClient, ProviderId};

    // ==================== Provider Selection ====================

    /// An open circuit keeps a provider out of the fallback entirely
    #[tokio::test]
    async fn test_open_circuit_provider_never_attempted() {
        let fixture = GatewayFixture::new(vec![
            MockClient::replying(ProviderId::OpenAi, thorough_answer()),
            MockClient::replying(ProviderId::Anthropic, thorough_answer()),
            MockClient::replying(ProviderId::Gemini, thorough_answer()),
        ])
        .await;

        let breaker = fixture
            .gateway
            .admission()
            .breaker(ProviderId::OpenAi)
            .unwrap();
        for _ in 0..5 {
            breaker.record_failure();
        }
        assert_eq!(breaker.state(), CircuitState::Open);

        for _ in 0..3 {
            let response = assert_ok!(
                fixture
                    .gateway
                    .query_with_fallback(&caller("acme"), "Best CRM?", 0.7, false)
                    .await
            );
            assert!(matches!(
                response.provider,
                Some(ProviderId::Anthropic) | Some(ProviderId::Gemini)
            ));
        }
        assert_eq!(fixture.calls(ProviderId::OpenAi), 0);
    }

    /// Repeated failures trip the breaker and later queries skip the provider
    #[tokio::test]
    async fn test_failing_provider_is_dropped_after_threshold() {
        let fixture = GatewayFixture::new(vec![
            MockClient::failing(ProviderId::OpenAi),
            MockClient::replying(ProviderId::Anthropic, "steady answer"),
        ])
        .await;

        for _ in 0..8 {
            let response = fixture
                .gateway
                .query_with_fallback(&caller("acme"), "q", 0.99, false)
                .await
                .unwrap();
            assert_eq!(response.provider, Some(ProviderId::Anthropic));
        }

        assert_eq!(fixture.calls(ProviderId::OpenAi), 5);
        assert_eq!(fixture.calls(ProviderId::Anthropic), 8);
        let status = fixture.gateway.system_status();
        let openai = status
            .providers
            .iter()
            .find(|p| p.health.provider == ProviderId::OpenAi)
            .unwrap();
        assert_eq!(openai.circuit_state, Some(CircuitState::Open));
        assert_eq!(fixture.metrics.snapshot().circuit_opened, 1);
    }

    /// Once the preferred providers trip their breakers, a lower-priority
    /// provider beyond the dispatch limit takes over
    #[tokio::test]
    async fn test_tripped_providers_yield_to_lower_priority() {
        let fixture = GatewayFixture::new(vec![
            MockClient::failing(ProviderId::OpenAi),
            MockClient::failing(ProviderId::Anthropic),
            MockClient::failing(ProviderId::Gemini),
            MockClient::failing(ProviderId::Perplexity),
            MockClient::replying(ProviderId::Mistral, thorough_answer()),
        ])
        .await;
        let failing = [
            ProviderId::OpenAi,
            ProviderId::Anthropic,
            ProviderId::Gemini,
            ProviderId::Perplexity,
        ];

        // four dispatch slots, all held by the failing providers
        for _ in 0..5 {
            let response = assert_ok!(
                fixture
                    .gateway
                    .query_with_fallback(&caller("acme"), "Best CRM?", 0.5, false)
                    .await
            );
            assert!(response.is_degraded());
        }
        assert_eq!(fixture.calls(ProviderId::Mistral), 0);
        assert_eq!(fixture.metrics.snapshot().circuit_opened, 4);

        let response = assert_ok!(
            fixture
                .gateway
                .query_with_fallback(&caller("acme"), "Best CRM?", 0.5, false)
                .await
        );
        assert_eq!(response.provider, Some(ProviderId::Mistral));

        let result = assert_ok!(
            fixture
                .gateway
                .aggregate_responses(&caller("acme"), "Best CRM?", 2)
                .await
        );
        assert_eq!(result.responses.len(), 1);
        assert_eq!(result.responses[0].provider, Some(ProviderId::Mistral));
        assert_eq!(result.skipped_providers, failing.to_vec());

        for id in failing {
            assert_eq!(fixture.calls(id), 5);
        }
        assert_eq!(fixture.calls(ProviderId::Mistral), 2);
    }

    /// A confident answer returns without waiting on slower providers
    #[tokio::test]
    async fn test_confident_answer_short_circuits() {
        let fixture = GatewayFixture::new(vec![
            MockClient::replying(ProviderId::OpenAi, thorough_answer())
                .with_delay(Duration::from_millis(10)),
            MockClient::hanging(ProviderId::Anthropic),
        ])
        .await;

        let start = Instant::now();
        let response = fixture
            .gateway
            .query_with_fallback(&caller("acme"), "q", 0.8, false)
            .await
            .unwrap();
        assert_eq!(response.provider, Some(ProviderId::OpenAi));
        assert!(start.elapsed() < Duration::from_millis(900));
    }

    // ==================== Degradation ====================

    #[tokio::test]
    async fn test_all_providers_failing_returns_degraded_response() {
        let fixture = GatewayFixture::new(vec![
            MockClient::failing(ProviderId::OpenAi),
            MockClient::hanging(ProviderId::Anthropic),
        ])
        .await;

        let response = fixture
            .gateway
            .query_with_fallback(&caller("acme"), "q", 0.7, true)
            .await
            .unwrap();
        assert!(response.partial);
        assert_eq!(response.confidence, 0.0);
        assert!(response.provider.is_none());
        assert_eq!(fixture.metrics.snapshot().degraded_responses, 1);
        assert_eq!(fixture.gateway.cache_stats().writes, 0);
    }

    #[tokio::test]
    async fn test_single_provider_answer_returned_below_threshold() {
        let fixture =
            GatewayFixture::new(vec![MockClient::replying(ProviderId::Mistral, "brief")]).await;

        let response = fixture
            .gateway
            .query_with_fallback(&caller("acme"), "q", 0.99, false)
            .await
            .unwrap();
        assert_eq!(response.text, "brief");
        assert!(response.confidence < 0.99);
        assert!(!response.partial);
    }

    // ==================== Caching ====================

    #[tokio::test]
    async fn test_repeat_query_served_from_cache() {
        let fixture = GatewayFixture::new(vec![MockClient::replying(
            ProviderId::OpenAi,
            thorough_answer(),
        )])
        .await;

        let first = fixture
            .gateway
            .query_with_fallback(&caller("acme"), "Top project tools", 0.7, true)
            .await
            .unwrap();
        let second = fixture
            .gateway
            .query_with_fallback(&caller("globex"), "top project tools", 0.7, true)
            .await
            .unwrap();

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.text, second.text);
        assert_eq!(fixture.calls(ProviderId::OpenAi), 1);
        // a cache hit consumes no rate budget
        assert_eq!(
            fixture
                .gateway
                .admission()
                .rate_limiter()
                .check("globex")
                .current_count,
            0
        );
    }

    // ==================== Aggregation ====================

    #[tokio::test]
    async fn test_aggregate_returns_requested_successes() {
        let delay = Duration::from_millis(25);
        let fixture = GatewayFixture::new(vec![
            MockClient::replying(ProviderId::OpenAi, thorough_answer()).with_delay(delay),
            MockClient::failing(ProviderId::Anthropic),
            MockClient::replying(ProviderId::Gemini, "short but fine").with_delay(delay),
            MockClient::failing(ProviderId::Perplexity),
        ])
        .await;

        let result = fixture
            .gateway
            .aggregate_responses(&caller("acme"), "q", 2)
            .await
            .unwrap();

        assert_eq!(result.responses.len(), 2);
        let mean = result.responses.iter().map(|r| r.confidence).sum::<f64>() / 2.0;
        assert_approx_eq!(result.consensus_confidence, mean);
        assert_eq!(result.failed_providers.len(), 2);
        assert!(result.failed_providers.contains(&ProviderId::Anthropic));
        assert!(result.failed_providers.contains(&ProviderId::Perplexity));
    }

    #[tokio::test]
    async fn test_aggregate_with_fewer_successes_than_requested() {
        let fixture = GatewayFixture::new(vec![
            MockClient::replying(ProviderId::OpenAi, "one"),
            MockClient::failing(ProviderId::Anthropic),
        ])
        .await;

        let result = fixture
            .gateway
            .aggregate_responses(&caller("acme"), "q", 3)
            .await
            .unwrap();
        assert_eq!(result.responses.len(), 1);
        assert_eq!(result.consensus_confidence, result.responses[0].confidence);
    }
}
