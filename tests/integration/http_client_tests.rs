//! HTTP provider client tests against a local mock server

#[cfg(test)]
mod tests {
    use crate::common::providers::{anthropic_message, http_provider, openai_completion};
    use std::sync::Arc;
    use std::time::Duration;
    use visibility_gateway::core::providers::{
        AnthropicClient, OpenAiCompatibleClient, ProviderError, ProviderId, create_client,
    };
    use visibility_gateway::storage::MemoryBackend;
    use visibility_gateway::{CallerId, GatewayConfig, LlmClient, VisibilityGateway};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // ==================== OpenAI-compatible ====================

    #[tokio::test]
    async fn test_openai_compatible_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "max_tokens": 64,
                "messages": [{ "role": "user", "content": "Best CRM?" }]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(openai_completion("HubSpot", 42)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let config = http_provider(ProviderId::OpenAi, &format!("{}/v1", server.uri()));
        let client = OpenAiCompatibleClient::new(&config).unwrap();
        let reply = client.call("Best CRM?", 64).await.unwrap();

        assert_eq!(reply.text, "HubSpot");
        assert_eq!(reply.tokens_used, Some(42));
    }

    #[tokio::test]
    async fn test_openai_compatible_rate_limited_with_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "7")
                    .set_body_string("slow down"),
            )
            .mount(&server)
            .await;

        let config = http_provider(ProviderId::Mistral, &server.uri());
        let client = create_client(&config).unwrap();
        let err = client.call("q", 16).await.unwrap_err();

        assert!(matches!(err, ProviderError::RateLimited { .. }));
        assert!(err.is_retryable());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
    }

    #[tokio::test]
    async fn test_openai_compatible_server_and_client_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let config = http_provider(ProviderId::Perplexity, &server.uri());
        let client = create_client(&config).unwrap();

        let first = client.call("q", 16).await.unwrap_err();
        assert!(matches!(first, ProviderError::Http { status: 503, .. }));
        assert!(first.is_retryable());

        let second = client.call("q", 16).await.unwrap_err();
        assert!(matches!(second, ProviderError::Http { status: 401, .. }));
        assert!(!second.is_retryable());
    }

    #[tokio::test]
    async fn test_openai_compatible_empty_choices_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&server)
            .await;

        let config = http_provider(ProviderId::Gemini, &server.uri());
        let err = create_client(&config)
            .unwrap()
            .call("q", 16)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(openai_completion("late", 5))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let config = http_provider(ProviderId::OpenAi, &server.uri()).with_timeout(1);
        let err = create_client(&config)
            .unwrap()
            .call("q", 16)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Timeout { .. }));
    }

    // ==================== Anthropic ====================

    #[tokio::test]
    async fn test_anthropic_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", "2023-06-01"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(anthropic_message("Pipedrive is solid", 12, 30)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let config = http_provider(ProviderId::Anthropic, &format!("{}/v1", server.uri()));
        let client = AnthropicClient::new(&config).unwrap();
        let reply = client.call("Best CRM?", 128).await.unwrap();

        assert_eq!(reply.text, "Pipedrive is solid");
        assert_eq!(reply.tokens_used, Some(42));
    }

    #[tokio::test]
    async fn test_anthropic_overloaded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let config = http_provider(ProviderId::Anthropic, &server.uri());
        let err = create_client(&config)
            .unwrap()
            .call("q", 16)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Http { status: 529, .. }));
        assert!(err.is_retryable());
    }

    // ==================== Through the gateway ====================

    #[tokio::test]
    async fn test_gateway_falls_back_over_http() {
        let openai = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&openai)
            .await;

        let anthropic = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(anthropic_message("Answer from Anthropic", 10, 20)),
            )
            .expect(1)
            .mount(&anthropic)
            .await;

        let config = GatewayConfig {
            providers: vec![
                http_provider(ProviderId::OpenAi, &openai.uri()).with_priority(1),
                http_provider(ProviderId::Anthropic, &anthropic.uri()).with_priority(2),
            ],
            ..Default::default()
        };
        let gateway = VisibilityGateway::builder()
            .config(config)
            .cache_backend(Arc::new(MemoryBackend::new()))
            .build()
            .await
            .unwrap();

        let response = gateway
            .query_with_fallback(&CallerId::from("acme"), "Best CRM?", 0.9, false)
            .await
            .unwrap();
        assert_eq!(response.provider, Some(ProviderId::Anthropic));
        assert_eq!(response.text, "Answer from Anthropic");
        assert_eq!(response.tokens_used, Some(30));

        let status = gateway.system_status();
        assert_eq!(status.total_providers, 2);
        let openai_health = &status.providers[0].health;
        assert_eq!(openai_health.provider, ProviderId::OpenAi);
        assert_eq!(openai_health.consecutive_failures, 1);
    }
}
