//! Configuration loading integration tests

#[cfg(test)]
mod tests {
    use std::io::Write;
    use tempfile::NamedTempFile;
    use visibility_gateway::config::{CacheBackendKind, DispatchMode, LogFormat};
    use visibility_gateway::core::providers::ProviderId;
    use visibility_gateway::{GatewayConfig, GatewayError};

    const EXAMPLE: &str = include_str!("../../config/gateway.yaml.example");

    #[test]
    fn test_example_config_parses_and_validates() {
        let config = GatewayConfig::from_yaml_str(EXAMPLE).unwrap();

        assert_eq!(config.providers.len(), 5);
        let openai = config.get_provider(ProviderId::OpenAi).unwrap();
        assert_eq!(openai.priority, 1);
        assert_eq!(openai.retry_count, 2);

        // omitted fields take the provider's stock values
        let gemini = config.get_provider(ProviderId::Gemini).unwrap();
        assert_eq!(gemini.model, ProviderId::Gemini.default_model());
        assert!(gemini.endpoint.starts_with("https://"));
        assert!(gemini.weight > 0.0);

        assert_eq!(
            config
                .admission
                .rate_limit
                .limit_for("enterprise-customer"),
            600
        );
        assert_eq!(config.cache.backend, CacheBackendKind::Memory);
        assert_eq!(config.orchestrator.dispatch_mode, DispatchMode::Parallel);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[tokio::test]
    async fn test_from_file_round_trip() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"
providers:
  - id: mistral
    api_key: "mk-test"
    priority: 1
orchestrator:
  dispatch_mode: sequential
cache:
  backend: redis
  redis_url: redis://127.0.0.1:6379
"#,
        )
        .unwrap();

        let config = GatewayConfig::from_file(file.path()).await.unwrap();
        assert_eq!(config.providers[0].api_key.as_deref(), Some("mk-test"));
        assert_eq!(config.orchestrator.dispatch_mode, DispatchMode::Sequential);
        assert_eq!(config.cache.backend, CacheBackendKind::Redis);

        // keys never leave the process in serialized form
        let yaml = config.to_yaml().unwrap();
        assert!(!yaml.contains("mk-test"));
        assert!(yaml.contains("sequential"));
    }

    #[tokio::test]
    async fn test_missing_file_is_config_error() {
        let err = GatewayConfig::from_file("/nonexistent/gateway.yaml")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let cases = [
            "providers:\n  - id: openai\n    weight: 1.5\n",
            "providers:\n  - id: openai\n  - id: openai\n",
            "admission:\n  circuit_breaker:\n    failure_threshold: 0\n",
            "orchestrator:\n  default_required_confidence: 2.0\n",
            "maintenance_interval_secs: 0\n",
        ];
        for yaml in cases {
            let err = GatewayConfig::from_yaml_str(yaml).unwrap_err();
            assert!(matches!(err, GatewayError::Config(_)), "accepted: {}", yaml);
        }
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        assert!(GatewayConfig::from_yaml_str("providers:\n  - id: cohere\n").is_err());
    }
}
