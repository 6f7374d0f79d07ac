//! Response cache integration tests
//!
//! Exercises the cache the way analysis collaborators do: through the
//! gateway's shared [`IntelligentCache`] handle over the memory backend.

#[cfg(test)]
mod tests {
    use crate::common::GatewayFixture;
    use crate::common::fixtures::caller;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;
    use visibility_gateway::core::cache_manager::{CacheNamespace, TtlClass};
    use visibility_gateway::core::providers::{MockClient, ProviderId};
    use visibility_gateway::core::traits::CacheBackend;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct SentimentResult {
        brand: String,
        score: f64,
        mentions: Vec<String>,
    }

    fn sentiment(brand: &str) -> SentimentResult {
        SentimentResult {
            brand: brand.to_string(),
            score: 0.42,
            mentions: vec!["pricing".to_string(), "support".to_string()],
        }
    }

    #[tokio::test]
    async fn test_analysis_results_round_trip() {
        let fixture = GatewayFixture::new(vec![]).await;
        let cache = fixture.gateway.cache();

        let key = cache.analysis_key("sentiment", "Acme makes great anvils");
        assert!(key.as_str().starts_with("vg:analysis:sentiment:"));
        assert!(cache.set_class(&key, &sentiment("acme"), TtlClass::Analysis).await);

        let cached: Option<SentimentResult> = cache.get(&key).await;
        assert_eq!(cached, Some(sentiment("acme")));

        let remaining = fixture.backend.ttl(key.as_str()).unwrap();
        assert!(remaining > Duration::from_secs(7_100));
        assert!(remaining <= Duration::from_secs(7_200));
    }

    #[tokio::test]
    async fn test_large_values_are_compressed_in_backend() {
        let fixture = GatewayFixture::new(vec![]).await;
        let cache = fixture.gateway.cache();

        let mut result = sentiment("acme");
        result.mentions = vec!["the onboarding flow was smooth".to_string(); 200];
        let key = cache.summary_key("audit-17");
        assert!(cache.set_class(&key, &result, TtlClass::Summary).await);

        let raw = fixture.backend.get(key.as_str()).await.unwrap().unwrap();
        assert_eq!(raw[0], 0x01);
        let json_len = serde_json::to_vec(&result).unwrap().len();
        assert!(raw.len() < json_len);
        assert!(cache.stats().compression_saves > 0);

        let back: Option<SentimentResult> = cache.get(&key).await;
        assert_eq!(back, Some(result));
    }

    #[tokio::test]
    async fn test_invalidate_query_namespace_forces_provider_call() {
        let fixture =
            GatewayFixture::new(vec![MockClient::replying(ProviderId::OpenAi, "fresh")]).await;
        let acme = caller("acme");

        fixture
            .gateway
            .query_with_fallback(&acme, "q", 0.5, true)
            .await
            .unwrap();
        let analysis_key = fixture.gateway.cache().analysis_key("gaps", "q");
        fixture
            .gateway
            .cache()
            .set_class(&analysis_key, &sentiment("acme"), TtlClass::Analysis)
            .await;

        let removed = fixture
            .gateway
            .cache()
            .invalidate_namespace(&CacheNamespace::Query)
            .await;
        assert_eq!(removed, 1);

        let response = fixture
            .gateway
            .query_with_fallback(&acme, "q", 0.5, true)
            .await
            .unwrap();
        assert!(!response.cached);
        assert_eq!(fixture.calls(ProviderId::OpenAi), 2);

        // other namespaces survive
        let kept: Option<SentimentResult> = fixture.gateway.cache().get(&analysis_key).await;
        assert!(kept.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_requests_within_window() {
        let fixture = GatewayFixture::new(vec![]).await;
        let cache = fixture.gateway.cache();
        let window = Duration::from_millis(300);

        assert!(!cache.check_duplicate("audit-42", window).await);
        assert!(cache.check_duplicate("audit-42", window).await);
        assert!(!cache.check_duplicate("audit-43", window).await);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(!cache.check_duplicate("audit-42", window).await);
    }

    #[tokio::test]
    async fn test_lock_is_exclusive_across_tasks() {
        let fixture = GatewayFixture::new(vec![]).await;
        let cache = fixture.gateway.cache().clone();

        let lock = cache
            .acquire_lock("audit-42", Duration::from_secs(5))
            .await
            .unwrap();

        let contender = cache.clone();
        let blocked = tokio::spawn(async move {
            contender
                .acquire_lock("audit-42", Duration::from_secs(5))
                .await
                .is_some()
        })
        .await
        .unwrap();
        assert!(!blocked);

        assert!(lock.release().await);
        assert!(
            cache
                .acquire_lock("audit-42", Duration::from_secs(5))
                .await
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_expired_entries_swept_by_maintenance() {
        let mut config = visibility_gateway::GatewayConfig::default();
        config.maintenance_interval_secs = 1;
        let fixture = GatewayFixture::with_config(config, vec![]).await;
        let cache = fixture.gateway.cache();

        let key = cache.summary_key("short-lived");
        cache
            .set(&key, &sentiment("acme"), Duration::from_millis(50))
            .await;
        assert_eq!(fixture.backend.len(), 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        fixture.gateway.start();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fixture.backend.len(), 0);
        fixture.gateway.shutdown().await;
    }
}
