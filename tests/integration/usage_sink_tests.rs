//! Usage sink integration tests

#[cfg(test)]
mod tests {
    use crate::common::GatewayFixture;
    use crate::common::providers::mock_provider;
    use std::sync::Arc;
    use tempfile::tempdir;
    use visibility_gateway::core::cost::{JsonlUsageSink, UsageRecord, UsageSink};
    use visibility_gateway::core::providers::{MockClient, MockOutcome, ProviderId, ProviderReply};
    use visibility_gateway::{CallerId, VisibilityGateway};

    #[tokio::test]
    async fn test_jsonl_sink_records_each_settled_call() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("usage.jsonl");
        let sink = Arc::new(JsonlUsageSink::open(&log).await.unwrap());

        let reported = ProviderReply::new("with usage").with_tokens(250);
        let gateway = VisibilityGateway::builder()
            .client(
                mock_provider(ProviderId::OpenAi, 1),
                Arc::new(MockClient::new(
                    ProviderId::OpenAi,
                    MockOutcome::Reply(reported),
                )),
            )
            .usage_sink(sink.clone())
            .build()
            .await
            .unwrap();

        let acme = CallerId::from("acme");
        for _ in 0..3 {
            gateway
                .query_with_fallback(&acme, "q", 0.5, false)
                .await
                .unwrap();
        }
        gateway.shutdown().await;

        let content = tokio::fs::read_to_string(&log).await.unwrap();
        let records: Vec<UsageRecord> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(records.len(), 3);
        for record in &records {
            assert_eq!(record.caller, "acme");
            assert_eq!(record.provider, ProviderId::OpenAi);
            assert_eq!(record.tokens, 250);
            assert!(!record.estimated);
            assert!(record.cost > 0.0);
        }
    }

    #[tokio::test]
    async fn test_jsonl_sink_appends_across_reopen() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("usage.jsonl");

        let fixture = GatewayFixture::new(vec![MockClient::replying(ProviderId::Gemini, "ok")]).await;
        fixture
            .gateway
            .query_with_fallback(&CallerId::from("acme"), "q", 0.5, false)
            .await
            .unwrap();
        let record = fixture.usage.records().pop().unwrap();
        assert!(record.estimated);

        for _ in 0..2 {
            let sink = JsonlUsageSink::open(&log).await.unwrap();
            sink.record(&record).await.unwrap();
            sink.flush().await.unwrap();
        }

        let content = tokio::fs::read_to_string(&log).await.unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_unopenable_path_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("no-such-dir").join("usage.jsonl");
        assert!(JsonlUsageSink::open(&missing).await.is_err());
    }
}
