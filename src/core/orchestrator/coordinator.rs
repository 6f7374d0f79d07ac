//! Request coordinator

use super::confidence::ConfidenceScorer;
use super::dispatch::{CallResult, RetryPolicy, call_with_retry};
use super::types::{AggregatedResponse, LlmResponse};
use crate::config::{DispatchMode, OrchestratorConfig};
use crate::core::admission::{Admission, AdmissionController, AdmissionPermit, CallOutcome, Denial};
use crate::core::cache_manager::{IntelligentCache, TtlClass};
use crate::core::health::HealthMonitor;
use crate::core::providers::{CallerId, ProviderId, ProviderRegistry};
use crate::monitoring::metrics::{MetricsSink, NoopMetrics};
use crate::utils::error::{GatewayError, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

const DEGRADED_MESSAGE: &str =
    "All providers failed or were unavailable; no answer could be produced for this query.";

/// A scored reply from one provider call
struct Scored {
    provider: ProviderId,
    response: Option<LlmResponse>,
}

/// Fallback orchestrator over the registered providers
pub struct FallbackOrchestrator {
    registry: Arc<ProviderRegistry>,
    health: Arc<HealthMonitor>,
    admission: Arc<AdmissionController>,
    cache: Arc<IntelligentCache>,
    scorer: ConfidenceScorer,
    config: OrchestratorConfig,
    metrics: Arc<dyn MetricsSink>,
}

impl std::fmt::Debug for FallbackOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackOrchestrator")
            .field("providers", &self.registry.ids())
            .field("dispatch_mode", &self.config.dispatch_mode)
            .finish_non_exhaustive()
    }
}

impl FallbackOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        registry: Arc<ProviderRegistry>,
        health: Arc<HealthMonitor>,
        admission: Arc<AdmissionController>,
        cache: Arc<IntelligentCache>,
    ) -> Self {
        Self {
            scorer: ConfidenceScorer::new(config.confidence.clone()),
            registry,
            health,
            admission,
            cache,
            config,
            metrics: Arc::new(NoopMetrics),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Providers to try, most preferred first
    ///
    /// Healthy (or not recently checked) providers by priority; when none
    /// qualify, every registered provider, since their circuit breakers
    /// still guard them. Not capped: the dispatch limit applies to admitted
    /// providers only.
    pub fn candidates(&self) -> Vec<ProviderId> {
        let available: Vec<ProviderId> = self
            .health
            .list_available()
            .into_iter()
            .filter(|id| self.registry.contains(*id))
            .collect();
        if available.is_empty() {
            self.registry.ids()
        } else {
            available
        }
    }

    fn dispatch_limit(&self) -> usize {
        self.config.max_parallel_providers.max(1)
    }

    /// Answer `prompt` from the first provider reaching `required_confidence`
    ///
    /// Only fails when no provider could be admitted at all. Exhausting
    /// every admitted provider yields the degraded sentinel instead.
    pub async fn query_with_fallback(
        &self,
        caller: &CallerId,
        prompt: &str,
        required_confidence: f64,
        use_cache: bool,
    ) -> Result<LlmResponse> {
        if self.registry.is_empty() {
            return Err(GatewayError::NoProviders);
        }
        let candidates = self.candidates();

        let cache_key = (use_cache && self.cache.is_enabled())
            .then(|| self.cache.query_key(prompt, &candidates));
        if let Some(key) = &cache_key {
            if let Some(mut hit) = self.cache.get::<LlmResponse>(key).await {
                debug!(%caller, "Serving query from cache");
                hit.cached = true;
                return Ok(hit);
            }
        }

        let best = match self.config.dispatch_mode {
            DispatchMode::Parallel => {
                self.run_parallel(caller, prompt, &candidates, required_confidence)
                    .await?
            }
            DispatchMode::Sequential => {
                self.run_sequential(caller, prompt, &candidates, required_confidence)
                    .await?
            }
        };

        let Some(best) = best else {
            warn!(%caller, candidates = ?candidates, "All providers exhausted; returning degraded response");
            self.metrics.degraded_response();
            return Ok(LlmResponse::degraded(DEGRADED_MESSAGE));
        };

        if let Some(key) = &cache_key {
            self.cache
                .set_class(key, &best, TtlClass::ProviderResponse)
                .await;
        }
        Ok(best)
    }

    /// Collect replies from several providers without early exit
    ///
    /// Waits until `min_providers` replies succeeded or every dispatched
    /// call finished, whichever comes first.
    pub async fn aggregate_responses(
        &self,
        caller: &CallerId,
        prompt: &str,
        min_providers: usize,
    ) -> Result<AggregatedResponse> {
        if self.registry.is_empty() {
            return Err(GatewayError::NoProviders);
        }
        let candidates = self.candidates();
        let (permits, denials) =
            self.admit_up_to(caller, prompt, &candidates, self.dispatch_limit());
        let mut result = AggregatedResponse {
            skipped_providers: denials.iter().map(|(id, _)| *id).collect(),
            ..Default::default()
        };
        if permits.is_empty() {
            return Err(Self::denial_error(caller, denials));
        }

        let target = min_providers.max(1);
        let mut in_flight: FuturesUnordered<_> = permits
            .into_iter()
            .map(|permit| self.dispatch(permit, prompt))
            .collect();
        while let Some(scored) = in_flight.next().await {
            match scored.response {
                Some(response) => result.responses.push(response),
                None => result.failed_providers.push(scored.provider),
            }
            if result.responses.len() >= target {
                break;
            }
        }
        drop(in_flight);

        result.consensus_confidence = AggregatedResponse::consensus(&result.responses);
        info!(
            %caller,
            responses = result.responses.len(),
            failed = result.failed_providers.len(),
            consensus = result.consensus_confidence,
            "Aggregated provider responses"
        );
        Ok(result)
    }

    async fn run_parallel(
        &self,
        caller: &CallerId,
        prompt: &str,
        candidates: &[ProviderId],
        required_confidence: f64,
    ) -> Result<Option<LlmResponse>> {
        let (permits, denials) =
            self.admit_up_to(caller, prompt, candidates, self.dispatch_limit());
        if permits.is_empty() {
            return Err(Self::denial_error(caller, denials));
        }

        let mut in_flight: FuturesUnordered<_> = permits
            .into_iter()
            .map(|permit| self.dispatch(permit, prompt))
            .collect();
        let mut best: Option<LlmResponse> = None;
        while let Some(scored) = in_flight.next().await {
            let Some(response) = scored.response else {
                continue;
            };
            if response.confidence >= required_confidence {
                debug!(
                    provider = %scored.provider,
                    confidence = response.confidence,
                    abandoned = in_flight.len(),
                    "Confident response; abandoning outstanding calls"
                );
                return Ok(Some(response));
            }
            best = Self::better(best, response);
        }
        Ok(best)
    }

    async fn run_sequential(
        &self,
        caller: &CallerId,
        prompt: &str,
        candidates: &[ProviderId],
        required_confidence: f64,
    ) -> Result<Option<LlmResponse>> {
        let mut denials = Vec::new();
        let mut admitted_any = false;
        let mut best: Option<LlmResponse> = None;

        for &provider in candidates {
            let permit = match self.admit(caller, prompt, provider) {
                Admission::Allow(permit) => permit,
                Admission::Deny(denial) => {
                    denials.push((provider, denial));
                    continue;
                }
            };
            admitted_any = true;

            let scored = self.dispatch(permit, prompt).await;
            if let Some(response) = scored.response {
                if response.confidence >= required_confidence {
                    return Ok(Some(response));
                }
                best = Self::better(best, response);
            }
        }

        if !admitted_any {
            return Err(Self::denial_error(caller, denials));
        }
        Ok(best)
    }

    fn admit(&self, caller: &CallerId, prompt: &str, provider: ProviderId) -> Admission {
        let max_tokens = self
            .registry
            .get(provider)
            .map(|p| p.config.max_tokens)
            .unwrap_or(0);
        self.admission
            .check_and_reserve(caller, provider, self.estimate_tokens(prompt, max_tokens))
    }

    /// Admit candidates in order until `limit` permits are held
    ///
    /// Denied providers do not use up the limit, so an open circuit at the
    /// head of the list never hides a closed one further down.
    fn admit_up_to(
        &self,
        caller: &CallerId,
        prompt: &str,
        candidates: &[ProviderId],
        limit: usize,
    ) -> (Vec<AdmissionPermit>, Vec<(ProviderId, Denial)>) {
        let mut permits = Vec::with_capacity(limit.min(candidates.len()));
        let mut denials = Vec::new();
        for &provider in candidates {
            if permits.len() >= limit {
                break;
            }
            match self.admit(caller, prompt, provider) {
                Admission::Allow(permit) => permits.push(permit),
                Admission::Deny(denial) => {
                    debug!(%provider, reason = %denial.reason, "Provider skipped");
                    denials.push((provider, denial));
                }
            }
        }
        (permits, denials)
    }

    /// Call the permit's provider, settle the outcome and score the reply
    async fn dispatch(&self, permit: AdmissionPermit, prompt: &str) -> Scored {
        let provider = permit.provider();
        let Some(registered) = self.registry.get(provider) else {
            return Scored {
                provider,
                response: None,
            };
        };
        let config = &registered.config;
        let timeout = config.timeout_duration();
        let policy = RetryPolicy {
            retries: config.retry_count,
            base_delay: self.config.retry_base_delay(),
            max_delay: self.config.retry_max_delay(),
        };

        let CallResult {
            reply,
            elapsed,
            attempts,
        } = call_with_retry(
            registered.client.as_ref(),
            prompt,
            config.max_tokens,
            timeout,
            policy,
        )
        .await;

        match reply {
            Ok(reply) => {
                self.admission
                    .settle(
                        permit,
                        CallOutcome::Success {
                            latency: elapsed,
                            tokens_used: reply.tokens_used,
                        },
                    )
                    .await;
                let success_rate = self.health.success_rate(provider).unwrap_or(1.0);
                let confidence =
                    self.scorer
                        .score(config.weight, success_rate, elapsed, timeout, &reply.text);
                debug!(%provider, attempts, confidence, elapsed_ms = elapsed.as_millis() as u64, "Provider replied");
                Scored {
                    provider,
                    response: Some(LlmResponse {
                        provider: Some(provider),
                        text: reply.text,
                        confidence,
                        response_time_ms: elapsed.as_millis() as u64,
                        tokens_used: reply.tokens_used,
                        cached: false,
                        partial: false,
                    }),
                }
            }
            Err(err) => {
                warn!(%provider, attempts, "Provider call failed: {}", err);
                self.admission
                    .settle(
                        permit,
                        CallOutcome::Failure {
                            latency: elapsed,
                            error: err.to_string(),
                        },
                    )
                    .await;
                Scored {
                    provider,
                    response: None,
                }
            }
        }
    }

    fn estimate_tokens(&self, prompt: &str, max_tokens: u32) -> u64 {
        let prompt_tokens = prompt.chars().count() / self.config.chars_per_token.max(1);
        prompt_tokens as u64 + u64::from(max_tokens)
    }

    fn better(current: Option<LlmResponse>, candidate: LlmResponse) -> Option<LlmResponse> {
        match current {
            Some(current) if current.confidence >= candidate.confidence => Some(current),
            _ => Some(candidate),
        }
    }

    /// Error reported when no provider was admitted
    ///
    /// Cost outranks rate limits, which outrank concurrency, which outranks
    /// open circuits. Within one reason the shortest retry hint wins.
    fn denial_error(caller: &CallerId, denials: Vec<(ProviderId, Denial)>) -> GatewayError {
        denials
            .into_iter()
            .map(|(_, d)| d)
            .max_by(|a, b| {
                a.reason.severity().cmp(&b.reason.severity()).then_with(|| {
                    b.retry_after
                        .unwrap_or_default()
                        .cmp(&a.retry_after.unwrap_or_default())
                })
            })
            .map(|d| d.into_error(caller))
            .unwrap_or(GatewayError::NoProviders)
    }
}
