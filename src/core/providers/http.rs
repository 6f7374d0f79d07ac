//! Shared HTTP plumbing for the concrete provider clients

use super::error::ProviderError;
use super::types::ProviderId;
use crate::utils::truncate_string;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Response};
use std::time::Duration;

const USER_AGENT: &str = concat!("visibility-gateway/", env!("CARGO_PKG_VERSION"));
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Build a pooled reqwest client with the provider's timeout
pub(crate) fn build_http_client(
    provider: ProviderId,
    timeout: Duration,
) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(POOL_IDLE_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| {
            ProviderError::not_configured(provider, format!("Failed to create HTTP client: {}", e))
        })
}

/// Turn a non-success response into a provider error
pub(crate) async fn error_from_response(provider: ProviderId, response: Response) -> ProviderError {
    let status = response.status().as_u16();
    let retry_after = retry_after_from_headers(response.headers());
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error response".to_string());

    if status == 429 {
        return ProviderError::RateLimited {
            provider,
            retry_after,
        };
    }
    ProviderError::http(provider, status, truncate_string(&body, MAX_ERROR_BODY_CHARS))
}

fn retry_after_from_headers(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
