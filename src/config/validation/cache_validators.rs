//! Cache and orchestrator configuration validators

use super::trait_def::Validate;
use crate::config::models::*;

impl Validate for CacheConfig {
    fn validate(&self) -> Result<(), String> {
        if self.key_prefix.is_empty() || self.key_prefix.contains(':') {
            return Err("Cache key prefix must be non-empty and contain no ':'".to_string());
        }

        if self.hot_capacity == 0 {
            return Err("Hot cache capacity must be greater than 0".to_string());
        }

        if self.ttl.provider_response == 0 || self.ttl.analysis == 0 || self.ttl.summary == 0 {
            return Err("Cache TTLs must be greater than 0".to_string());
        }

        if self.backend == CacheBackendKind::Redis && self.redis_url.is_none() {
            return Err("Redis cache backend requires redis_url".to_string());
        }

        Ok(())
    }
}

impl Validate for OrchestratorConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_parallel_providers == 0 {
            return Err("Max parallel providers must be greater than 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.default_required_confidence) {
            return Err("Default required confidence must be between 0 and 1".to_string());
        }
        if self.retry_base_delay_ms > self.retry_max_delay_ms {
            return Err("Retry base delay cannot exceed the max delay".to_string());
        }
        if self.chars_per_token == 0 {
            return Err("Chars per token must be greater than 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.confidence.response_time_floor)
            || !(0.0..=1.0).contains(&self.confidence.min_length_factor)
        {
            return Err("Confidence factors must be between 0 and 1".to_string());
        }
        if self.confidence.target_length == 0 {
            return Err("Confidence target length must be greater than 0".to_string());
        }
        Ok(())
    }
}
