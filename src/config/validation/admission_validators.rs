//! Admission control configuration validators

use super::trait_def::Validate;
use crate::config::models::*;

impl Validate for AdmissionConfig {
    fn validate(&self) -> Result<(), String> {
        self.rate_limit.validate()?;
        self.circuit_breaker.validate()?;
        self.cost.validate()
    }
}

impl Validate for RateLimitConfig {
    fn validate(&self) -> Result<(), String> {
        if self.customer_limit == 0 {
            return Err("Customer rate limit must be greater than 0".to_string());
        }
        if self.window_secs == 0 {
            return Err("Rate limit window must be greater than 0".to_string());
        }
        if self.max_concurrent_calls == 0 {
            return Err("Max concurrent calls must be greater than 0".to_string());
        }
        if let Some((caller, _)) = self.overrides.iter().find(|(_, limit)| **limit == 0) {
            return Err(format!("Rate limit override for {} must be greater than 0", caller));
        }
        Ok(())
    }
}

impl Validate for CircuitBreakerConfig {
    fn validate(&self) -> Result<(), String> {
        if self.failure_threshold == 0 {
            return Err("Circuit breaker failure threshold must be greater than 0".to_string());
        }
        if self.recovery_timeout == 0 {
            return Err("Circuit breaker recovery timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Validate for CostLimits {
    fn validate(&self) -> Result<(), String> {
        if self.hourly <= 0.0 || self.daily <= 0.0 || self.monthly <= 0.0 {
            return Err("Cost limits must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Validate for CostConfig {
    fn validate(&self) -> Result<(), String> {
        self.limits.validate()?;
        for (caller, limits) in &self.overrides {
            limits
                .validate()
                .map_err(|e| format!("Cost override for {}: {}", caller, e))?;
        }
        if self.alert_ratio <= 0.0 || self.alert_ratio >= 1.0 {
            return Err("Cost alert ratio must be in (0, 1)".to_string());
        }
        if self.default_price_per_1k < 0.0 {
            return Err("Default price per 1K tokens cannot be negative".to_string());
        }
        if let Some((model, _)) = self.model_prices.iter().find(|(_, price)| **price < 0.0) {
            return Err(format!("Price for model {} cannot be negative", model));
        }
        Ok(())
    }
}
