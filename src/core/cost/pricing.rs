//! Model price table

use crate::config::CostConfig;
use std::collections::HashMap;

/// USD per 1K tokens by model
///
/// Lookup tries the exact model name, then the longest configured prefix
/// (so dated snapshots inherit their family's price), then the default.
#[derive(Debug, Clone)]
pub struct PriceTable {
    default_per_1k: f64,
    prices: HashMap<String, f64>,
}

impl PriceTable {
    pub fn new(default_per_1k: f64, prices: HashMap<String, f64>) -> Self {
        Self {
            default_per_1k,
            prices,
        }
    }

    pub fn from_config(config: &CostConfig) -> Self {
        Self::new(config.default_price_per_1k, config.model_prices.clone())
    }

    pub fn price_per_1k(&self, model: &str) -> f64 {
        if let Some(price) = self.prices.get(model) {
            return *price;
        }
        self.prices
            .iter()
            .filter(|(name, _)| model.starts_with(name.as_str()))
            .max_by_key(|(name, _)| name.len())
            .map(|(_, price)| *price)
            .unwrap_or(self.default_per_1k)
    }

    /// Cost in USD of `tokens` tokens on `model`
    pub fn cost(&self, model: &str, tokens: u64) -> f64 {
        tokens as f64 / 1000.0 * self.price_per_1k(model)
    }
}
