//! Per-model pricing for estimated cost accounting.

use crate::TokenUsage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Model name for the default flash tier.
pub const GEMINI_FLASH: &str = "gemini-1.5-flash";
/// Model name for the pro tier.
pub const GEMINI_PRO: &str = "gemini-1.5-pro";

/// Price of one thousand input and output tokens for a model.
#[derive(
    Debug, Clone, Copy, PartialEq, Serialize, Deserialize, derive_getters::Getters, derive_new::new,
)]
pub struct ModelRate {
    /// Dollars per 1,000 input tokens
    input_per_1k: f64,
    /// Dollars per 1,000 output tokens
    output_per_1k: f64,
}

impl ModelRate {
    fn combined(&self) -> f64 {
        self.input_per_1k + self.output_per_1k
    }
}

/// Pricing table tiered by model name.
///
/// Unknown model names fall back to the cheapest configured tier, so a
/// misreported model can only under-estimate spend, never inflate it.
///
/// # Examples
///
/// ```
/// use tollgate_core::{PricingTable, TokenUsage};
///
/// let table = PricingTable::default();
/// let cost = table.cost("gemini-1.5-flash", TokenUsage::new(2000, 1000));
/// assert_eq!(cost, 0.00045);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingTable {
    rates: HashMap<String, ModelRate>,
}

impl Default for PricingTable {
    fn default() -> Self {
        let mut rates = HashMap::new();
        rates.insert(GEMINI_FLASH.to_string(), ModelRate::new(0.000075, 0.0003));
        rates.insert(GEMINI_PRO.to_string(), ModelRate::new(0.00125, 0.005));
        Self { rates }
    }
}

impl PricingTable {
    /// Build a table from explicit rates. An empty table prices every
    /// call at zero.
    pub fn new(rates: HashMap<String, ModelRate>) -> Self {
        Self { rates }
    }

    /// Add or replace the rate for a model.
    pub fn insert(&mut self, model: impl Into<String>, rate: ModelRate) {
        self.rates.insert(model.into(), rate);
    }

    /// Rate for a model, falling back to the cheapest tier for unknown
    /// names.
    pub fn rate_for(&self, model: &str) -> ModelRate {
        if let Some(rate) = self.rates.get(model) {
            return *rate;
        }
        self.cheapest().unwrap_or(ModelRate::new(0.0, 0.0))
    }

    /// Estimated cost of one generation, rounded to five decimal places.
    pub fn cost(&self, model: &str, usage: TokenUsage) -> f64 {
        let rate = self.rate_for(model);
        let input_cost = (*usage.input_tokens() as f64 / 1000.0) * rate.input_per_1k;
        let output_cost = (*usage.output_tokens() as f64 / 1000.0) * rate.output_per_1k;
        round_to_5dp(input_cost + output_cost)
    }

    fn cheapest(&self) -> Option<ModelRate> {
        self.rates
            .iter()
            .min_by(|a, b| {
                a.1.combined()
                    .partial_cmp(&b.1.combined())
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.0.cmp(b.0))
            })
            .map(|(_, rate)| *rate)
    }
}

fn round_to_5dp(value: f64) -> f64 {
    (value * 100_000.0).round() / 100_000.0
}
