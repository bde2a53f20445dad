//! Usage delta construction for admitted calls.

use tollgate_core::{PricingTable, TokenUsage, UsageDelta};

/// The counter increment for one successful generation: one call, the
/// reported tokens, and the priced cost for the model.
pub fn usage_delta(pricing: &PricingTable, model: &str, tokens: TokenUsage) -> UsageDelta {
    UsageDelta::new(1, tokens.total(), pricing.cost(model, tokens))
}
