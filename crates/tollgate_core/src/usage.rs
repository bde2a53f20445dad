//! Token and quota usage accounting types.

use serde::{Deserialize, Serialize};

/// Token consumption reported for one completed generation.
///
/// # Examples
///
/// ```
/// use tollgate_core::TokenUsage;
///
/// let usage = TokenUsage::new(150, 50);
/// assert_eq!(usage.total(), 200);
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_new::new,
)]
pub struct TokenUsage {
    /// Tokens in the prompt
    input_tokens: u64,
    /// Tokens in the generated output
    output_tokens: u64,
}

impl TokenUsage {
    /// Combined input and output tokens.
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Rough token count for callers that lack provider-reported numbers.
///
/// Four characters per token, rounded down, matching the accounting the
/// quota ledger was tuned against.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.len() / 4) as u64
}

/// A tenant's quota position at decision time.
///
/// Carried on allowed decisions so the caller can surface remaining
/// headroom, and on quota denials so the caller can explain which
/// ceiling was hit.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_new::new,
)]
pub struct UsageSnapshot {
    /// Calls admitted today
    daily_used: u64,
    /// Daily call ceiling
    daily_limit: u64,
    /// Calls admitted this month
    monthly_used: u64,
    /// Monthly call ceiling
    monthly_limit: u64,
    /// Tokens consumed this month
    tokens_used: u64,
    /// Monthly token ceiling (zero = no token budget)
    token_limit: u64,
}

impl UsageSnapshot {
    /// Daily calls still available.
    pub fn daily_remaining(&self) -> u64 {
        self.daily_limit.saturating_sub(self.daily_used)
    }

    /// Monthly token budget consumed, as a percentage.
    ///
    /// Returns `None` when no token budget is configured.
    pub fn token_percent(&self) -> Option<f64> {
        if self.token_limit == 0 {
            return None;
        }
        Some(self.tokens_used as f64 / self.token_limit as f64 * 100.0)
    }
}

/// Increment applied to a tenant's persisted counters for one admitted
/// call. Applied atomically by the store, never read-modify-write.
#[derive(
    Debug, Clone, Copy, PartialEq, Serialize, Deserialize, derive_getters::Getters, derive_new::new,
)]
pub struct UsageDelta {
    /// Admitted calls to add (one per generation)
    calls: u64,
    /// Tokens to add to the monthly counter
    tokens: u64,
    /// Estimated spend to accumulate
    cost: f64,
}
