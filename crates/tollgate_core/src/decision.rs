//! Admission decisions returned to the caller.

use crate::UsageSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Client-facing outcome codes.
///
/// This enum is closed: handlers translate every denial into one of
/// these codes plus a generic message, never internal error detail.
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
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReasonCode {
    /// Admitted
    #[default]
    Ok,
    /// Denied by the sliding-window rate limiter
    RateLimited,
    /// Subscription term has ended
    SubscriptionExpired,
    /// Account suspended or not active
    SubscriptionSuspended,
    /// Daily call ceiling reached
    DailyLimitExceeded,
    /// Monthly call ceiling reached
    MonthlyLimitExceeded,
    /// Monthly token budget exhausted
    TokenBudgetExceeded,
}

impl ReasonCode {
    /// True for the admitted outcome.
    pub fn is_ok(&self) -> bool {
        matches!(self, ReasonCode::Ok)
    }
}

/// The outcome of admitting one inbound message.
///
/// Denials are not errors: they carry the first failing stage's reason
/// and, where applicable, when the caller may retry. Allowed decisions
/// carry the tenant's quota position for response headers.
///
/// # Examples
///
/// ```
/// use tollgate_core::{Decision, ReasonCode};
///
/// let decision = Decision::deny(
///     ReasonCode::RateLimited,
///     "Rate limit exceeded. Please slow down.",
/// )
/// .with_retry_after_seconds(42);
/// assert!(!decision.allowed());
/// assert_eq!(*decision.reason(), ReasonCode::RateLimited);
/// assert_eq!(*decision.retry_after_seconds(), Some(42));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct Decision {
    /// Whether the message may proceed to the AI call
    allowed: bool,
    /// Outcome code, `ok` when allowed
    reason: ReasonCode,
    /// Human-readable explanation for denials
    message: Option<String>,
    /// Seconds until the rate-limit window reopens
    retry_after_seconds: Option<u64>,
    /// When the exhausted quota counter resets
    resets_at: Option<DateTime<Utc>>,
    /// Quota position at decision time
    usage: Option<UsageSnapshot>,
}

impl Decision {
    /// An admitted decision carrying the tenant's quota position.
    pub fn ok(usage: UsageSnapshot) -> Self {
        Self {
            allowed: true,
            reason: ReasonCode::Ok,
            message: None,
            retry_after_seconds: None,
            resets_at: None,
            usage: Some(usage),
        }
    }

    /// A denied decision with its reason and client-facing message.
    pub fn deny(reason: ReasonCode, message: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason,
            message: Some(message.into()),
            retry_after_seconds: None,
            resets_at: None,
            usage: None,
        }
    }

    /// Attach the seconds-until-retry hint.
    pub fn with_retry_after_seconds(mut self, seconds: u64) -> Self {
        self.retry_after_seconds = Some(seconds);
        self
    }

    /// Attach the reset instant of the exhausted counter.
    pub fn with_resets_at(mut self, at: DateTime<Utc>) -> Self {
        self.resets_at = Some(at);
        self
    }

    /// Attach the quota position observed at decision time.
    pub fn with_usage(mut self, usage: UsageSnapshot) -> Self {
        self.usage = Some(usage);
        self
    }
}
