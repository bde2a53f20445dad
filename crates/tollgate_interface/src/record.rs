//! The persisted per-tenant record.

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use tollgate_core::{SubscriptionStatus, TenantId, UsageSnapshot};

/// Everything the store persists for one tenant: quota counters and
/// ceilings, subscription lifecycle, and lifetime accounting.
///
/// Counters are mutated through [`crate::TenantStore::apply_usage`]
/// deltas and the scheduled reset passes; nothing on the request path
/// writes a full record back.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_setters::Setters,
)]
#[setters(prefix = "with_")]
pub struct TenantRecord {
    /// Tenant identity
    tenant_id: TenantId,
    /// Subscription lifecycle state
    #[serde(default)]
    status: SubscriptionStatus,
    /// When the subscription began
    start_date: Option<DateTime<Utc>>,
    /// When the subscription term ends; `None` means no expiry
    expiry_date: Option<DateTime<Utc>>,
    /// Calls admitted today
    #[serde(default)]
    calls_today: u64,
    /// Calls admitted this calendar month
    #[serde(default)]
    calls_this_month: u64,
    /// Calls admitted over the tenant's lifetime
    #[serde(default)]
    calls_total: u64,
    /// Tokens consumed this calendar month
    #[serde(default)]
    tokens_this_month: u64,
    /// Daily call ceiling; zero means unconfigured and is repaired
    daily_limit: u64,
    /// Monthly call ceiling; zero means unconfigured and is repaired
    monthly_limit: u64,
    /// Monthly token budget; zero disables the token check
    monthly_token_limit: u64,
    /// Accumulated estimated spend in dollars
    #[serde(default)]
    cost_total: f64,
    /// Stamp of the last daily reset pass that touched this record
    last_daily_reset: DateTime<Utc>,
    /// Stamp of the last monthly reset pass that touched this record
    last_monthly_reset: DateTime<Utc>,
    /// When the tenant last completed an admitted call
    last_used_at: Option<DateTime<Utc>>,
}

impl TenantRecord {
    /// Provision a fresh active tenant with the given ceilings.
    ///
    /// The subscription starts now and runs one month; reset stamps are
    /// initialized so the scheduled passes leave the record alone until
    /// a real boundary passes.
    pub fn provision(
        tenant_id: TenantId,
        daily_limit: u64,
        monthly_limit: u64,
        monthly_token_limit: u64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            tenant_id,
            status: SubscriptionStatus::Active,
            start_date: Some(now),
            expiry_date: now.checked_add_months(Months::new(1)),
            calls_today: 0,
            calls_this_month: 0,
            calls_total: 0,
            tokens_this_month: 0,
            daily_limit,
            monthly_limit,
            monthly_token_limit,
            cost_total: 0.0,
            last_daily_reset: now,
            last_monthly_reset: now,
            last_used_at: None,
        }
    }

    /// The record's quota position as a snapshot for decisions.
    pub fn usage_snapshot(&self) -> UsageSnapshot {
        UsageSnapshot::new(
            self.calls_today,
            self.daily_limit,
            self.calls_this_month,
            self.monthly_limit,
            self.tokens_this_month,
            self.monthly_token_limit,
        )
    }

    /// True when the expiry date is set and strictly in the past.
    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date.is_some_and(|expiry| now > expiry)
    }

    /// True when a call ceiling is unconfigured (zero) and must be
    /// repaired before checking.
    pub fn needs_limit_repair(&self) -> bool {
        self.daily_limit == 0 || self.monthly_limit == 0
    }

    /// Monthly token budget consumed, as a percentage. `None` without a
    /// configured budget.
    pub fn token_percent(&self) -> Option<f64> {
        self.usage_snapshot().token_percent()
    }
}
