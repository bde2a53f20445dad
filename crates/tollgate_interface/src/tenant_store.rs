//! Durable tenant store contract.

use crate::{StoreResult, TenantRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tollgate_core::{TenantId, UsageDelta};

/// Persisted tenant state behind the quota ledger and subscription gate.
///
/// Implementations must make [`apply_usage`](TenantStore::apply_usage)
/// an atomic increment: concurrent deltas for one tenant may interleave
/// in any order but can never lose updates. Reset passes are bulk
/// conditional updates keyed on the reset stamps, so re-running a pass
/// is harmless.
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Load one tenant's record.
    ///
    /// # Errors
    ///
    /// `NotFound` when the tenant does not exist; transient kinds when
    /// the store cannot answer.
    async fn load(&self, tenant: &TenantId) -> StoreResult<TenantRecord>;

    /// Insert a newly provisioned record, replacing any existing one.
    async fn insert(&self, record: TenantRecord) -> StoreResult<()>;

    /// Persist repaired call ceilings for one tenant. Only the provided
    /// fields are written; `None` leaves the stored value alone.
    async fn set_limits(
        &self,
        tenant: &TenantId,
        daily_limit: Option<u64>,
        monthly_limit: Option<u64>,
        monthly_token_limit: Option<u64>,
    ) -> StoreResult<()>;

    /// Atomically add one admitted call's usage to the counters and
    /// stamp `last_used_at`.
    async fn apply_usage(
        &self,
        tenant: &TenantId,
        delta: UsageDelta,
        at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Zero `calls_today` for every record whose `last_daily_reset` is
    /// before `cutoff`, stamping `last_daily_reset = now`. Returns the
    /// number of records reset.
    async fn reset_daily(&self, cutoff: DateTime<Utc>, now: DateTime<Utc>) -> StoreResult<u64>;

    /// Zero `calls_this_month` and `tokens_this_month` for every record
    /// whose `last_monthly_reset` is before `cutoff`, stamping
    /// `last_monthly_reset = now`. Returns the number of records reset.
    async fn reset_monthly(&self, cutoff: DateTime<Utc>, now: DateTime<Utc>) -> StoreResult<u64>;

    /// Flip `status` to expired for every record past its expiry date
    /// and not already expired. Returns the number of records flipped.
    async fn mark_expired(&self, now: DateTime<Utc>) -> StoreResult<u64>;

    /// Repair unconfigured (zero) ceilings across all records, writing
    /// the given defaults into the zero fields only. Returns the number
    /// of records repaired.
    async fn repair_limits(
        &self,
        daily_limit: u64,
        monthly_limit: u64,
        monthly_token_limit: u64,
    ) -> StoreResult<u64>;

    /// Active tenants whose monthly token usage has reached
    /// `threshold_percent` of their token budget. Only records with a
    /// positive budget and positive usage are considered.
    async fn high_usage(&self, threshold_percent: f64) -> StoreResult<Vec<TenantId>>;
}
