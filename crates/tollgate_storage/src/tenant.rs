//! In-memory tenant store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tollgate_core::{TenantId, UsageDelta};
use tollgate_error::{StoreError, StoreErrorKind};
use tollgate_interface::{StoreResult, TenantRecord, TenantStore};

/// In-memory [`TenantStore`] backed by a `HashMap`.
///
/// Counter updates mutate the record while holding the write lock, so
/// concurrent deltas interleave without losing updates, matching the
/// atomic-increment contract. All data is lost on drop.
///
/// # Example
/// ```no_run
/// use tollgate_storage::MemoryTenantStore;
///
/// #[tokio::main]
/// async fn main() {
///     let store = MemoryTenantStore::new();
///     // Use store.insert(), load(), apply_usage(), etc.
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryTenantStore {
    records: Arc<RwLock<HashMap<TenantId, TenantRecord>>>,
    offline: Arc<AtomicBool>,
}

impl MemoryTenantStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tenants (for testing).
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no tenants (for testing).
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Remove all tenants (for testing).
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }

    /// Simulate an unreachable backing store: while offline, every
    /// operation fails with `Unavailable` (for testing fail-closed
    /// behavior).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::new(StoreErrorKind::Unavailable(
                "store offline".to_string(),
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl TenantStore for MemoryTenantStore {
    async fn load(&self, tenant: &TenantId) -> StoreResult<TenantRecord> {
        self.check_online()?;
        let records = self.records.read().await;
        records
            .get(tenant)
            .cloned()
            .ok_or_else(|| StoreError::new(StoreErrorKind::NotFound(tenant.to_string())))
    }

    async fn insert(&self, record: TenantRecord) -> StoreResult<()> {
        self.check_online()?;
        let mut records = self.records.write().await;
        records.insert(record.tenant_id().clone(), record);
        Ok(())
    }

    async fn set_limits(
        &self,
        tenant: &TenantId,
        daily_limit: Option<u64>,
        monthly_limit: Option<u64>,
        monthly_token_limit: Option<u64>,
    ) -> StoreResult<()> {
        self.check_online()?;
        let mut records = self.records.write().await;
        let record = records
            .get_mut(tenant)
            .ok_or_else(|| StoreError::new(StoreErrorKind::NotFound(tenant.to_string())))?;

        let mut updated = record.clone();
        if let Some(daily) = daily_limit {
            updated = updated.with_daily_limit(daily);
        }
        if let Some(monthly) = monthly_limit {
            updated = updated.with_monthly_limit(monthly);
        }
        if let Some(tokens) = monthly_token_limit {
            updated = updated.with_monthly_token_limit(tokens);
        }
        *record = updated;
        Ok(())
    }

    async fn apply_usage(
        &self,
        tenant: &TenantId,
        delta: UsageDelta,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.check_online()?;
        let mut records = self.records.write().await;
        let record = records
            .get_mut(tenant)
            .ok_or_else(|| StoreError::new(StoreErrorKind::NotFound(tenant.to_string())))?;

        let calls = *delta.calls();
        let updated = record
            .clone()
            .with_calls_today(record.calls_today() + calls)
            .with_calls_this_month(record.calls_this_month() + calls)
            .with_calls_total(record.calls_total() + calls)
            .with_tokens_this_month(record.tokens_this_month() + delta.tokens())
            .with_cost_total(record.cost_total() + delta.cost())
            .with_last_used_at(Some(at));
        *record = updated;
        Ok(())
    }

    async fn reset_daily(&self, cutoff: DateTime<Utc>, now: DateTime<Utc>) -> StoreResult<u64> {
        self.check_online()?;
        let mut records = self.records.write().await;
        let mut reset = 0;
        for record in records.values_mut() {
            if *record.last_daily_reset() < cutoff {
                *record = record
                    .clone()
                    .with_calls_today(0)
                    .with_last_daily_reset(now);
                reset += 1;
            }
        }
        Ok(reset)
    }

    async fn reset_monthly(&self, cutoff: DateTime<Utc>, now: DateTime<Utc>) -> StoreResult<u64> {
        self.check_online()?;
        let mut records = self.records.write().await;
        let mut reset = 0;
        for record in records.values_mut() {
            if *record.last_monthly_reset() < cutoff {
                *record = record
                    .clone()
                    .with_calls_this_month(0)
                    .with_tokens_this_month(0)
                    .with_last_monthly_reset(now);
                reset += 1;
            }
        }
        Ok(reset)
    }

    async fn mark_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        self.check_online()?;
        let mut records = self.records.write().await;
        let mut flipped = 0;
        for record in records.values_mut() {
            if record.is_past_expiry(now)
                && *record.status() != tollgate_core::SubscriptionStatus::Expired
            {
                *record = record
                    .clone()
                    .with_status(tollgate_core::SubscriptionStatus::Expired);
                flipped += 1;
            }
        }
        Ok(flipped)
    }

    async fn repair_limits(
        &self,
        daily_limit: u64,
        monthly_limit: u64,
        monthly_token_limit: u64,
    ) -> StoreResult<u64> {
        self.check_online()?;
        let mut records = self.records.write().await;
        let mut repaired = 0;
        for record in records.values_mut() {
            let mut touched = false;
            let mut updated = record.clone();
            if *record.daily_limit() == 0 {
                updated = updated.with_daily_limit(daily_limit);
                touched = true;
            }
            if *record.monthly_limit() == 0 {
                updated = updated.with_monthly_limit(monthly_limit);
                touched = true;
            }
            if *record.monthly_token_limit() == 0 {
                updated = updated.with_monthly_token_limit(monthly_token_limit);
                touched = true;
            }
            if touched {
                *record = updated;
                repaired += 1;
            }
        }
        Ok(repaired)
    }

    async fn high_usage(&self, threshold_percent: f64) -> StoreResult<Vec<TenantId>> {
        self.check_online()?;
        let records = self.records.read().await;
        let mut tenants: Vec<TenantId> = records
            .values()
            .filter(|record| {
                *record.monthly_token_limit() > 0
                    && *record.tokens_this_month() > 0
                    && record
                        .token_percent()
                        .is_some_and(|pct| pct >= threshold_percent)
            })
            .map(|record| record.tenant_id().clone())
            .collect();
        tenants.sort();
        Ok(tenants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tollgate_core::SubscriptionStatus;

    fn tenant(id: &str) -> TenantId {
        TenantId::new(id).unwrap()
    }

    fn seeded(id: &str, now: DateTime<Utc>) -> TenantRecord {
        TenantRecord::provision(tenant(id), 100, 3000, 100_000, now)
    }

    #[tokio::test]
    async fn load_missing_tenant_is_not_found() {
        let store = MemoryTenantStore::new();
        let err = store.load(&tenant("ghost")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn apply_usage_increments_all_counters() {
        let store = MemoryTenantStore::new();
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        store.insert(seeded("t1", now)).await.unwrap();

        let delta = UsageDelta::new(1, 200, 0.00045);
        store.apply_usage(&tenant("t1"), delta, now).await.unwrap();
        store.apply_usage(&tenant("t1"), delta, now).await.unwrap();

        let record = store.load(&tenant("t1")).await.unwrap();
        assert_eq!(*record.calls_today(), 2);
        assert_eq!(*record.calls_this_month(), 2);
        assert_eq!(*record.calls_total(), 2);
        assert_eq!(*record.tokens_this_month(), 400);
        assert!((record.cost_total() - 0.0009).abs() < 1e-9);
        assert_eq!(*record.last_used_at(), Some(now));
    }

    #[tokio::test]
    async fn concurrent_deltas_lose_no_updates() {
        let store = MemoryTenantStore::new();
        let now = Utc::now();
        store.insert(seeded("t1", now)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .apply_usage(&tenant("t1"), UsageDelta::new(1, 10, 0.0), Utc::now())
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let record = store.load(&tenant("t1")).await.unwrap();
        assert_eq!(*record.calls_today(), 50);
        assert_eq!(*record.tokens_this_month(), 500);
    }

    #[tokio::test]
    async fn daily_reset_only_touches_stale_stamps() {
        let store = MemoryTenantStore::new();
        let old = Utc.with_ymd_and_hms(2025, 3, 8, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();

        let stale = seeded("stale", old).with_calls_today(40);
        let fresh = seeded("fresh", now).with_calls_today(7);
        store.insert(stale).await.unwrap();
        store.insert(fresh).await.unwrap();

        let cutoff = now - chrono::Duration::days(1);
        assert_eq!(store.reset_daily(cutoff, now).await.unwrap(), 1);

        let stale = store.load(&tenant("stale")).await.unwrap();
        assert_eq!(*stale.calls_today(), 0);
        assert_eq!(*stale.last_daily_reset(), now);

        let fresh = store.load(&tenant("fresh")).await.unwrap();
        assert_eq!(*fresh.calls_today(), 7);

        // Re-running the pass is harmless.
        assert_eq!(store.reset_daily(cutoff, now).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn monthly_reset_zeroes_calls_and_tokens() {
        let store = MemoryTenantStore::new();
        let old = Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();

        let record = seeded("t1", old)
            .with_calls_this_month(900)
            .with_tokens_this_month(80_000)
            .with_calls_today(3);
        store.insert(record).await.unwrap();

        let cutoff = now - chrono::Duration::days(28);
        assert_eq!(store.reset_monthly(cutoff, now).await.unwrap(), 1);

        let record = store.load(&tenant("t1")).await.unwrap();
        assert_eq!(*record.calls_this_month(), 0);
        assert_eq!(*record.tokens_this_month(), 0);
        // Daily counter is the daily pass's business.
        assert_eq!(*record.calls_today(), 3);
    }

    #[tokio::test]
    async fn mark_expired_flips_only_past_expiry_active_records() {
        let store = MemoryTenantStore::new();
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
        let past = now - chrono::Duration::days(40);

        store.insert(seeded("current", now)).await.unwrap();
        store.insert(seeded("lapsed", past)).await.unwrap();
        store
            .insert(
                seeded("done", past).with_status(SubscriptionStatus::Expired),
            )
            .await
            .unwrap();

        assert_eq!(store.mark_expired(now).await.unwrap(), 1);
        let lapsed = store.load(&tenant("lapsed")).await.unwrap();
        assert_eq!(*lapsed.status(), SubscriptionStatus::Expired);
        let current = store.load(&tenant("current")).await.unwrap();
        assert!(current.status().is_active());
    }

    #[tokio::test]
    async fn repair_limits_fills_only_zero_fields() {
        let store = MemoryTenantStore::new();
        let now = Utc::now();
        store
            .insert(TenantRecord::provision(tenant("broken"), 0, 0, 0, now))
            .await
            .unwrap();
        store
            .insert(TenantRecord::provision(tenant("custom"), 10, 300, 5000, now))
            .await
            .unwrap();

        assert_eq!(store.repair_limits(100, 3000, 100_000).await.unwrap(), 1);

        let broken = store.load(&tenant("broken")).await.unwrap();
        assert_eq!(*broken.daily_limit(), 100);
        assert_eq!(*broken.monthly_limit(), 3000);
        assert_eq!(*broken.monthly_token_limit(), 100_000);

        let custom = store.load(&tenant("custom")).await.unwrap();
        assert_eq!(*custom.daily_limit(), 10);
    }

    #[tokio::test]
    async fn high_usage_requires_positive_budget_and_usage() {
        let store = MemoryTenantStore::new();
        let now = Utc::now();
        store
            .insert(seeded("hot", now).with_tokens_this_month(85_000))
            .await
            .unwrap();
        store
            .insert(seeded("cool", now).with_tokens_this_month(10_000))
            .await
            .unwrap();
        store
            .insert(
                TenantRecord::provision(tenant("unmetered"), 100, 3000, 0, now)
                    .with_tokens_this_month(999_999),
            )
            .await
            .unwrap();

        let hot = store.high_usage(80.0).await.unwrap();
        assert_eq!(hot, vec![tenant("hot")]);
    }

    #[tokio::test]
    async fn offline_store_fails_every_operation() {
        let store = MemoryTenantStore::new();
        store.insert(seeded("t1", Utc::now())).await.unwrap();

        store.set_offline(true);
        let err = store.load(&tenant("t1")).await.unwrap_err();
        assert!(err.is_transient());

        store.set_offline(false);
        assert!(store.load(&tenant("t1")).await.is_ok());
    }
}
