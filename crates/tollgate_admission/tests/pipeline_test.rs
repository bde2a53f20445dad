//! End-to-end admission pipeline tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Timelike, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tollgate_admission::{
    AdmissionPipeline, AdmissionRequest, StoreTimeouts, UsageNotifier, UsageRecorder,
};
use tollgate_core::{PricingTable, ReasonCode, TenantId, TokenUsage, UsageDelta};
use tollgate_error::{StoreError, StoreErrorKind};
use tollgate_interface::{StoreResult, TenantRecord, TenantStore};
use tollgate_ledger::{QuotaDefaults, QuotaGate};
use tollgate_rate_limit::{LimiterRegistry, RatePolicy};
use tollgate_storage::{MemoryNotificationStore, MemoryTenantStore};

struct Harness {
    pipeline: AdmissionPipeline,
    store: Arc<MemoryTenantStore>,
    notifications: Arc<MemoryNotificationStore>,
    recorder: tokio::task::JoinHandle<()>,
    recorder_handle: tollgate_admission::RecorderHandle,
}

fn chat_registry(burst: u32) -> Arc<LimiterRegistry> {
    let mut policies = HashMap::new();
    policies.insert("chat".to_string(), RatePolicy::new(60, burst).unwrap());
    Arc::new(LimiterRegistry::new(policies).unwrap())
}

fn harness(burst: u32) -> Harness {
    let store = Arc::new(MemoryTenantStore::new());
    let notifications = Arc::new(MemoryNotificationStore::new());
    let notifier = UsageNotifier::new(notifications.clone());
    let (handle, recorder) = UsageRecorder::channel(store.clone(), notifier, 64);
    let pipeline = AdmissionPipeline::new(
        chat_registry(burst),
        store.clone(),
        QuotaGate::new(QuotaDefaults::default()),
        PricingTable::default(),
        handle.clone(),
        StoreTimeouts::default(),
    );
    Harness {
        pipeline,
        store,
        notifications,
        recorder: recorder.spawn(),
        recorder_handle: handle,
    }
}

impl Harness {
    async fn seed(&self, record: TenantRecord) {
        self.store.insert(record).await.unwrap();
    }

    async fn drain_recorder(self) -> (Arc<MemoryTenantStore>, Arc<MemoryNotificationStore>) {
        self.recorder_handle.shutdown().await;
        self.recorder.await.unwrap();
        (self.store, self.notifications)
    }
}

fn tenant(id: &str) -> TenantId {
    TenantId::new(id).unwrap()
}

fn request(id: &str, key: &str) -> AdmissionRequest {
    AdmissionRequest::new(tenant(id), key.to_string(), "chat".to_string())
}

fn active_record(id: &str, daily: u64, monthly: u64, tokens: u64) -> TenantRecord {
    TenantRecord::provision(tenant(id), daily, monthly, tokens, Utc::now())
}

#[tokio::test]
async fn burst_of_three_admits_three_then_rate_limits() {
    let h = harness(3);
    h.seed(active_record("t1", 100, 3000, 0)).await;

    let req = request("t1", "ip1");
    for _ in 0..3 {
        let decision = h.pipeline.admit(&req).await.unwrap();
        assert!(decision.allowed(), "within-burst call denied");
    }

    let decision = h.pipeline.admit(&req).await.unwrap();
    assert!(!decision.allowed());
    assert_eq!(*decision.reason(), ReasonCode::RateLimited);
    let retry = (*decision.retry_after_seconds()).expect("retry hint");
    assert!(retry >= 1 && retry <= 60);
    assert!(decision.resets_at().is_some());
}

#[tokio::test]
async fn rate_limit_keys_are_independent() {
    let h = harness(1);
    h.seed(active_record("t1", 100, 3000, 0)).await;

    assert!(h.pipeline.admit(&request("t1", "ip1")).await.unwrap().allowed());
    assert!(!h.pipeline.admit(&request("t1", "ip1")).await.unwrap().allowed());
    assert!(h.pipeline.admit(&request("t1", "ip2")).await.unwrap().allowed());
}

#[tokio::test]
async fn exhausted_daily_quota_denies_with_reset_time() {
    let h = harness(100);
    h.seed(active_record("t1", 5, 3000, 0).with_calls_today(5))
        .await;

    let decision = h.pipeline.admit(&request("t1", "ip1")).await.unwrap();
    assert_eq!(*decision.reason(), ReasonCode::DailyLimitExceeded);

    let resets_at = (*decision.resets_at()).expect("reset time");
    assert!(resets_at > Utc::now());
    assert_eq!((resets_at.time().hour(), resets_at.time().minute()), (0, 0));
}

#[tokio::test]
async fn token_budget_is_checked_before_the_call_not_after() {
    let h = harness(100);
    h.seed(active_record("t1", 100, 3000, 1000).with_tokens_this_month(999))
        .await;

    // 999 of 1000 used: this call still admits.
    let decision = h.pipeline.admit(&request("t1", "ip1")).await.unwrap();
    assert!(decision.allowed());
    h.pipeline
        .report_success(&tenant("t1"), "gemini-1.5-flash", TokenUsage::new(30, 20));

    let (store, _) = h.drain_recorder().await;
    let record = store.load(&tenant("t1")).await.unwrap();
    assert_eq!(*record.tokens_this_month(), 1049);

    // The next call finds the budget exhausted.
    let h = harness(100);
    h.seed(record).await;
    let decision = h.pipeline.admit(&request("t1", "ip2")).await.unwrap();
    assert_eq!(*decision.reason(), ReasonCode::TokenBudgetExceeded);
}

#[tokio::test]
async fn stale_active_status_past_expiry_is_denied() {
    // Maintenance has not flipped status yet; the date check catches it.
    let h = harness(100);
    h.seed(
        active_record("t1", 100, 3000, 0).with_expiry_date(Some(Utc::now() - Duration::days(1))),
    )
    .await;

    let decision = h.pipeline.admit(&request("t1", "ip1")).await.unwrap();
    assert_eq!(*decision.reason(), ReasonCode::SubscriptionExpired);
}

#[tokio::test]
async fn subscription_outranks_quota_in_denial_reason() {
    let h = harness(100);
    h.seed(
        active_record("t1", 5, 3000, 0)
            .with_calls_today(5)
            .with_expiry_date(Some(Utc::now() - Duration::days(1))),
    )
    .await;

    let decision = h.pipeline.admit(&request("t1", "ip1")).await.unwrap();
    assert_eq!(*decision.reason(), ReasonCode::SubscriptionExpired);
}

#[tokio::test]
async fn rate_limit_outranks_subscription_in_denial_reason() {
    let h = harness(1);
    h.seed(
        active_record("t1", 100, 3000, 0).with_expiry_date(Some(Utc::now() - Duration::days(1))),
    )
    .await;

    assert!(!h.pipeline.admit(&request("t1", "ip1")).await.unwrap().allowed());
    let decision = h.pipeline.admit(&request("t1", "ip1")).await.unwrap();
    assert_eq!(*decision.reason(), ReasonCode::RateLimited);
}

#[tokio::test]
async fn unknown_tenant_fails_closed() {
    let h = harness(100);
    let err = h.pipeline.admit(&request("ghost", "ip1")).await.unwrap_err();
    assert!(format!("{err}").contains("not found"));
}

#[tokio::test]
async fn store_outage_fails_closed_for_quota_and_subscription() {
    let h = harness(100);
    h.seed(active_record("t1", 100, 3000, 0)).await;

    h.store.set_offline(true);
    let err = h.pipeline.admit(&request("t1", "ip1")).await.unwrap_err();
    assert!(format!("{err}").contains("unavailable"));

    h.store.set_offline(false);
    assert!(h.pipeline.admit(&request("t1", "ip1")).await.unwrap().allowed());
}

/// Tenant store whose reads or writes hang far past any deadline,
/// delegating the rest to an in-memory store.
struct StallingStore {
    inner: MemoryTenantStore,
    stall_reads: bool,
    stall_writes: bool,
}

impl StallingStore {
    async fn stall<T>() -> StoreResult<T> {
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        Err(StoreError::new(StoreErrorKind::Unavailable(
            "stalled store woke up".to_string(),
        )))
    }
}

#[async_trait]
impl TenantStore for StallingStore {
    async fn load(&self, tenant: &TenantId) -> StoreResult<TenantRecord> {
        if self.stall_reads {
            return Self::stall().await;
        }
        self.inner.load(tenant).await
    }

    async fn insert(&self, record: TenantRecord) -> StoreResult<()> {
        self.inner.insert(record).await
    }

    async fn set_limits(
        &self,
        tenant: &TenantId,
        daily_limit: Option<u64>,
        monthly_limit: Option<u64>,
        monthly_token_limit: Option<u64>,
    ) -> StoreResult<()> {
        if self.stall_writes {
            return Self::stall().await;
        }
        self.inner
            .set_limits(tenant, daily_limit, monthly_limit, monthly_token_limit)
            .await
    }

    async fn apply_usage(
        &self,
        tenant: &TenantId,
        delta: UsageDelta,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.inner.apply_usage(tenant, delta, at).await
    }

    async fn reset_daily(&self, cutoff: DateTime<Utc>, now: DateTime<Utc>) -> StoreResult<u64> {
        self.inner.reset_daily(cutoff, now).await
    }

    async fn reset_monthly(&self, cutoff: DateTime<Utc>, now: DateTime<Utc>) -> StoreResult<u64> {
        self.inner.reset_monthly(cutoff, now).await
    }

    async fn mark_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        self.inner.mark_expired(now).await
    }

    async fn repair_limits(
        &self,
        daily_limit: u64,
        monthly_limit: u64,
        monthly_token_limit: u64,
    ) -> StoreResult<u64> {
        self.inner
            .repair_limits(daily_limit, monthly_limit, monthly_token_limit)
            .await
    }

    async fn high_usage(&self, threshold_percent: f64) -> StoreResult<Vec<TenantId>> {
        self.inner.high_usage(threshold_percent).await
    }
}

fn stalling_pipeline(store: Arc<StallingStore>) -> AdmissionPipeline {
    let notifier = UsageNotifier::new(Arc::new(MemoryNotificationStore::new()));
    let (handle, recorder) = UsageRecorder::channel(store.clone(), notifier, 64);
    drop(recorder);
    AdmissionPipeline::new(
        chat_registry(100),
        store,
        QuotaGate::new(QuotaDefaults::default()),
        PricingTable::default(),
        handle,
        StoreTimeouts::new(1, 1),
    )
}

#[tokio::test]
async fn store_read_slower_than_deadline_times_out_and_fails_closed() {
    let store = Arc::new(StallingStore {
        inner: MemoryTenantStore::new(),
        stall_reads: true,
        stall_writes: false,
    });
    let pipeline = stalling_pipeline(store);

    let started = std::time::Instant::now();
    let err = pipeline.admit(&request("t1", "ip1")).await.unwrap_err();
    assert!(format!("{err}").contains("'load' timed out after 1s"));
    // The deadline cut the round trip short, not the 60s sleep.
    assert!(started.elapsed() < std::time::Duration::from_secs(5));
}

#[tokio::test]
async fn repair_write_slower_than_deadline_times_out_and_fails_closed() {
    let store = Arc::new(StallingStore {
        inner: MemoryTenantStore::new(),
        stall_reads: false,
        stall_writes: true,
    });
    // Zero ceilings force a repair, and persisting it hits the write path.
    store
        .inner
        .insert(active_record("t1", 0, 0, 0))
        .await
        .unwrap();
    let pipeline = stalling_pipeline(store);

    let started = std::time::Instant::now();
    let err = pipeline.admit(&request("t1", "ip1")).await.unwrap_err();
    assert!(format!("{err}").contains("'set_limits' timed out after 1s"));
    assert!(started.elapsed() < std::time::Duration::from_secs(5));
}

#[tokio::test]
async fn zero_limits_are_repaired_and_persisted() {
    let h = harness(100);
    h.seed(active_record("t1", 0, 0, 0)).await;

    let decision = h.pipeline.admit(&request("t1", "ip1")).await.unwrap();
    assert!(decision.allowed());
    let usage = decision.usage().as_ref().expect("usage snapshot");
    assert_eq!(*usage.daily_limit(), 100);

    // The repair stuck.
    let record = h.store.load(&tenant("t1")).await.unwrap();
    assert_eq!(*record.daily_limit(), 100);
    assert_eq!(*record.monthly_limit(), 3000);
}

#[tokio::test]
async fn reported_success_lands_in_the_ledger() {
    let h = harness(100);
    h.seed(active_record("t1", 100, 3000, 100_000)).await;

    for _ in 0..3 {
        let decision = h.pipeline.admit(&request("t1", "ip1")).await.unwrap();
        assert!(decision.allowed());
        h.pipeline
            .report_success(&tenant("t1"), "gemini-1.5-flash", TokenUsage::new(2000, 1000));
    }

    let (store, _) = h.drain_recorder().await;
    let record = store.load(&tenant("t1")).await.unwrap();
    assert_eq!(*record.calls_today(), 3);
    assert_eq!(*record.calls_this_month(), 3);
    assert_eq!(*record.calls_total(), 3);
    assert_eq!(*record.tokens_this_month(), 9000);
    assert!((record.cost_total() - 0.00135).abs() < 1e-9);
    assert!(record.last_used_at().is_some());
}

#[tokio::test]
async fn overshoot_is_bounded_by_in_flight_requests() {
    // Soft-limit property: M concurrent requests against k remaining
    // slots admit at least k and at most M, because usage lands
    // asynchronously. Nothing admits once the limit-reaching increment
    // is visible.
    let h = harness(10_000);
    let daily_limit = 20u64;
    let used = 15u64;
    h.seed(active_record("t1", daily_limit, 30_000, 0).with_calls_today(used))
        .await;

    let pipeline = Arc::new(h.pipeline);
    let mut admitted = 0u64;
    let concurrency = 50u64;
    let mut handles = Vec::new();
    for i in 0..concurrency {
        let pipeline = Arc::clone(&pipeline);
        handles.push(tokio::spawn(async move {
            let req = request("t1", &format!("ip{i}"));
            let decision = pipeline.admit(&req).await.unwrap();
            if *decision.allowed() {
                pipeline.report_success(&tenant("t1"), "gemini-1.5-flash", TokenUsage::new(4, 4));
            }
            *decision.allowed()
        }));
    }
    for handle in handles {
        if handle.await.unwrap() {
            admitted += 1;
        }
    }

    let k = daily_limit - used;
    assert!(admitted >= k, "under-admitted: {admitted} < {k}");
    assert!(admitted <= concurrency);

    // Once recording catches up the ledger reflects every admit, and
    // further requests are denied outright.
    h.recorder_handle.shutdown().await;
    h.recorder.await.unwrap();
    let record = h.store.load(&tenant("t1")).await.unwrap();
    assert_eq!(*record.calls_today(), used + admitted);

    let notifier = UsageNotifier::new(h.notifications.clone());
    let (handle, recorder) = UsageRecorder::channel(h.store.clone(), notifier, 64);
    let pipeline = AdmissionPipeline::new(
        chat_registry(10_000),
        h.store.clone(),
        QuotaGate::new(QuotaDefaults::default()),
        PricingTable::default(),
        handle,
        StoreTimeouts::default(),
    );
    drop(recorder);
    let decision = pipeline.admit(&request("t1", "late")).await.unwrap();
    assert_eq!(*decision.reason(), ReasonCode::DailyLimitExceeded);
}

#[tokio::test]
async fn crossing_the_warning_threshold_emits_one_alert() {
    let h = harness(100);
    h.seed(active_record("t1", 100, 3000, 1000)).await;

    // Three calls push usage to 88%; only the first crossing alerts.
    for _ in 0..3 {
        assert!(h.pipeline.admit(&request("t1", "ip1")).await.unwrap().allowed());
        h.pipeline
            .report_success(&tenant("t1"), "gemini-1.5-flash", TokenUsage::new(200, 93));
    }

    let (_, notifications) = h.drain_recorder().await;
    let records = notifications.records().await;
    assert_eq!(records.len(), 1);
    assert!(records[0].message().contains("Token usage warning"));
}
