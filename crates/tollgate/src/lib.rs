//! Tollgate: multi-tenant admission control for AI chat backends.
//!
//! Every inbound chat message passes the admission pipeline before the
//! AI generation call is dispatched: a per-client sliding-window rate
//! limiter, a per-tenant subscription gate, and a quota ledger of daily
//! and monthly call ceilings plus a monthly token budget. Completed
//! generations are recorded asynchronously, and usage-threshold alerts
//! are deduplicated against a notification log.
//!
//! This crate re-exports the workspace's public surface and ships the
//! `tollgated` binary. Typical wiring:
//!
//! ```no_run
//! use std::sync::Arc;
//! use tollgate::{
//!     AdmissionPipeline, AdmissionRequest, LimiterRegistry, MemoryNotificationStore,
//!     MemoryTenantStore, PricingTable, QuotaDefaults, QuotaGate, StoreTimeouts,
//!     UsageNotifier, UsageRecorder, DEFAULT_QUEUE_CAPACITY,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(MemoryTenantStore::new());
//!     let notifier = UsageNotifier::new(Arc::new(MemoryNotificationStore::new()));
//!     let (handle, recorder) =
//!         UsageRecorder::channel(store.clone(), notifier, DEFAULT_QUEUE_CAPACITY);
//!     recorder.spawn();
//!
//!     let pipeline = AdmissionPipeline::new(
//!         Arc::new(LimiterRegistry::with_defaults().unwrap()),
//!         store,
//!         QuotaGate::new(QuotaDefaults::default()),
//!         PricingTable::default(),
//!         handle,
//!         StoreTimeouts::default(),
//!     );
//!     // pipeline.admit(&AdmissionRequest::new(...)).await
//! }
//! ```

mod config;

pub use config::{ClassConfig, JanitorConfig, TimeoutConfig, TollgateConfig};

// Error foundation
pub use tollgate_error::{
    AdmissionError, AdmissionErrorKind, ConfigError, RateLimitError, RateLimitErrorKind,
    StoreError, StoreErrorKind, TenantError, TenantErrorKind, TollgateError, TollgateErrorKind,
    TollgateResult,
};

// Core domain types
pub use tollgate_core::{
    AdmissionState, Decision, ModelRate, PricingTable, ReasonCode, SubscriptionStatus, TenantId,
    TokenUsage, UsageDelta, UsageSnapshot, estimate_tokens, headers,
};

// Storage contracts and the in-memory reference implementations
pub use tollgate_interface::{
    NotificationKind, NotificationRecord, NotificationStore, StoreResult, TenantRecord,
    TenantStore,
};
pub use tollgate_storage::{MemoryNotificationStore, MemoryTenantStore};

// Rate limiting
pub use tollgate_rate_limit::{
    CLASS_AUTH, CLASS_CHAT, CLASS_GENERAL, Janitor, LimiterRegistry, RateLimiter, RatePolicy,
    WindowCounter,
};

// Quota ledger and subscription gate
pub use tollgate_ledger::{
    LimitRepair, QuotaCheck, QuotaDefaults, QuotaGate, SubscriptionGate, next_daily_reset,
    next_monthly_reset, usage_delta,
};

// Admission pipeline and workers
pub use tollgate_admission::{
    AdmissionPipeline, AdmissionRequest, DEFAULT_QUEUE_CAPACITY, Maintenance, MaintenancePlan,
    MaintenanceRunner, MaintenanceSchedule, RecorderHandle, StoreTimeouts, UsageNotifier,
    UsageRecorder,
};
