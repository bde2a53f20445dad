//! Notification dedup log contract.

use crate::StoreResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tollgate_core::TenantId;

/// Alert categories the dedup log distinguishes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    /// Monthly token usage crossed the warning threshold
    UsageWarning,
    /// Monthly token budget fully consumed
    MonthlyLimit,
}

/// One recorded alert.
#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters, derive_new::new,
)]
pub struct NotificationRecord {
    /// Tenant the alert concerns
    tenant_id: TenantId,
    /// Alert category
    kind: NotificationKind,
    /// Rendered alert text
    message: String,
    /// When the alert was sent
    sent_at: DateTime<Utc>,
}

/// Log of sent alerts, queryable by recency.
///
/// The recency query must not scan full history; implementations index
/// by tenant and kind.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Record that an alert was sent now.
    async fn record(
        &self,
        tenant: &TenantId,
        kind: NotificationKind,
        message: &str,
    ) -> StoreResult<()>;

    /// Whether an alert of `kind` was recorded for `tenant` within the
    /// last `within_hours` hours.
    async fn was_recently_sent(
        &self,
        tenant: &TenantId,
        kind: NotificationKind,
        within_hours: u32,
    ) -> StoreResult<bool>;
}
