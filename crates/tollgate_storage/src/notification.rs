//! In-memory notification dedup log.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tollgate_core::TenantId;
use tollgate_interface::{NotificationKind, NotificationRecord, NotificationStore, StoreResult};

/// In-memory [`NotificationStore`].
///
/// The recency index keys by (tenant, kind), so `was_recently_sent`
/// reads one entry instead of scanning history. The full record list is
/// kept for inspection in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotificationStore {
    last_sent: Arc<RwLock<HashMap<(TenantId, NotificationKind), DateTime<Utc>>>>,
    history: Arc<RwLock<Vec<NotificationRecord>>>,
}

impl MemoryNotificationStore {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded alerts (for testing).
    pub async fn len(&self) -> usize {
        self.history.read().await.len()
    }

    /// Whether no alerts have been recorded (for testing).
    pub async fn is_empty(&self) -> bool {
        self.history.read().await.is_empty()
    }

    /// All recorded alerts, oldest first (for testing).
    pub async fn records(&self) -> Vec<NotificationRecord> {
        self.history.read().await.clone()
    }

    /// Backdate the last send of (tenant, kind) to `sent_at`, as if the
    /// cool-down had partly elapsed (for testing).
    pub async fn backdate(&self, tenant: &TenantId, kind: NotificationKind, sent_at: DateTime<Utc>) {
        let mut last_sent = self.last_sent.write().await;
        last_sent.insert((tenant.clone(), kind), sent_at);
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn record(
        &self,
        tenant: &TenantId,
        kind: NotificationKind,
        message: &str,
    ) -> StoreResult<()> {
        let now = Utc::now();
        let mut last_sent = self.last_sent.write().await;
        last_sent.insert((tenant.clone(), kind), now);
        drop(last_sent);

        let mut history = self.history.write().await;
        history.push(NotificationRecord::new(
            tenant.clone(),
            kind,
            message.to_string(),
            now,
        ));
        Ok(())
    }

    async fn was_recently_sent(
        &self,
        tenant: &TenantId,
        kind: NotificationKind,
        within_hours: u32,
    ) -> StoreResult<bool> {
        let last_sent = self.last_sent.read().await;
        let Some(sent_at) = last_sent.get(&(tenant.clone(), kind)) else {
            return Ok(false);
        };
        let cutoff = Utc::now() - Duration::hours(within_hours as i64);
        Ok(*sent_at > cutoff)
    }
}
