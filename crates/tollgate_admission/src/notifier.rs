//! Usage threshold alerts with dedup.

use std::sync::Arc;
use tollgate_core::TenantId;
use tollgate_interface::{NotificationKind, NotificationStore, StoreResult};
use tracing::{instrument, warn};

/// Monthly token percentage at which the warning alert fires.
pub const WARNING_THRESHOLD_PERCENT: f64 = 80.0;
/// Monthly token percentage at which the hard-limit alert fires.
pub const LIMIT_THRESHOLD_PERCENT: f64 = 100.0;
/// Cool-down between warning alerts for one tenant.
pub const WARNING_COOLDOWN_HOURS: u32 = 12;
/// Cool-down between hard-limit alerts for one tenant.
pub const LIMIT_COOLDOWN_HOURS: u32 = 24;

/// Emits usage-threshold alerts, suppressing repeats.
///
/// Usage hovering near a threshold would otherwise alert on every
/// admitted call; the dedup log suppresses repeats within the kind's
/// cool-down. At or past 100% only the hard-limit alert fires, not the
/// warning as well. Alert delivery is a structured log event plus the
/// dedup record; transports are out of scope.
#[derive(Clone)]
pub struct UsageNotifier {
    store: Arc<dyn NotificationStore>,
}

impl UsageNotifier {
    /// Create a notifier over a dedup log.
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    /// Consider alerting for a tenant at `percent` of its monthly token
    /// budget. Returns whether an alert was emitted.
    ///
    /// # Errors
    ///
    /// Propagates dedup log failures; the caller decides whether a
    /// missed alert matters (the recorder just logs it).
    #[instrument(skip(self), fields(tenant = %tenant))]
    pub async fn notify_usage(&self, tenant: &TenantId, percent: f64) -> StoreResult<bool> {
        let (kind, cooldown_hours, message) = if percent >= LIMIT_THRESHOLD_PERCENT {
            (
                NotificationKind::MonthlyLimit,
                LIMIT_COOLDOWN_HOURS,
                format!("Monthly token limit reached for tenant: {tenant}"),
            )
        } else if percent >= WARNING_THRESHOLD_PERCENT {
            (
                NotificationKind::UsageWarning,
                WARNING_COOLDOWN_HOURS,
                format!("Token usage warning ({percent:.1}%) for tenant: {tenant}"),
            )
        } else {
            return Ok(false);
        };

        if self
            .store
            .was_recently_sent(tenant, kind, cooldown_hours)
            .await?
        {
            return Ok(false);
        }

        self.store.record(tenant, kind, &message).await?;
        warn!(tenant = %tenant, kind = %kind, percent, "{message}");
        Ok(true)
    }
}

impl std::fmt::Debug for UsageNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageNotifier").finish_non_exhaustive()
    }
}
