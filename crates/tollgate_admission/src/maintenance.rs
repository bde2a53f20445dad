//! Scheduled maintenance passes.

use crate::UsageNotifier;
use chrono::Utc;
use std::sync::Arc;
use tollgate_core::TenantId;
use tollgate_error::TollgateResult;
use tollgate_interface::TenantStore;
use tollgate_ledger::{QuotaDefaults, daily_cutoff, monthly_cutoff};
use tracing::{error, info, instrument};

/// Bulk passes run off the request path by an external scheduler.
///
/// Reset detection is decoupled from live increments: each pass is a
/// conditional bulk update keyed on the records' reset stamps, so
/// re-running a pass is harmless and the request path never resets
/// counters itself.
#[derive(Clone)]
pub struct Maintenance {
    store: Arc<dyn TenantStore>,
    notifier: UsageNotifier,
    defaults: QuotaDefaults,
}

impl Maintenance {
    /// Create the maintenance entry points over a store and notifier.
    pub fn new(store: Arc<dyn TenantStore>, notifier: UsageNotifier, defaults: QuotaDefaults) -> Self {
        Self {
            store,
            notifier,
            defaults,
        }
    }

    /// Zero `calls_today` for records whose daily stamp is over a day
    /// old. Returns the number of records reset.
    #[instrument(skip(self))]
    pub async fn run_daily_reset(&self) -> TollgateResult<u64> {
        let now = Utc::now();
        let reset = self.store.reset_daily(daily_cutoff(now), now).await?;
        info!(reset, "Daily quota reset pass complete");
        Ok(reset)
    }

    /// Zero monthly calls and tokens for records whose monthly stamp is
    /// over a month old. Returns the number of records reset.
    #[instrument(skip(self))]
    pub async fn run_monthly_reset(&self) -> TollgateResult<u64> {
        let now = Utc::now();
        let reset = self.store.reset_monthly(monthly_cutoff(now), now).await?;
        info!(reset, "Monthly quota reset pass complete");
        Ok(reset)
    }

    /// Flip `status` to expired for tenants past their expiry date,
    /// keeping subsequent subscription checks cheap. Returns the number
    /// flipped.
    #[instrument(skip(self))]
    pub async fn reconcile_expired_subscriptions(&self) -> TollgateResult<u64> {
        let flipped = self.store.mark_expired(Utc::now()).await?;
        if flipped > 0 {
            info!(flipped, "Reconciled expired subscriptions");
        }
        Ok(flipped)
    }

    /// Write safe defaults into any record with unconfigured (zero)
    /// ceilings. Returns the number of records repaired.
    #[instrument(skip(self))]
    pub async fn repair_limits(&self) -> TollgateResult<u64> {
        let repaired = self
            .store
            .repair_limits(
                *self.defaults.daily_limit(),
                *self.defaults.monthly_limit(),
                *self.defaults.monthly_token_limit(),
            )
            .await?;
        if repaired > 0 {
            info!(repaired, "Repaired unconfigured tenant limits");
        }
        Ok(repaired)
    }

    /// Tenants at or past `threshold_percent` of their monthly token
    /// budget.
    #[instrument(skip(self))]
    pub async fn scan_high_usage_tenants(
        &self,
        threshold_percent: f64,
    ) -> TollgateResult<Vec<TenantId>> {
        Ok(self.store.high_usage(threshold_percent).await?)
    }

    /// Scan for tenants past the warning threshold and alert for each,
    /// subject to the notifier's dedup. Returns the number of alerts
    /// emitted.
    ///
    /// Catches threshold crossings the request-path recorder missed,
    /// such as usage applied while the recorder was down.
    #[instrument(skip(self))]
    pub async fn run_notification_scan(&self) -> TollgateResult<usize> {
        let tenants = self
            .scan_high_usage_tenants(crate::WARNING_THRESHOLD_PERCENT)
            .await?;
        let mut emitted = 0;
        for tenant in tenants {
            let record = match self.store.load(&tenant).await {
                Ok(record) => record,
                Err(e) => {
                    error!(tenant = %tenant, operation = "load", error = %e, "Skipping tenant in scan");
                    continue;
                }
            };
            let Some(percent) = record.token_percent() else {
                continue;
            };
            match self.notifier.notify_usage(&tenant, percent).await {
                Ok(true) => emitted += 1,
                Ok(false) => {}
                Err(e) => {
                    error!(tenant = %tenant, operation = "notify_usage", error = %e, "Alert failed");
                }
            }
        }
        if emitted > 0 {
            info!(emitted, "Usage notification scan complete");
        }
        Ok(emitted)
    }

    /// The hourly subscription pass: reconcile expiries, then repair
    /// unconfigured limits.
    #[instrument(skip(self))]
    pub async fn run_subscription_maintenance(&self) -> TollgateResult<()> {
        self.reconcile_expired_subscriptions().await?;
        self.repair_limits().await?;
        Ok(())
    }
}

impl std::fmt::Debug for Maintenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Maintenance")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}
