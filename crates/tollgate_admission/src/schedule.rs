//! Maintenance scheduling.

use crate::Maintenance;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tollgate_error::{AdmissionError, AdmissionErrorKind};
use tracing::{error, info};

/// When a recurring maintenance task runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MaintenanceSchedule {
    /// Cron expression (7 fields: sec min hour day month weekday year)
    ///
    /// Example: "0 0 0 * * * *" = midnight UTC daily
    Cron {
        /// Cron expression string
        expression: String,
    },
    /// Fixed interval in seconds
    Interval {
        /// Seconds between runs
        seconds: u64,
    },
}

impl MaintenanceSchedule {
    /// The next run strictly after `after`.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionErrorKind::Schedule`] for an unparsable cron
    /// expression or one with no future occurrence.
    pub fn next_after(&self, after: DateTime<Utc>) -> Result<DateTime<Utc>, AdmissionError> {
        match self {
            MaintenanceSchedule::Cron { expression } => {
                let schedule = cron::Schedule::from_str(expression).map_err(|e| {
                    AdmissionError::new(AdmissionErrorKind::Schedule(format!("{expression}: {e}")))
                })?;
                schedule.after(&after).next().ok_or_else(|| {
                    AdmissionError::new(AdmissionErrorKind::Schedule(format!(
                        "{expression}: no future occurrence"
                    )))
                })
            }
            MaintenanceSchedule::Interval { seconds } => {
                Ok(after + Duration::seconds(*seconds as i64))
            }
        }
    }
}

/// The recurring maintenance tasks and their schedules.
///
/// Defaults: quota resets on cron at UTC midnight and the first of the
/// month, subscription maintenance hourly, the notification scan every
/// 30 minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(default)]
pub struct MaintenancePlan {
    /// Daily quota reset pass
    daily_reset: MaintenanceSchedule,
    /// Monthly quota reset pass
    monthly_reset: MaintenanceSchedule,
    /// Expiry reconciliation and limit repair
    subscription: MaintenanceSchedule,
    /// High-usage notification scan
    notification_scan: MaintenanceSchedule,
}

impl Default for MaintenancePlan {
    fn default() -> Self {
        Self {
            daily_reset: MaintenanceSchedule::Cron {
                expression: "0 0 0 * * * *".to_string(),
            },
            monthly_reset: MaintenanceSchedule::Cron {
                expression: "0 0 0 1 * * *".to_string(),
            },
            subscription: MaintenanceSchedule::Interval { seconds: 3600 },
            notification_scan: MaintenanceSchedule::Interval { seconds: 1800 },
        }
    }
}

impl MaintenancePlan {
    /// Validate every schedule in the plan.
    ///
    /// # Errors
    ///
    /// Returns the first schedule that cannot produce a next run.
    pub fn validate(&self) -> Result<(), AdmissionError> {
        let now = Utc::now();
        self.daily_reset.next_after(now)?;
        self.monthly_reset.next_after(now)?;
        self.subscription.next_after(now)?;
        self.notification_scan.next_after(now)?;
        Ok(())
    }
}

/// Drives the maintenance passes on their schedules.
///
/// One task owns all four schedules: it sleeps until the earliest due
/// time, runs whatever is due, and reschedules. Failures are logged and
/// the task keeps its cadence.
pub struct MaintenanceRunner {
    maintenance: Maintenance,
    plan: MaintenancePlan,
    shutdown: Arc<Notify>,
}

impl MaintenanceRunner {
    /// Create a runner, validating the plan up front.
    ///
    /// # Errors
    ///
    /// Returns the plan's first invalid schedule.
    pub fn new(maintenance: Maintenance, plan: MaintenancePlan) -> Result<Self, AdmissionError> {
        plan.validate()?;
        Ok(Self {
            maintenance,
            plan,
            shutdown: Arc::new(Notify::new()),
        })
    }

    /// Handle for requesting shutdown of a spawned runner.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    /// Spawn the scheduling loop on the current runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Maintenance runner started");
            let now = Utc::now();
            // Validated at construction; fall back to a day out if a
            // cron schedule exhausts at runtime.
            let fallback = now + Duration::days(1);
            let mut due = [
                self.plan.daily_reset.next_after(now).unwrap_or(fallback),
                self.plan.monthly_reset.next_after(now).unwrap_or(fallback),
                self.plan.subscription.next_after(now).unwrap_or(fallback),
                self.plan
                    .notification_scan
                    .next_after(now)
                    .unwrap_or(fallback),
            ];

            loop {
                let next = due.iter().min().copied().unwrap_or(fallback);
                let wait = (next - Utc::now()).to_std().unwrap_or_default();
                tokio::select! {
                    _ = tokio::time::sleep(wait) => {}
                    _ = self.shutdown.notified() => {
                        info!("Maintenance runner shutting down");
                        break;
                    }
                }

                let now = Utc::now();
                if due[0] <= now {
                    if let Err(e) = self.maintenance.run_daily_reset().await {
                        error!(error = %e, "Daily reset pass failed");
                    }
                    due[0] = self.plan.daily_reset.next_after(now).unwrap_or(fallback);
                }
                if due[1] <= now {
                    if let Err(e) = self.maintenance.run_monthly_reset().await {
                        error!(error = %e, "Monthly reset pass failed");
                    }
                    due[1] = self.plan.monthly_reset.next_after(now).unwrap_or(fallback);
                }
                if due[2] <= now {
                    if let Err(e) = self.maintenance.run_subscription_maintenance().await {
                        error!(error = %e, "Subscription maintenance failed");
                    }
                    due[2] = self.plan.subscription.next_after(now).unwrap_or(fallback);
                }
                if due[3] <= now {
                    if let Err(e) = self.maintenance.run_notification_scan().await {
                        error!(error = %e, "Notification scan failed");
                    }
                    due[3] = self
                        .plan
                        .notification_scan
                        .next_after(now)
                        .unwrap_or(fallback);
                }
            }
        })
    }
}
