//! Subscription lifecycle gate.

use chrono::{DateTime, Utc};
use tollgate_core::{Decision, ReasonCode, SubscriptionStatus};
use tollgate_interface::TenantRecord;
use tracing::instrument;

/// Checks a tenant's subscription lifecycle.
///
/// Status is checked first, then the expiry date independently: an
/// `active` status with a past expiry still denies, covering the window
/// before the maintenance sweep reconciles status. The gate holds no
/// state.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use tollgate_core::{ReasonCode, TenantId};
/// use tollgate_interface::TenantRecord;
/// use tollgate_ledger::SubscriptionGate;
///
/// let record = TenantRecord::provision(
///     TenantId::new("t1").unwrap(), 100, 3000, 0, Utc::now(),
/// );
/// let decision = SubscriptionGate.check(&record, Utc::now());
/// assert!(decision.allowed());
///
/// let lapsed = record.with_expiry_date(Some(Utc::now() - Duration::days(1)));
/// let decision = SubscriptionGate.check(&lapsed, Utc::now());
/// assert_eq!(*decision.reason(), ReasonCode::SubscriptionExpired);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SubscriptionGate;

impl SubscriptionGate {
    /// Whether `record`'s subscription admits a call at `now`.
    #[instrument(skip(self, record), fields(tenant = %record.tenant_id(), status = %record.status()))]
    pub fn check(&self, record: &TenantRecord, now: DateTime<Utc>) -> Decision {
        match record.status() {
            SubscriptionStatus::Expired => {
                return Decision::deny(
                    ReasonCode::SubscriptionExpired,
                    "Your subscription has expired. Please renew to continue.",
                );
            }
            SubscriptionStatus::Suspended => {
                return Decision::deny(
                    ReasonCode::SubscriptionSuspended,
                    "Your account has been suspended. Please contact support.",
                );
            }
            // The client-facing code set is closed; inactive shares the
            // suspension code with its own message.
            SubscriptionStatus::Inactive => {
                return Decision::deny(
                    ReasonCode::SubscriptionSuspended,
                    "Your account is not active. Please contact support.",
                );
            }
            SubscriptionStatus::Active => {}
        }

        if record.is_past_expiry(now) {
            return Decision::deny(
                ReasonCode::SubscriptionExpired,
                "Your subscription has expired. Please renew to continue.",
            );
        }

        Decision::ok(record.usage_snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tollgate_core::TenantId;

    fn record() -> TenantRecord {
        TenantRecord::provision(
            TenantId::new("t1").unwrap(),
            100,
            3000,
            0,
            Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn active_within_term_allows() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
        assert!(SubscriptionGate.check(&record(), now).allowed());
    }

    #[test]
    fn each_status_maps_to_its_message() {
        let now = Utc::now();

        let expired = record().with_status(SubscriptionStatus::Expired);
        let decision = SubscriptionGate.check(&expired, now);
        assert_eq!(*decision.reason(), ReasonCode::SubscriptionExpired);
        assert!(decision.message().as_ref().unwrap().contains("renew"));

        let suspended = record().with_status(SubscriptionStatus::Suspended);
        let decision = SubscriptionGate.check(&suspended, now);
        assert_eq!(*decision.reason(), ReasonCode::SubscriptionSuspended);
        assert!(decision.message().as_ref().unwrap().contains("suspended"));

        let inactive = record().with_status(SubscriptionStatus::Inactive);
        let decision = SubscriptionGate.check(&inactive, now);
        assert_eq!(*decision.reason(), ReasonCode::SubscriptionSuspended);
        assert!(decision.message().as_ref().unwrap().contains("not active"));
    }

    #[test]
    fn active_status_past_expiry_denies_expired() {
        // Maintenance has not reconciled status yet; the date check
        // catches it anyway.
        let now = Utc::now();
        let lapsed = record().with_expiry_date(Some(now - Duration::days(1)));
        assert!(lapsed.status().is_active());

        let decision = SubscriptionGate.check(&lapsed, now);
        assert_eq!(*decision.reason(), ReasonCode::SubscriptionExpired);
    }

    #[test]
    fn missing_expiry_never_expires() {
        let now = Utc::now() + Duration::days(10_000);
        let open_ended = record().with_expiry_date(None);
        assert!(SubscriptionGate.check(&open_ended, now).allowed());
    }

    #[test]
    fn status_wins_over_date_order() {
        // Suspended and past expiry reports the suspension, matching
        // the status-first rule order.
        let now = Utc::now();
        let both = record()
            .with_status(SubscriptionStatus::Suspended)
            .with_expiry_date(Some(now - Duration::days(1)));
        let decision = SubscriptionGate.check(&both, now);
        assert_eq!(*decision.reason(), ReasonCode::SubscriptionSuspended);
    }
}
