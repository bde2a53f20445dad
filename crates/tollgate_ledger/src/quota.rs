//! Quota ledger checks.

use crate::{QuotaDefaults, next_daily_reset, next_monthly_reset};
use chrono::{DateTime, Utc};
use tollgate_core::{Decision, ReasonCode, UsageSnapshot};
use tollgate_interface::TenantRecord;
use tracing::{info, instrument};

/// Ceilings the quota gate substituted for zero fields, to be persisted
/// by the caller so the repair sticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_getters::Getters)]
pub struct LimitRepair {
    /// Replacement daily ceiling, when the stored one was zero
    daily_limit: Option<u64>,
    /// Replacement monthly ceiling, when the stored one was zero
    monthly_limit: Option<u64>,
}

/// Outcome of one quota evaluation.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct QuotaCheck {
    /// The allow/deny outcome
    decision: Decision,
    /// Repairs to persist, when ceilings were unconfigured
    repair: Option<LimitRepair>,
}

impl QuotaCheck {
    /// Split into decision and repair.
    pub fn into_parts(self) -> (Decision, Option<LimitRepair>) {
        (self.decision, self.repair)
    }
}

/// Evaluates a tenant's counters against its ceilings.
///
/// Checks run cheapest and most conclusive first and short-circuit:
/// repair unconfigured ceilings, then daily calls, monthly calls, and
/// the token budget. The limits are checked before the call the caller
/// is about to make, so a call that lands exactly on a ceiling still
/// admits and the next one denies (soft limits under concurrency).
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use tollgate_core::{ReasonCode, TenantId};
/// use tollgate_interface::TenantRecord;
/// use tollgate_ledger::{QuotaDefaults, QuotaGate};
///
/// let gate = QuotaGate::new(QuotaDefaults::default());
/// let record = TenantRecord::provision(
///     TenantId::new("t1").unwrap(), 5, 3000, 0, Utc::now(),
/// ).with_calls_today(5);
///
/// let check = gate.evaluate(&record, Utc::now());
/// assert_eq!(*check.decision().reason(), ReasonCode::DailyLimitExceeded);
/// ```
#[derive(Debug, Clone, derive_getters::Getters, derive_new::new)]
pub struct QuotaGate {
    /// Ceilings substituted for unconfigured records
    defaults: QuotaDefaults,
}

impl QuotaGate {
    /// Check `record`'s counters, repairing unconfigured ceilings.
    #[instrument(skip(self, record), fields(tenant = %record.tenant_id()))]
    pub fn evaluate(&self, record: &TenantRecord, now: DateTime<Utc>) -> QuotaCheck {
        let mut daily_limit = *record.daily_limit();
        let mut monthly_limit = *record.monthly_limit();

        // Zero means unconfigured, never "zero allowed".
        let repair = if record.needs_limit_repair() {
            let repaired_daily = (daily_limit == 0).then(|| *self.defaults.daily_limit());
            let repaired_monthly = (monthly_limit == 0).then(|| *self.defaults.monthly_limit());
            daily_limit = repaired_daily.unwrap_or(daily_limit);
            monthly_limit = repaired_monthly.unwrap_or(monthly_limit);
            info!(
                tenant = %record.tenant_id(),
                daily_limit,
                monthly_limit,
                "Repaired unconfigured quota ceilings"
            );
            Some(LimitRepair {
                daily_limit: repaired_daily,
                monthly_limit: repaired_monthly,
            })
        } else {
            None
        };

        let usage = UsageSnapshot::new(
            *record.calls_today(),
            daily_limit,
            *record.calls_this_month(),
            monthly_limit,
            *record.tokens_this_month(),
            *record.monthly_token_limit(),
        );

        let decision = if *record.calls_today() >= daily_limit {
            Decision::deny(
                ReasonCode::DailyLimitExceeded,
                "Daily AI usage limit reached for this project. Please try again tomorrow.",
            )
            .with_resets_at(next_daily_reset(now))
            .with_usage(usage)
        } else if *record.calls_this_month() >= monthly_limit {
            Decision::deny(
                ReasonCode::MonthlyLimitExceeded,
                "Monthly AI usage limit reached for this project.",
            )
            .with_resets_at(next_monthly_reset(now))
            .with_usage(usage)
        } else if *record.monthly_token_limit() > 0
            && *record.tokens_this_month() >= *record.monthly_token_limit()
        {
            Decision::deny(
                ReasonCode::TokenBudgetExceeded,
                "Monthly token budget exhausted for this project.",
            )
            .with_resets_at(next_monthly_reset(now))
            .with_usage(usage)
        } else {
            Decision::ok(usage)
        };

        QuotaCheck { decision, repair }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tollgate_core::TenantId;

    fn gate() -> QuotaGate {
        QuotaGate::new(QuotaDefaults::default())
    }

    fn record(daily: u64, monthly: u64, tokens: u64) -> TenantRecord {
        TenantRecord::provision(
            TenantId::new("t1").unwrap(),
            daily,
            monthly,
            tokens,
            Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
        )
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn under_all_ceilings_allows() {
        let record = record(100, 3000, 100_000)
            .with_calls_today(99)
            .with_calls_this_month(2999)
            .with_tokens_this_month(99_999);
        let (decision, repair) = gate().evaluate(&record, noon()).into_parts();
        assert!(decision.allowed());
        assert!(repair.is_none());
    }

    #[test]
    fn daily_ceiling_denies_with_next_midnight() {
        let record = record(5, 3000, 0).with_calls_today(5);
        let check = gate().evaluate(&record, noon());
        assert_eq!(*check.decision().reason(), ReasonCode::DailyLimitExceeded);
        assert_eq!(
            *check.decision().resets_at(),
            Some(Utc.with_ymd_and_hms(2025, 3, 11, 0, 0, 0).unwrap())
        );
        assert_eq!(
            check.decision().usage().as_ref().map(|u| *u.daily_used()),
            Some(5)
        );
    }

    #[test]
    fn monthly_ceiling_denies_with_first_of_next_month() {
        let record = record(100, 30, 0).with_calls_this_month(30);
        let check = gate().evaluate(&record, noon());
        assert_eq!(*check.decision().reason(), ReasonCode::MonthlyLimitExceeded);
        assert_eq!(
            *check.decision().resets_at(),
            Some(Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn daily_ceiling_wins_over_monthly() {
        let record = record(5, 30, 0).with_calls_today(5).with_calls_this_month(30);
        let check = gate().evaluate(&record, noon());
        assert_eq!(*check.decision().reason(), ReasonCode::DailyLimitExceeded);
    }

    #[test]
    fn token_budget_checked_pre_call() {
        // 999 of 1000 tokens used: this call still admits, the next
        // (pushed past the budget) denies.
        let under = record(100, 3000, 1000).with_tokens_this_month(999);
        assert!(gate().evaluate(&under, noon()).decision().allowed());

        let over = under.with_tokens_this_month(1049);
        let check = gate().evaluate(&over, noon());
        assert_eq!(*check.decision().reason(), ReasonCode::TokenBudgetExceeded);
    }

    #[test]
    fn zero_token_limit_disables_budget_check() {
        let record = record(100, 3000, 0).with_tokens_this_month(u64::MAX / 2);
        assert!(gate().evaluate(&record, noon()).decision().allowed());
    }

    #[test]
    fn zero_ceilings_are_repaired_not_blocking() {
        let record = record(0, 0, 0).with_calls_today(50);
        let (decision, repair) = gate().evaluate(&record, noon()).into_parts();

        assert!(decision.allowed());
        let repair = repair.expect("repair expected");
        assert_eq!(*repair.daily_limit(), Some(100));
        assert_eq!(*repair.monthly_limit(), Some(3000));
        assert_eq!(
            decision.usage().as_ref().map(|u| *u.daily_limit()),
            Some(100)
        );
    }

    #[test]
    fn repair_is_partial_when_one_ceiling_set() {
        let record = record(10, 0, 0);
        let (_, repair) = gate().evaluate(&record, noon()).into_parts();
        let repair = repair.expect("repair expected");
        assert_eq!(*repair.daily_limit(), None);
        assert_eq!(*repair.monthly_limit(), Some(3000));
    }

    #[test]
    fn repaired_ceiling_still_enforced() {
        let record = record(0, 0, 0).with_calls_today(100);
        let check = gate().evaluate(&record, noon());
        assert_eq!(*check.decision().reason(), ReasonCode::DailyLimitExceeded);
    }
}
