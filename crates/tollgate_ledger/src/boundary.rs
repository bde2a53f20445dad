//! Calendar boundaries for quota resets.

use chrono::{DateTime, Datelike, Duration, Months, TimeZone, Utc};

/// Start of the next UTC calendar day after `now`.
pub fn next_daily_reset(now: DateTime<Utc>) -> DateTime<Utc> {
    let tomorrow = now.date_naive() + Duration::days(1);
    Utc.from_utc_datetime(&tomorrow.and_hms_opt(0, 0, 0).unwrap_or_default())
}

/// First instant of the next UTC calendar month after `now`.
pub fn next_monthly_reset(now: DateTime<Utc>) -> DateTime<Utc> {
    let first_of_month = now
        .date_naive()
        .with_day(1)
        .unwrap_or_else(|| now.date_naive());
    let next_month = first_of_month + Months::new(1);
    Utc.from_utc_datetime(&next_month.and_hms_opt(0, 0, 0).unwrap_or_default())
}

/// Cutoff for the daily reset pass: records stamped before this are due.
pub fn daily_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(1)
}

/// Cutoff for the monthly reset pass.
///
/// One calendar month back; for "now" dates whose day has no
/// counterpart in the prior month, chrono clamps to its last day.
pub fn monthly_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(1)).unwrap_or(now)
}
