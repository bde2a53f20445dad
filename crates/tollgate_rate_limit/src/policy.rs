//! Rate limit policies per traffic class.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tollgate_error::{RateLimitError, RateLimitErrorKind};

/// One traffic class's counting window and ceiling.
///
/// Distinct classes never share policy or counter state. The window is
/// fixed, not sliding: events are bucketed by truncating their arrival
/// time to the window size.
///
/// # Examples
///
/// ```
/// use tollgate_rate_limit::RatePolicy;
///
/// let policy = RatePolicy::new(60, 100).unwrap();
/// assert_eq!(*policy.window_secs(), 60);
/// assert_eq!(*policy.burst(), 100);
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_getters::Getters,
)]
pub struct RatePolicy {
    /// Length of one counting window in seconds
    window_secs: u64,
    /// Maximum events allowed per window
    burst: u32,
}

impl RatePolicy {
    /// Create a policy, rejecting zero-width windows and zero bursts.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitErrorKind::InvalidPolicy`] when either
    /// parameter is zero.
    pub fn new(window_secs: u64, burst: u32) -> Result<Self, RateLimitError> {
        if window_secs == 0 {
            return Err(RateLimitError::new(RateLimitErrorKind::InvalidPolicy(
                "window must be at least one second".to_string(),
            )));
        }
        if burst == 0 {
            return Err(RateLimitError::new(RateLimitErrorKind::InvalidPolicy(
                "burst must be positive".to_string(),
            )));
        }
        Ok(Self { window_secs, burst })
    }

    /// The window containing `now`: its start, truncated to the window
    /// size.
    pub fn current_window(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let ts = now.timestamp();
        let start = ts - ts.rem_euclid(self.window_secs as i64);
        // Truncation of a valid timestamp stays in range.
        match Utc.timestamp_opt(start, 0) {
            chrono::offset::LocalResult::Single(dt) => dt,
            _ => now,
        }
    }

    /// Seconds until the window containing `now` rolls over, at least 1.
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        let elapsed = now.timestamp().rem_euclid(self.window_secs as i64) as u64;
        (self.window_secs - elapsed).max(1)
    }

    /// The instant the window containing `now` rolls over.
    pub fn window_reset(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.current_window(now) + chrono::Duration::seconds(self.window_secs as i64)
    }

    /// Events per second this policy admits, for ranking permissiveness.
    pub fn events_per_sec(&self) -> f64 {
        self.burst as f64 / self.window_secs as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_parameters() {
        assert!(RatePolicy::new(0, 10).is_err());
        assert!(RatePolicy::new(60, 0).is_err());
        assert!(RatePolicy::new(60, 1).is_ok());
    }

    #[test]
    fn truncates_to_window_start() {
        let policy = RatePolicy::new(60, 3).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 14, 32, 41).unwrap();
        let window = policy.current_window(now);
        assert_eq!(window, Utc.with_ymd_and_hms(2025, 3, 10, 14, 32, 0).unwrap());

        // A time on the boundary is its own window start.
        assert_eq!(policy.current_window(window), window);
    }

    #[test]
    fn retry_counts_down_to_boundary() {
        let policy = RatePolicy::new(60, 3).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 14, 32, 41).unwrap();
        assert_eq!(policy.retry_after_secs(now), 19);

        // On the boundary a full window remains.
        let boundary = Utc.with_ymd_and_hms(2025, 3, 10, 14, 33, 0).unwrap();
        assert_eq!(policy.retry_after_secs(boundary), 60);
    }

    #[test]
    fn reset_is_next_boundary() {
        let policy = RatePolicy::new(60, 3).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 14, 32, 41).unwrap();
        assert_eq!(
            policy.window_reset(now),
            Utc.with_ymd_and_hms(2025, 3, 10, 14, 33, 0).unwrap()
        );
    }

    #[test]
    fn permissiveness_ranks_by_rate() {
        let tight = RatePolicy::new(60, 50).unwrap();
        let loose = RatePolicy::new(60, 200).unwrap();
        assert!(loose.events_per_sec() > tight.events_per_sec());
    }
}
