//! Keyed fixed-window rate limiter.

use crate::{RatePolicy, WindowCounter};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::instrument;

/// Per-key fixed-window limiter for one traffic class.
///
/// The key map is the hottest shared state on the request path, so each
/// limiter carries its own `RwLock` and classes never contend with each
/// other. `allow` takes the write lock; `remaining` and `retry_after`
/// only read. Decisions for one key are ordered by arrival at the lock.
///
/// Window boundary effects (up to two bursts clustered at a boundary)
/// are an accepted property of fixed-window counting.
///
/// # Examples
///
/// ```
/// use tollgate_rate_limit::{RateLimiter, RatePolicy};
///
/// let limiter = RateLimiter::new(RatePolicy::new(60, 3).unwrap());
/// assert!(limiter.allow("ip1"));
/// assert!(limiter.allow("ip1"));
/// assert!(limiter.allow("ip1"));
/// assert!(!limiter.allow("ip1"));
/// assert!(limiter.allow("ip2"));
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    policy: RatePolicy,
    counters: RwLock<HashMap<String, WindowCounter>>,
}

impl RateLimiter {
    /// Create a limiter enforcing `policy` with an empty key map.
    pub fn new(policy: RatePolicy) -> Self {
        Self {
            policy,
            counters: RwLock::new(HashMap::new()),
        }
    }

    /// The policy this limiter enforces.
    pub fn policy(&self) -> &RatePolicy {
        &self.policy
    }

    /// Whether one more event for `key` fits in the current window.
    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Utc::now())
    }

    /// [`allow`](Self::allow) against an explicit clock.
    #[instrument(skip(self), level = "debug")]
    pub fn allow_at(&self, key: &str, now: DateTime<Utc>) -> bool {
        let current_window = self.policy.current_window(now);
        let mut counters = self.counters.write();

        match counters.get_mut(key) {
            None => {
                counters.insert(key.to_string(), WindowCounter::first(current_window));
                true
            }
            Some(counter) if counter.is_stale(current_window) => {
                counter.roll_over(current_window);
                true
            }
            Some(counter) if *counter.count() < *self.policy.burst() => {
                counter.increment();
                true
            }
            // Window exhausted; a denied event is not counted.
            Some(_) => false,
        }
    }

    /// Events still admissible for `key` in the current window.
    pub fn remaining(&self, key: &str) -> u32 {
        self.remaining_at(key, Utc::now())
    }

    /// [`remaining`](Self::remaining) against an explicit clock.
    ///
    /// Read-only: an unseen or rolled-over key reports the full burst
    /// without creating or resetting its counter.
    pub fn remaining_at(&self, key: &str, now: DateTime<Utc>) -> u32 {
        let current_window = self.policy.current_window(now);
        let counters = self.counters.read();

        match counters.get(key) {
            Some(counter) if !counter.is_stale(current_window) => {
                self.policy.burst().saturating_sub(*counter.count())
            }
            _ => *self.policy.burst(),
        }
    }

    /// Seconds until the current window rolls over, for Retry-After.
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        self.policy.retry_after_secs(now)
    }

    /// Remove counters whose window start is older than `cutoff`.
    ///
    /// Candidates are snapshotted under the read lock, then each one is
    /// re-checked under the write lock immediately before deletion, so a
    /// concurrent `allow_at` refreshing a key cancels its eviction.
    /// Returns the number of counters evicted.
    pub fn evict_stale(&self, cutoff: DateTime<Utc>) -> usize {
        let candidates: Vec<String> = {
            let counters = self.counters.read();
            counters
                .iter()
                .filter(|(_, counter)| *counter.window_start() < cutoff)
                .map(|(key, _)| key.clone())
                .collect()
        };

        if candidates.is_empty() {
            return 0;
        }

        let mut evicted = 0;
        let mut counters = self.counters.write();
        for key in candidates {
            let still_stale = counters
                .get(&key)
                .is_some_and(|counter| *counter.window_start() < cutoff);
            if still_stale {
                counters.remove(&key);
                evicted += 1;
            }
        }
        evicted
    }

    /// Number of tracked keys (for eviction tests and memory logging).
    pub fn key_count(&self) -> usize {
        self.counters.read().len()
    }
}
