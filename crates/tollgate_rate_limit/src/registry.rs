//! Named traffic-class registry.

use crate::{RateLimiter, RatePolicy};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tollgate_error::{RateLimitError, RateLimitErrorKind};
use tracing::warn;

/// Traffic class name for chat messages.
pub const CLASS_CHAT: &str = "chat";
/// Traffic class name for authentication endpoints.
pub const CLASS_AUTH: &str = "auth";
/// Traffic class name for general browsing.
pub const CLASS_GENERAL: &str = "general";

/// Registry of named limiters, one per traffic class.
///
/// Constructed once at process start and dependency-injected into the
/// pipeline; classes never share policy or counter state. Lookups never
/// fail: an unrecognized class falls back to the most permissive
/// configured policy and logs the anomaly.
///
/// # Examples
///
/// ```
/// use tollgate_rate_limit::{CLASS_CHAT, LimiterRegistry};
///
/// let registry = LimiterRegistry::with_defaults().unwrap();
/// assert!(registry.allow(CLASS_CHAT, "ip1"));
/// assert_eq!(*registry.limiter("nonsense").policy().burst(), 200);
/// ```
#[derive(Debug)]
pub struct LimiterRegistry {
    limiters: HashMap<String, Arc<RateLimiter>>,
    fallback: Arc<RateLimiter>,
}

impl LimiterRegistry {
    /// Build a registry from named policies.
    ///
    /// The fallback for unknown class names is the configured policy
    /// admitting the highest event rate (burst over window).
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitErrorKind::EmptyRegistry`] when no classes
    /// are given.
    pub fn new(policies: HashMap<String, RatePolicy>) -> Result<Self, RateLimitError> {
        let fallback_policy = policies
            .iter()
            .max_by(|a, b| {
                a.1.events_per_sec()
                    .partial_cmp(&b.1.events_per_sec())
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.0.cmp(a.0))
            })
            .map(|(_, policy)| *policy)
            .ok_or_else(|| RateLimitError::new(RateLimitErrorKind::EmptyRegistry))?;

        let limiters: HashMap<String, Arc<RateLimiter>> = policies
            .into_iter()
            .map(|(class, policy)| (class, Arc::new(RateLimiter::new(policy))))
            .collect();

        Ok(Self {
            fallback: Arc::new(RateLimiter::new(fallback_policy)),
            limiters,
        })
    }

    /// The default classes: chat at 100/min, auth at 50/min, general at
    /// 200/min.
    pub fn with_defaults() -> Result<Self, RateLimitError> {
        let mut policies = HashMap::new();
        policies.insert(CLASS_CHAT.to_string(), RatePolicy::new(60, 100)?);
        policies.insert(CLASS_AUTH.to_string(), RatePolicy::new(60, 50)?);
        policies.insert(CLASS_GENERAL.to_string(), RatePolicy::new(60, 200)?);
        Self::new(policies)
    }

    /// The limiter for `class`, or the most permissive limiter when the
    /// class is unknown.
    pub fn limiter(&self, class: &str) -> &RateLimiter {
        match self.limiters.get(class) {
            Some(limiter) => limiter,
            None => {
                warn!(class, "Unknown traffic class, using most permissive policy");
                &self.fallback
            }
        }
    }

    /// Whether one more event for `key` fits within `class`'s window.
    pub fn allow(&self, class: &str, key: &str) -> bool {
        self.limiter(class).allow(key)
    }

    /// [`allow`](Self::allow) against an explicit clock.
    pub fn allow_at(&self, class: &str, key: &str, now: DateTime<Utc>) -> bool {
        self.limiter(class).allow_at(key, now)
    }

    /// The longest configured window, in seconds. Bounds the janitor's
    /// minimum safe retention.
    pub fn longest_window_secs(&self) -> u64 {
        self.limiters
            .values()
            .map(|limiter| *limiter.policy().window_secs())
            .max()
            .unwrap_or(0)
    }

    /// Evict stale counters across every class, including the fallback.
    /// Returns the total evicted.
    pub fn evict_stale(&self, cutoff: DateTime<Utc>) -> usize {
        let mut evicted = self.fallback.evict_stale(cutoff);
        for limiter in self.limiters.values() {
            evicted += limiter.evict_stale(cutoff);
        }
        evicted
    }

    /// Total tracked keys across every class (for memory logging).
    pub fn key_count(&self) -> usize {
        self.fallback.key_count()
            + self
                .limiters
                .values()
                .map(|limiter| limiter.key_count())
                .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn default_classes_have_distinct_policies() {
        let registry = LimiterRegistry::with_defaults().unwrap();
        assert_eq!(*registry.limiter(CLASS_CHAT).policy().burst(), 100);
        assert_eq!(*registry.limiter(CLASS_AUTH).policy().burst(), 50);
        assert_eq!(*registry.limiter(CLASS_GENERAL).policy().burst(), 200);
        assert_eq!(registry.longest_window_secs(), 60);
    }

    #[test]
    fn classes_do_not_share_counters() {
        let mut policies = HashMap::new();
        policies.insert("a".to_string(), RatePolicy::new(60, 1).unwrap());
        policies.insert("b".to_string(), RatePolicy::new(60, 1).unwrap());
        let registry = LimiterRegistry::new(policies).unwrap();

        let now = Utc.with_ymd_and_hms(2025, 3, 10, 14, 32, 5).unwrap();
        assert!(registry.allow_at("a", "ip1", now));
        assert!(!registry.allow_at("a", "ip1", now));
        assert!(registry.allow_at("b", "ip1", now));
    }

    #[test]
    fn unknown_class_uses_most_permissive() {
        let registry = LimiterRegistry::with_defaults().unwrap();
        let limiter = registry.limiter("mystery");
        assert_eq!(*limiter.policy().burst(), 200);
    }

    #[test]
    fn unknown_class_counters_are_isolated_from_real_classes() {
        let registry = LimiterRegistry::with_defaults().unwrap();
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 14, 32, 5).unwrap();
        for _ in 0..200 {
            assert!(registry.allow_at("mystery", "ip1", now));
        }
        assert!(!registry.allow_at("mystery", "ip1", now));
        assert!(registry.allow_at(CLASS_GENERAL, "ip1", now));
    }

    #[test]
    fn empty_registry_is_rejected() {
        let err = LimiterRegistry::new(HashMap::new()).unwrap_err();
        assert_eq!(*err.kind(), RateLimitErrorKind::EmptyRegistry);
    }

    #[test]
    fn eviction_spans_all_classes() {
        let registry = LimiterRegistry::with_defaults().unwrap();
        let early = Utc.with_ymd_and_hms(2025, 3, 10, 14, 0, 0).unwrap();
        registry.allow_at(CLASS_CHAT, "ip1", early);
        registry.allow_at(CLASS_AUTH, "ip1", early);
        registry.allow_at("mystery", "ip2", early);
        assert_eq!(registry.key_count(), 3);

        let cutoff = Utc.with_ymd_and_hms(2025, 3, 10, 14, 30, 0).unwrap();
        assert_eq!(registry.evict_stale(cutoff), 3);
        assert_eq!(registry.key_count(), 0);
    }
}
