//! Background eviction of stale per-key counters.

use crate::LimiterRegistry;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tollgate_error::{RateLimitError, RateLimitErrorKind};
use tracing::{debug, info, instrument};

/// Default seconds between eviction sweeps.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Default seconds a counter may sit idle before eviction.
pub const DEFAULT_RETENTION_SECS: u64 = 600;

/// Periodic sweep bounding limiter memory under high key cardinality.
///
/// Each sweep evicts counters whose window started more than the
/// retention ago. Eviction takes the same per-limiter locks as request
/// lookups, so a sweep never deletes a key a concurrent `allow` just
/// refreshed.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use tollgate_rate_limit::{Janitor, LimiterRegistry};
///
/// let registry = Arc::new(LimiterRegistry::with_defaults().unwrap());
/// let janitor = Janitor::new(registry, 300, 600).unwrap();
/// assert_eq!(janitor.sweep(), 0);
/// ```
#[derive(Debug)]
pub struct Janitor {
    registry: Arc<LimiterRegistry>,
    sweep_interval: Duration,
    retention: ChronoDuration,
    shutdown: Arc<Notify>,
}

impl Janitor {
    /// Create a janitor for `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitErrorKind::RetentionTooShort`] when the
    /// retention is under twice the longest configured window, which
    /// would let a sweep evict counters still inside a live window.
    pub fn new(
        registry: Arc<LimiterRegistry>,
        sweep_interval_secs: u64,
        retention_secs: u64,
    ) -> Result<Self, RateLimitError> {
        let required_secs = registry.longest_window_secs() * 2;
        if retention_secs < required_secs {
            return Err(RateLimitError::new(RateLimitErrorKind::RetentionTooShort {
                retention_secs,
                required_secs,
            }));
        }
        Ok(Self {
            registry,
            sweep_interval: Duration::from_secs(sweep_interval_secs),
            retention: ChronoDuration::seconds(retention_secs as i64),
            shutdown: Arc::new(Notify::new()),
        })
    }

    /// A janitor with the default sweep interval and retention.
    pub fn with_defaults(registry: Arc<LimiterRegistry>) -> Result<Self, RateLimitError> {
        Self::new(
            registry,
            DEFAULT_SWEEP_INTERVAL_SECS,
            DEFAULT_RETENTION_SECS,
        )
    }

    /// Run one sweep now, returning the number of counters evicted.
    #[instrument(skip(self))]
    pub fn sweep(&self) -> usize {
        let cutoff = Utc::now() - self.retention;
        let evicted = self.registry.evict_stale(cutoff);
        if evicted > 0 {
            debug!(
                evicted,
                remaining_keys = self.registry.key_count(),
                "Evicted stale rate limit counters"
            );
        }
        evicted
    }

    /// Handle for requesting shutdown of a spawned janitor task.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    /// Spawn the sweep loop on the current runtime.
    ///
    /// The task sweeps every interval until the shutdown handle is
    /// notified, then runs one final sweep and exits.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                interval_secs = self.sweep_interval.as_secs(),
                retention_secs = self.retention.num_seconds(),
                "Rate limit janitor started"
            );
            let mut ticker = tokio::time::interval(self.sweep_interval);
            // The first tick fires immediately; skip it.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.sweep();
                    }
                    _ = self.shutdown.notified() => {
                        self.sweep();
                        info!("Rate limit janitor shutting down");
                        break;
                    }
                }
            }
        })
    }
}
