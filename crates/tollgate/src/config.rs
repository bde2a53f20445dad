//! Configuration for the tollgated binary.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tollgate_admission::{DEFAULT_QUEUE_CAPACITY, MaintenancePlan, StoreTimeouts};
use tollgate_error::ConfigError;
use tollgate_ledger::QuotaDefaults;
use tollgate_rate_limit::{
    DEFAULT_RETENTION_SECS, DEFAULT_SWEEP_INTERVAL_SECS, LimiterRegistry, RatePolicy,
};

/// One traffic class's policy as configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassConfig {
    /// Length of one counting window in seconds
    pub window_secs: u64,
    /// Maximum events allowed per window
    pub burst: u32,
}

/// Janitor settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JanitorConfig {
    /// Seconds between eviction sweeps
    pub sweep_interval_secs: u64,
    /// Seconds a counter may sit idle before eviction
    pub retention_secs: u64,
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            retention_secs: DEFAULT_RETENTION_SECS,
        }
    }
}

/// Store deadlines in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for store reads
    pub read_secs: u64,
    /// Deadline for store writes
    pub write_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read_secs: 5,
            write_secs: 5,
        }
    }
}

impl From<TimeoutConfig> for StoreTimeouts {
    fn from(config: TimeoutConfig) -> Self {
        StoreTimeouts::new(config.read_secs, config.write_secs)
    }
}

/// Top-level configuration loaded from a TOML file.
///
/// Every section has defaults, so an empty file configures the stock
/// engine: chat/auth/general classes, five-minute janitor sweeps, 5s
/// store deadlines, and the standard maintenance cadence. Quota
/// defaults additionally honor their environment overrides when the
/// file leaves them unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TollgateConfig {
    /// Rate policies per traffic class; empty means the stock classes
    pub classes: HashMap<String, ClassConfig>,
    /// Janitor settings
    pub janitor: JanitorConfig,
    /// Store deadlines
    pub timeouts: TimeoutConfig,
    /// Capacity of the usage-recorder queue
    pub recorder_capacity: usize,
    /// Ceilings for unconfigured tenants
    pub quota: Option<QuotaDefaults>,
    /// Maintenance schedules
    pub maintenance: MaintenancePlan,
}

impl Default for TollgateConfig {
    fn default() -> Self {
        Self {
            classes: HashMap::new(),
            janitor: JanitorConfig::default(),
            timeouts: TimeoutConfig::default(),
            recorder_capacity: DEFAULT_QUEUE_CAPACITY,
            quota: None,
            maintenance: MaintenancePlan::default(),
        }
    }
}

impl TollgateConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or the TOML
    /// is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::new(format!("{}: {e}", path.display())))?;
        toml::from_str(&contents)
            .map_err(|e| ConfigError::new(format!("{}: {e}", path.display())))
    }

    /// Quota defaults from the file, or the environment-overridable
    /// stock defaults.
    pub fn quota_defaults(&self) -> QuotaDefaults {
        self.quota.unwrap_or_else(QuotaDefaults::from_env)
    }

    /// Build the limiter registry from the configured classes.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an unusable policy (zero window or
    /// burst).
    pub fn build_registry(&self) -> Result<LimiterRegistry, ConfigError> {
        if self.classes.is_empty() {
            return LimiterRegistry::with_defaults()
                .map_err(|e| ConfigError::new(e.to_string()));
        }
        let mut policies = HashMap::new();
        for (class, config) in &self.classes {
            let policy = RatePolicy::new(config.window_secs, config.burst)
                .map_err(|e| ConfigError::new(format!("class '{class}': {e}")))?;
            policies.insert(class.clone(), policy);
        }
        LimiterRegistry::new(policies).map_err(|e| ConfigError::new(e.to_string()))
    }
}
