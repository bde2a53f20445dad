//! Safe default ceilings for unconfigured tenants.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Environment variable overriding the default daily call ceiling.
pub const ENV_DAILY_LIMIT: &str = "DEFAULT_DAILY_LIMIT";
/// Environment variable overriding the default monthly call ceiling.
pub const ENV_MONTHLY_LIMIT: &str = "DEFAULT_MONTHLY_LIMIT";
/// Environment variable overriding the default monthly token budget.
pub const ENV_MONTHLY_TOKEN_LIMIT: &str = "DEFAULT_MONTHLY_TOKEN_LIMIT";

const DAILY_LIMIT: u64 = 100;
const MONTHLY_LIMIT: u64 = 3000;
const MONTHLY_TOKEN_LIMIT: u64 = 100_000;

/// Ceilings written into tenant records whose limits read zero.
///
/// A zero ceiling means "never configured", not "nothing allowed"; the
/// quota gate and the maintenance repair pass both substitute these
/// values so an unconfigured tenant is never silently blocked.
///
/// # Examples
///
/// ```
/// use tollgate_ledger::QuotaDefaults;
///
/// let defaults = QuotaDefaults::default();
/// assert_eq!(*defaults.daily_limit(), 100);
/// assert_eq!(*defaults.monthly_limit(), 3000);
/// assert_eq!(*defaults.monthly_token_limit(), 100_000);
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_new::new,
    derive_builder::Builder,
)]
#[serde(default)]
pub struct QuotaDefaults {
    /// Daily call ceiling
    #[builder(default = "DAILY_LIMIT")]
    daily_limit: u64,
    /// Monthly call ceiling
    #[builder(default = "MONTHLY_LIMIT")]
    monthly_limit: u64,
    /// Monthly token budget
    #[builder(default = "MONTHLY_TOKEN_LIMIT")]
    monthly_token_limit: u64,
}

impl Default for QuotaDefaults {
    fn default() -> Self {
        Self {
            daily_limit: DAILY_LIMIT,
            monthly_limit: MONTHLY_LIMIT,
            monthly_token_limit: MONTHLY_TOKEN_LIMIT,
        }
    }
}

impl QuotaDefaults {
    /// Defaults with environment overrides applied.
    ///
    /// Each override parses as an unsigned integer; an unset or
    /// unparsable value falls back to the hardcoded default with a
    /// warning.
    pub fn from_env() -> Self {
        Self {
            daily_limit: env_limit(ENV_DAILY_LIMIT, DAILY_LIMIT),
            monthly_limit: env_limit(ENV_MONTHLY_LIMIT, MONTHLY_LIMIT),
            monthly_token_limit: env_limit(ENV_MONTHLY_TOKEN_LIMIT, MONTHLY_TOKEN_LIMIT),
        }
    }
}

fn env_limit(name: &str, fallback: u64) -> u64 {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(value) if value > 0 => value,
            _ => {
                warn!(name, raw, fallback, "Unusable limit override, using default");
                fallback
            }
        },
        Err(_) => fallback,
    }
}
