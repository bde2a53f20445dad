//! Quota ledger and subscription gate for the Tollgate library.
//!
//! Both gates are pure evaluations over a loaded [`TenantRecord`]
//! (re-exported from `tollgate_interface` by the facade): the quota
//! gate checks counters against ceilings and reports any repairs for
//! unconfigured records, the subscription gate checks lifecycle status
//! and expiry. Persisting repairs and applying usage increments is the
//! pipeline's job through the store traits.

mod boundary;
mod cost;
mod defaults;
mod quota;
mod subscription;

pub use boundary::{daily_cutoff, monthly_cutoff, next_daily_reset, next_monthly_reset};
pub use cost::usage_delta;
pub use defaults::{
    ENV_DAILY_LIMIT, ENV_MONTHLY_LIMIT, ENV_MONTHLY_TOKEN_LIMIT, QuotaDefaults,
    QuotaDefaultsBuilder,
};
pub use quota::{LimitRepair, QuotaCheck, QuotaGate};
pub use subscription::SubscriptionGate;
