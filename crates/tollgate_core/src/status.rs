//! Subscription lifecycle states.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a tenant subscription.
///
/// `Active` is necessary but not sufficient for admission: the expiry
/// date is checked independently, so a tenant whose maintenance
/// reconciliation has not yet run is still denied once past expiry.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SubscriptionStatus {
    /// Subscription is in good standing
    #[default]
    Active,
    /// Subscription term has ended
    Expired,
    /// Account suspended by the operator
    Suspended,
    /// Account provisioned but not activated
    Inactive,
}

impl SubscriptionStatus {
    /// True only for [`SubscriptionStatus::Active`].
    pub fn is_active(&self) -> bool {
        matches!(self, SubscriptionStatus::Active)
    }
}
