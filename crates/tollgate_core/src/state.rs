//! Pipeline stage tracking.

use serde::{Deserialize, Serialize};

/// Progress of one inbound message through the admission stages.
///
/// Stages run in a fixed order and the first failure is terminal, so a
/// denied message reports exactly one reason. The state is recorded on
/// tracing spans rather than returned to callers.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AdmissionState {
    /// Message accepted for evaluation
    Received,
    /// Rate limiter consulted
    RateChecked,
    /// Subscription gate consulted
    SubscriptionChecked,
    /// Quota ledger consulted
    QuotaChecked,
    /// All stages passed
    Admitted,
    /// A stage denied the message
    Denied,
}

impl AdmissionState {
    /// True for the two terminal states.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AdmissionState::Admitted | AdmissionState::Denied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_screaming_snake_case() {
        assert_eq!(AdmissionState::Received.to_string(), "RECEIVED");
        assert_eq!(AdmissionState::RateChecked.to_string(), "RATE_CHECKED");
        assert_eq!(
            AdmissionState::SubscriptionChecked.to_string(),
            "SUBSCRIPTION_CHECKED"
        );
    }

    #[test]
    fn terminal_states() {
        assert!(AdmissionState::Admitted.is_terminal());
        assert!(AdmissionState::Denied.is_terminal());
        assert!(!AdmissionState::QuotaChecked.is_terminal());
    }
}
