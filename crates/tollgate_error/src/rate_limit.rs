//! Error types for rate limiting configuration.
//!
//! The limiter itself never fails a caller; these errors surface only
//! when a policy or janitor configuration is rejected at construction.

/// Error kinds for rate limiting configuration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum RateLimitErrorKind {
    /// Policy parameters are unusable (zero window or zero burst).
    #[display("Invalid policy: {}", _0)]
    InvalidPolicy(String),
    /// Janitor retention is shorter than the safe minimum.
    #[display(
        "Retention of {}s is below the safe minimum of {}s (twice the longest window)",
        retention_secs,
        required_secs
    )]
    RetentionTooShort {
        /// Configured retention in seconds
        retention_secs: u64,
        /// Minimum acceptable retention in seconds
        required_secs: u64,
    },
    /// Registry was configured with no traffic classes.
    #[display("Registry requires at least one traffic class")]
    EmptyRegistry,
}

/// Rate limiting error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Rate Limit Error: {} at line {} in {}", kind, line, file)]
pub struct RateLimitError {
    kind: RateLimitErrorKind,
    line: u32,
    file: &'static str,
}

impl RateLimitError {
    /// Create a new rate limiting error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RateLimitErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RateLimitErrorKind {
        &self.kind
    }
}

impl<T> From<T> for RateLimitError
where
    T: Into<RateLimitErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}
