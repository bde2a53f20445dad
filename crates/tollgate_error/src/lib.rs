//! Error types for the Tollgate library.
//!
//! This crate provides the foundation error types used throughout the
//! tollgate workspace. Each domain defines a kind enum plus an error
//! struct carrying the source location of the failure; the crate-level
//! [`TollgateError`] unifies them for callers that cross domain seams.
//!
//! Denied admissions are not errors. They travel as first-class decision
//! values in `tollgate_core`; the types here cover storage failures,
//! rejected configuration, and malformed input.

mod admission;
mod config;
mod rate_limit;
mod store;
mod tenant;

pub use admission::{AdmissionError, AdmissionErrorKind};
pub use config::ConfigError;
pub use rate_limit::{RateLimitError, RateLimitErrorKind};
pub use store::{StoreError, StoreErrorKind};
pub use tenant::{TenantError, TenantErrorKind};

/// Crate-level error variants.
#[derive(Debug, derive_more::From)]
pub enum TollgateErrorKind {
    /// Tenant identity or record validation error
    Tenant(TenantError),
    /// Backing store error
    Store(StoreError),
    /// Rate limiting configuration error
    RateLimit(RateLimitError),
    /// Admission pipeline error
    Admission(AdmissionError),
    /// Configuration error
    Config(ConfigError),
}

impl std::fmt::Display for TollgateErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TollgateErrorKind::Tenant(e) => write!(f, "{}", e),
            TollgateErrorKind::Store(e) => write!(f, "{}", e),
            TollgateErrorKind::RateLimit(e) => write!(f, "{}", e),
            TollgateErrorKind::Admission(e) => write!(f, "{}", e),
            TollgateErrorKind::Config(e) => write!(f, "{}", e),
        }
    }
}

/// Tollgate error with kind discrimination.
#[derive(Debug)]
pub struct TollgateError(Box<TollgateErrorKind>);

impl TollgateError {
    /// Create a new error from a kind.
    pub fn new(kind: TollgateErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &TollgateErrorKind {
        &self.0
    }
}

impl std::fmt::Display for TollgateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tollgate Error: {}", self.0)
    }
}

impl std::error::Error for TollgateError {}

// Generic From implementation for any type that converts to TollgateErrorKind
impl<T> From<T> for TollgateError
where
    T: Into<TollgateErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Tollgate operations.
pub type TollgateResult<T> = std::result::Result<T, TollgateError>;
