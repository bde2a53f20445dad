//! Storage error types.
//!
//! The admission pipeline classifies these at the quota and subscription
//! seams: any store failure there denies the request (fail closed), while
//! the in-process rate limiter has no store dependency and stays
//! available (fail open).

/// Kinds of storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StoreErrorKind {
    /// No record exists for the tenant
    #[display("Tenant not found: {}", _0)]
    NotFound(String),
    /// Backing store cannot be reached
    #[display("Store unavailable: {}", _0)]
    Unavailable(String),
    /// A store round trip exceeded its deadline
    #[display("Store operation '{}' timed out after {}s", operation, after_secs)]
    Timeout {
        /// Operation that timed out
        operation: String,
        /// Deadline in seconds
        after_secs: u64,
    },
    /// Generic store error with message
    #[display("{}", _0)]
    Other(String),
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use tollgate_error::{StoreError, StoreErrorKind};
///
/// let err = StoreError::new(StoreErrorKind::NotFound("t1".to_string()));
/// assert!(format!("{}", err).contains("not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Store Error: {} at line {} in {}", kind, line, file)]
pub struct StoreError {
    kind: StoreErrorKind,
    line: u32,
    file: &'static str,
}

impl StoreError {
    /// Create a new store error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StoreErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &StoreErrorKind {
        &self.kind
    }

    /// True when no record exists for the tenant.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, StoreErrorKind::NotFound(_))
    }

    /// True for transient failures (unreachable store or deadline).
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind,
            StoreErrorKind::Unavailable(_) | StoreErrorKind::Timeout { .. }
        )
    }
}

impl<T> From<T> for StoreError
where
    T: Into<StoreErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}
