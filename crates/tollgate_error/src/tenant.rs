//! Tenant identity and record error types.

/// Kinds of tenant validation errors.
///
/// These are programmer errors in the sense of the admission contract:
/// a malformed tenant identifier is rejected before any lock is taken or
/// counter touched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum TenantErrorKind {
    /// Tenant identifier is empty
    #[display("Tenant id is empty")]
    EmptyId,
    /// Tenant identifier exceeds the maximum length
    #[display("Tenant id is {} characters, maximum is {}", length, max)]
    IdTooLong {
        /// Observed length
        length: usize,
        /// Maximum permitted length
        max: usize,
    },
    /// Tenant identifier contains a character outside `[A-Za-z0-9_-]`
    #[display("Tenant id contains invalid character '{}'", _0)]
    InvalidCharacter(char),
}

/// Tenant error with location tracking.
///
/// # Examples
///
/// ```
/// use tollgate_error::{TenantError, TenantErrorKind};
///
/// let err = TenantError::new(TenantErrorKind::EmptyId);
/// assert!(format!("{}", err).contains("empty"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Tenant Error: {} at line {} in {}", kind, line, file)]
pub struct TenantError {
    kind: TenantErrorKind,
    line: u32,
    file: &'static str,
}

impl TenantError {
    /// Create a new tenant error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: TenantErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &TenantErrorKind {
        &self.kind
    }
}

impl<T> From<T> for TenantError
where
    T: Into<TenantErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}
