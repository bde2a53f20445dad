//! Validated tenant identity.

use serde::{Deserialize, Serialize};
use tollgate_error::{TenantError, TenantErrorKind};

/// Maximum accepted length of a tenant identifier.
pub const MAX_TENANT_ID_LEN: usize = 64;

/// Identifier of an isolated customer configuration.
///
/// Construction validates the identifier, so a malformed id is rejected
/// before any limiter lock is taken or counter touched. Accepted
/// characters are ASCII alphanumerics, `-` and `_`.
///
/// # Examples
///
/// ```
/// use tollgate_core::TenantId;
///
/// let id = TenantId::new("tenant-42").unwrap();
/// assert_eq!(id.as_str(), "tenant-42");
///
/// assert!(TenantId::new("").is_err());
/// assert!(TenantId::new("bad id").is_err());
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(try_from = "String", into = "String")]
#[display("{}", _0)]
pub struct TenantId(String);

impl TenantId {
    /// Create a validated tenant identifier.
    ///
    /// # Errors
    ///
    /// Returns a [`TenantError`] when the id is empty, longer than
    /// [`MAX_TENANT_ID_LEN`], or contains characters outside
    /// `[A-Za-z0-9_-]`.
    pub fn new(id: impl Into<String>) -> Result<Self, TenantError> {
        let id = id.into();
        if id.is_empty() {
            return Err(TenantError::new(TenantErrorKind::EmptyId));
        }
        if id.len() > MAX_TENANT_ID_LEN {
            return Err(TenantError::new(TenantErrorKind::IdTooLong {
                length: id.len(),
                max: MAX_TENANT_ID_LEN,
            }));
        }
        if let Some(c) = id
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && *c != '-' && *c != '_')
        {
            return Err(TenantError::new(TenantErrorKind::InvalidCharacter(c)));
        }
        Ok(Self(id))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TenantId {
    type Error = TenantError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for TenantId {
    type Error = TenantError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl std::str::FromStr for TenantId {
    type Err = TenantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<TenantId> for String {
    fn from(id: TenantId) -> Self {
        id.0
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
