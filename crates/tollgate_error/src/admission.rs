//! Admission pipeline error types.

/// Kinds of admission pipeline errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum AdmissionErrorKind {
    /// Maintenance schedule expression did not parse
    #[display("Invalid schedule: {}", _0)]
    Schedule(String),
}

/// Admission error with location tracking.
///
/// # Examples
///
/// ```
/// use tollgate_error::{AdmissionError, AdmissionErrorKind};
///
/// let err = AdmissionError::new(AdmissionErrorKind::Schedule("bad cron".to_string()));
/// assert!(format!("{}", err).contains("Invalid schedule"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Admission Error: {} at line {} in {}", kind, line, file)]
pub struct AdmissionError {
    kind: AdmissionErrorKind,
    line: u32,
    file: &'static str,
}

impl AdmissionError {
    /// Create a new admission error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: AdmissionErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &AdmissionErrorKind {
        &self.kind
    }
}

impl<T> From<T> for AdmissionError
where
    T: Into<AdmissionErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}
