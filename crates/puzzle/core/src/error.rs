//! Common error infrastructure for puzzle-core.
//!
//! Domain errors ([`crate::DefinitionError`], [`crate::ValidationError`]) live
//! next to the operations that raise them and implement [`PuzzleError`] so the
//! runtime can classify them uniformly.

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: may succeed on retry
/// - **Validation**: invalid input, reject without retry
/// - **Internal**: unexpected inconsistency that needs investigation
/// - **Fatal**: cannot continue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    Recoverable,
    Validation,
    Internal,
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }
}

/// Common trait for all puzzle-core errors.
pub trait PuzzleError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static identifier for this error variant.
    ///
    /// Useful for metrics and for matching in tests.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
