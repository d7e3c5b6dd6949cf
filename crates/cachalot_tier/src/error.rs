// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for cache operations.

use std::fmt::{self, Display};

use recoverable::{Recovery, RecoveryInfo};

/// Classifies what went wrong in a cache operation.
///
/// Handles report the first four kinds. The manager normalizes them: retryable
/// failures that outlast the retry policy surface as [`ErrorKind::HandleUnavailable`],
/// everything else passes through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The backing store of a handle could not be reached.
    Unavailable,
    /// A single handle operation timed out.
    Timeout,
    /// A value could not be encoded or decoded for a networked store.
    Serialization,
    /// The key or region is malformed.
    InvalidKey,
    /// A handle stayed unreachable after the retry policy gave up.
    HandleUnavailable,
    /// The manager configuration is malformed.
    Configuration,
    /// A caller-supplied deadline elapsed before the operation finished.
    DeadlineExceeded,
    /// An invalidation message could not be handed to the backplane.
    BackplaneDelivery,
    /// Any other failure reported by a handle.
    Other,
}

impl ErrorKind {
    /// Returns a stable, lowercase name for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::Timeout => "timeout",
            Self::Serialization => "serialization",
            Self::InvalidKey => "invalid_key",
            Self::HandleUnavailable => "handle_unavailable",
            Self::Configuration => "configuration",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::BackplaneDelivery => "backplane_delivery",
            Self::Other => "other",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error from a cache operation.
///
/// The [`kind`](Error::kind) tells callers how to react; the underlying cause
/// is available through [`std::error::Error::source()`].
///
/// # Example
///
/// ```
/// use cachalot_tier::{Error, ErrorKind};
///
/// let error = Error::with_kind(ErrorKind::Unavailable, "connection refused");
/// assert_eq!(error.kind(), ErrorKind::Unavailable);
/// assert!(error.is_retryable());
/// ```
#[ohno::error]
#[display("cache operation failed: {kind}")]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    /// Creates an error of `kind` with the given cause.
    pub fn with_kind(kind: ErrorKind, cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(kind, cause)
    }

    /// Creates an error of `kind` without a cause.
    #[must_use]
    pub fn of_kind(kind: ErrorKind) -> Self {
        Self::new(kind)
    }

    /// Creates an [`ErrorKind::Other`] error from any error-like cause.
    ///
    /// This is the entry point for handle implementations in external crates
    /// that do not need a more specific kind.
    pub fn from_message(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Other, cause)
    }

    /// Creates an [`ErrorKind::Unavailable`] error.
    pub fn unavailable(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Unavailable, cause)
    }

    /// Creates an [`ErrorKind::Serialization`] error.
    pub fn serialization(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Serialization, cause)
    }

    /// Returns the kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns `true` when retrying the failed operation may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, ErrorKind::Unavailable | ErrorKind::Timeout)
    }
}

impl Recovery for Error {
    fn recovery(&self) -> RecoveryInfo {
        if self.is_retryable() {
            RecoveryInfo::retry()
        } else {
            RecoveryInfo::never()
        }
    }
}

/// A specialized [`Result`] type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use recoverable::RecoveryKind;

    use super::*;

    #[test]
    fn error_display_contains_kind_and_cause() {
        let error = Error::caused_by(ErrorKind::Serialization, "bad payload");
        let display = format!("{error}");
        assert!(display.contains("serialization"), "got: {display}");
        assert!(display.contains("bad payload"), "got: {display}");
    }

    #[test]
    fn transient_kinds_are_retryable() {
        assert_eq!(Error::unavailable("down").recovery().kind(), RecoveryKind::Retry);
        assert_eq!(Error::new(ErrorKind::Timeout).recovery().kind(), RecoveryKind::Retry);
    }

    #[test]
    fn permanent_kinds_are_not_retryable() {
        for kind in [
            ErrorKind::Serialization,
            ErrorKind::InvalidKey,
            ErrorKind::HandleUnavailable,
            ErrorKind::Configuration,
            ErrorKind::DeadlineExceeded,
            ErrorKind::BackplaneDelivery,
            ErrorKind::Other,
        ] {
            let error = Error::new(kind);
            assert!(!error.is_retryable(), "{kind} should not be retryable");
            assert_eq!(error.recovery().kind(), RecoveryKind::Never);
        }
    }

    #[test]
    fn public_constructors_keep_kind() {
        assert_eq!(Error::of_kind(ErrorKind::Configuration).kind(), ErrorKind::Configuration);
        let error = Error::with_kind(ErrorKind::HandleUnavailable, Error::unavailable("down"));
        assert_eq!(error.kind(), ErrorKind::HandleUnavailable);
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn from_message_is_other() {
        assert_eq!(Error::from_message("boom").kind(), ErrorKind::Other);
    }

    #[test]
    fn result_type_alias_propagates_errors() {
        fn returns_err() -> Result<i32> {
            Err(Error::serialization("expected failure"))
        }

        let err = returns_err().expect_err("should return an error");
        assert!(format!("{err}").contains("expected failure"));
    }
}
