use std::error::Error as StdError;

use thiserror::Error;

/// Broad split used by hosts to decide how to present a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// A fault of the environment or of vaultbox itself. Not proof that
    /// the user did everything right - merely that the failure cannot
    /// be attributed to the input that was given.
    Internal,

    /// The user provided invalid input or performed an action that is
    /// unsupported or impossible to complete.
    User,
}

/// Failure taxonomy surfaced by every fallible vaultbox operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The password violates policy (currently: it is empty). Detected
    /// before any key derivation is attempted.
    InvalidPassword,
    /// The input is not a container this build can read: bad magic,
    /// unsupported version, truncated or oversized fields, or trailing
    /// bytes after the payload.
    MalformedContainer,
    /// The authentication tag did not verify. Covers both a wrong
    /// password and tampered or corrupted data; the two are
    /// deliberately indistinguishable from the error.
    AuthenticationFailed,
    /// I/O or other faults from the hosting environment.
    UnexpectedFailure,
}

/// Error type for all vaultbox operations.
#[derive(Debug, Error)]
#[error("{msg}")]
pub struct VaultError {
    /// Taxonomy tag, always present. Consumers branch on this.
    pub kind: ErrorKind,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl VaultError {
    /// Creates a new error with a kind and display message.
    pub fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that retains the originating source error.
    pub fn with_source(
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// The user-facing message carried by the error. Never contains
    /// password bytes or derived key material.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Maps the kind onto the user/internal split.
    pub fn category(&self) -> ErrorCategory {
        match self.kind {
            ErrorKind::UnexpectedFailure => ErrorCategory::Internal,
            ErrorKind::InvalidPassword
            | ErrorKind::MalformedContainer
            | ErrorKind::AuthenticationFailed => ErrorCategory::User,
        }
    }

    /// Returns the preserved source error if present.
    pub fn source_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Wraps the current error with a higher-level message while
    /// preserving the kind and keeping the original as source.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let kind = self.kind;
        Self {
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, VaultError>;
