//! Unified error handling for mentord.
//!
//! Command handlers return [`CommandError`]; the dispatcher turns every
//! failure into an out-of-band `message` banner plus a `false` ack, so no
//! error ever reaches the transport layer. Fatal variants additionally tear
//! the connection down.

use crate::store::StoreError;
use thiserror::Error;

/// Errors that can occur during command handling.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The client frame carried no usable completion callback (`seq`).
    #[error("a completion callback is required for this command")]
    NoCallback,

    /// The payload failed structural validation.
    #[error("invalid payload: {0}")]
    BadPayload(String),

    /// The caller lacks permission for the target entity.
    #[error("{0}")]
    Denied(String),

    /// A referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The persistence gateway failed; the operation was aborted.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// A malformed relationship record was found and removed.
    #[error("{0}")]
    Corrupt(String),

    /// The session's own user snapshot could not be refreshed; the
    /// connection must be closed.
    #[error("session error: {0}")]
    Fatal(String),
}

impl CommandError {
    /// Stable error code for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoCallback => "no_callback",
            Self::BadPayload(_) => "bad_payload",
            Self::Denied(_) => "denied",
            Self::NotFound(_) => "not_found",
            Self::Storage(_) => "storage",
            Self::Corrupt(_) => "corrupt",
            Self::Fatal(_) => "fatal",
        }
    }

    /// Banner title shown to the client.
    pub fn title(&self) -> &'static str {
        match self {
            Self::NoCallback | Self::BadPayload(_) => "Invalid request",
            Self::Denied(_) => "Not allowed",
            Self::NotFound(_) => "Not found",
            Self::Storage(_) => "Server error",
            Self::Corrupt(_) => "Inconsistent data",
            Self::Fatal(_) => "Session error",
        }
    }

    /// Whether this error forces a disconnect after the banner.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    /// Shorthand for a structural-validation failure.
    pub fn bad_payload(msg: impl Into<String>) -> Self {
        Self::BadPayload(msg.into())
    }

    /// Shorthand for an authorization failure.
    pub fn denied(msg: impl Into<String>) -> Self {
        Self::Denied(msg.into())
    }

    /// Shorthand for a missing entity.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

/// Result type for command handlers.
pub type CommandResult<T> = Result<T, CommandError>;
