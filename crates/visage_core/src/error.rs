//! Error types for visage_core.

use miette::Diagnostic;
use thiserror::Error;

/// Result type for core gateway operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors produced by the codec when turning a transport payload into image
/// bytes.
///
/// Kept separate from [`CoreError`] so callers can tell a bad upload apart
/// from a verification failure; the two must never be conflated in responses.
#[derive(Debug, Error, Diagnostic)]
pub enum CodecError {
    /// The payload was empty (or only a data-URI prefix).
    #[error("image payload is empty")]
    #[diagnostic(code(visage_core::codec::empty_payload))]
    EmptyPayload,

    /// The payload was not valid base64.
    #[error("image payload is not valid base64: {0}")]
    #[diagnostic(code(visage_core::codec::invalid_encoding))]
    InvalidEncoding(#[from] base64::DecodeError),

    /// The payload decoded to zero bytes.
    #[error("image payload decoded to zero bytes")]
    #[diagnostic(code(visage_core::codec::empty_image))]
    EmptyImage,

    /// The decoded bytes are not a readable image.
    #[error("decoded payload is not a readable image: {0}")]
    #[diagnostic(code(visage_core::codec::unreadable_image))]
    UnreadableImage(#[from] image::ImageError),
}

/// Errors that can occur in the credential store, session store, and
/// verification pipeline.
#[derive(Debug, Error, Diagnostic)]
pub enum CoreError {
    /// Database error from sqlx.
    #[error("Database error: {0}")]
    #[diagnostic(code(visage_core::database))]
    Database(#[from] sqlx::Error),

    /// Migration error.
    #[error("Migration error: {0}")]
    #[diagnostic(code(visage_core::migration))]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// IO error (artifact staging, reference materialization).
    #[error("IO error: {0}")]
    #[diagnostic(code(visage_core::io))]
    Io(#[from] std::io::Error),

    /// Bad image payload.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Codec(#[from] CodecError),

    /// Username already registered.
    #[error("username already taken: {username}")]
    #[diagnostic(code(visage_core::duplicate_username))]
    DuplicateUsername { username: String },

    /// No account matches the claimed identity.
    #[error("no account found for username: {username}")]
    #[diagnostic(code(visage_core::account_not_found))]
    AccountNotFound { username: String },

    /// The account exists but carries no face credential.
    ///
    /// Registration creates the pair atomically, so this should not occur;
    /// lookup still reports it distinctly rather than crashing or silently
    /// succeeding.
    #[error("account has no enrolled face credential: {username}")]
    #[diagnostic(code(visage_core::not_enrolled))]
    NotEnrolled { username: String },

    /// Session token did not resolve to an active session.
    #[error("session not found")]
    #[diagnostic(code(visage_core::session_not_found))]
    SessionNotFound,
}

impl CoreError {
    /// Create a duplicate-username error.
    pub fn duplicate_username(username: impl Into<String>) -> Self {
        Self::DuplicateUsername {
            username: username.into(),
        }
    }

    /// Create an account-not-found error.
    pub fn account_not_found(username: impl Into<String>) -> Self {
        Self::AccountNotFound {
            username: username.into(),
        }
    }

    /// Create a not-enrolled error.
    pub fn not_enrolled(username: impl Into<String>) -> Self {
        Self::NotEnrolled {
            username: username.into(),
        }
    }
}
