//! Server error types and their mapping to wire responses.
//!
//! Every externally reachable failure terminates in a well-formed
//! [`ApiResponse`] body; nothing propagates a raw fault or stack trace past
//! the handlers. Public messages are deliberately coarser than what gets
//! logged: the full error (with identity and stage context) goes to tracing,
//! the caller sees a bounded set of human-readable messages.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use miette::Diagnostic;
use thiserror::Error;
use tracing::{error, warn};
use visage_api::ApiResponse;
use visage_core::CoreError;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error, Diagnostic)]
pub enum ServerError {
    /// Missing or malformed request fields, rejected at the boundary.
    #[error("validation failed: {message}")]
    #[diagnostic(code(visage_server::validation))]
    Validation { message: String },

    /// Password hashing primitive failed (treated as an internal fault).
    #[error("password hashing failed: {0}")]
    #[diagnostic(code(visage_server::password_hash))]
    PasswordHash(String),

    /// Error from the core pipeline.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] CoreError),
}

impl ServerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// The message the caller is allowed to see.
    fn public_message(&self) -> String {
        match self {
            Self::Validation { message } => message.clone(),
            Self::PasswordHash(_) => "An error occurred. Please try again.".to_string(),
            Self::Core(core) => match core {
                CoreError::Codec(_) => "Invalid image data".to_string(),
                CoreError::DuplicateUsername { .. } => "Username already taken".to_string(),
                CoreError::AccountNotFound { .. } => "User does not exist".to_string(),
                CoreError::NotEnrolled { .. } => "Login entry not found".to_string(),
                CoreError::SessionNotFound => "Authentication required".to_string(),
                // Unexpected persistence failures stay generic.
                CoreError::Database(_) | CoreError::Migration(_) | CoreError::Io(_) => {
                    "An error occurred. Please try again.".to_string()
                }
            },
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Core(
                CoreError::Database(_) | CoreError::Migration(_) | CoreError::Io(_),
            ) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Core(CoreError::SessionNotFound) => StatusCode::UNAUTHORIZED,
            // Domain rejections answer 200 with an error body; clients
            // branch on the status field, not the HTTP code.
            _ => StatusCode::OK,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match &self {
            ServerError::PasswordHash(_)
            | ServerError::Core(
                CoreError::Database(_) | CoreError::Migration(_) | CoreError::Io(_),
            ) => {
                error!(error = %self, "internal failure while handling request");
            }
            other => {
                warn!(error = %other, "request rejected");
            }
        }

        let body = ApiResponse::error(self.public_message());
        (self.status_code(), Json(body)).into_response()
    }
}
