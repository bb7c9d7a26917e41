//! Error handling for the shelf HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use uuid::Uuid;

use crate::response::Envelope;

const HIDDEN_INTERNAL_MESSAGE: &str = "An internal server error occurred";

/// Application error types that map to HTTP responses
///
/// Every variant renders as `{"status": "fail", "message": ...}`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("bad request: {message}")]
    BadRequest { message: String },

    /// A server-side failure whose message is meant for the client.
    #[error("internal error: {message}")]
    Internal { message: String },

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl AppError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create an internal error with a client-facing message
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// HTTP status code this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Internal { .. } | AppError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::NotFound { .. } => "not_found",
            AppError::BadRequest { .. } => "bad_request",
            AppError::Internal { .. } => "internal_error",
            AppError::Unexpected(_) => "unexpected_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        let status = self.status_code();
        let error_code = self.code();

        let message = match self {
            AppError::Validation { message }
            | AppError::NotFound { message }
            | AppError::BadRequest { message }
            | AppError::Internal { message } => message,
            AppError::Unexpected(e) => {
                tracing::error!(error_id = %error_id, error = ?e, "unexpected error");
                // Hide unexpected error details outside debug builds
                if cfg!(debug_assertions) {
                    e.to_string()
                } else {
                    HIDDEN_INTERNAL_MESSAGE.to_string()
                }
            }
        };

        if status.is_server_error() {
            tracing::error!(
                error_id = %error_id,
                error_code = %error_code,
                status_code = %status.as_u16(),
                "request error"
            );
        } else {
            tracing::warn!(
                error_id = %error_id,
                error_code = %error_code,
                status_code = %status.as_u16(),
                %message,
                "request rejected"
            );
        }

        (status, Json(Envelope::<()>::fail(message))).into_response()
    }
}
