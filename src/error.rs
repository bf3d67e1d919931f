//! Error types for Switchyard
//!
//! This module defines the errors surfaced at the HTTP boundary. Every error
//! renders as `{"error": {"message", "type", "code"?}}`, the envelope both
//! supported dialects understand.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::dialect::translate::TranslationError;
use crate::proxy::TransportError;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authorization header required")]
    MissingCredential,

    #[error("Invalid authorization header format. Expected: 'Bearer <token>'")]
    MalformedAuthorization,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("{0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error details
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl AppError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingCredential
            | AppError::MalformedAuthorization
            | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) | AppError::Translation(_) | AppError::JsonError(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream { .. } | AppError::Transport(_) | AppError::HttpError(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this error is an authentication rejection
    pub fn is_auth_rejection(&self) -> bool {
        self.status_code() == StatusCode::UNAUTHORIZED
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error_type, code, message) = match &self {
            AppError::MissingCredential
            | AppError::MalformedAuthorization
            | AppError::InvalidToken => ("invalid_request_error", None, self.to_string()),
            AppError::BadRequest(msg) => ("invalid_request_error", None, msg.clone()),
            AppError::Translation(_) => (
                "invalid_request_error",
                Some("translation_failed"),
                self.to_string(),
            ),
            AppError::JsonError(_) => (
                "invalid_request_error",
                Some("invalid_json"),
                "Invalid JSON in request".to_string(),
            ),
            AppError::NotFound(msg) => ("not_found_error", None, msg.clone()),
            AppError::Upstream { .. } => ("upstream_error", Some("provider_error"), self.to_string()),
            AppError::Transport(_) => ("upstream_error", Some("transport_error"), self.to_string()),
            AppError::HttpError(_) => (
                "upstream_error",
                Some("provider_unreachable"),
                "Upstream service error".to_string(),
            ),
            AppError::Internal(_) => (
                "server_error",
                Some("internal_error"),
                "Internal server error".to_string(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                message,
                error_type: error_type.to_string(),
                code: code.map(str::to_string),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
