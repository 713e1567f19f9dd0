//! Error handling for the Relay server

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use relay::RelayError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Server error types
#[derive(Debug, Error)]
pub enum ServerError {
    /// Relay library error
    #[error(transparent)]
    Relay(#[from] RelayError),

    /// Missing or invalid credentials
    #[error("{0}")]
    Auth(String),

    /// Authenticated but not allowed
    #[error("{0}")]
    Forbidden(String),

    /// Request payload failed field validation
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl ServerError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Relay(err) => match err {
                RelayError::NotFound(_) => StatusCode::NOT_FOUND,
                RelayError::BadRequest(_) => StatusCode::BAD_REQUEST,
                RelayError::Conflict(_) => StatusCode::CONFLICT,
                RelayError::Infrastructure(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServerError::Auth(_) => StatusCode::UNAUTHORIZED,
            ServerError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServerError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            ServerError::Relay(err) => match err {
                RelayError::NotFound(_) => "not_found",
                RelayError::BadRequest(_) => "bad_request",
                RelayError::Conflict(_) => "conflict",
                RelayError::Infrastructure(_) => "service_unavailable",
                _ => "internal_error",
            },
            ServerError::Auth(_) => "authentication_error",
            ServerError::Forbidden(_) => "forbidden",
            ServerError::Validation(_) => "validation_error",
            ServerError::BadRequest(_) => "bad_request",
            ServerError::Internal(_) => "internal_error",
        }
    }

    /// Client-facing message. Server-side failures are logged, not echoed.
    fn public_message(&self) -> String {
        match self {
            ServerError::Relay(
                RelayError::NotFound(msg) | RelayError::BadRequest(msg) | RelayError::Conflict(msg),
            ) => msg.clone(),
            ServerError::Relay(RelayError::Infrastructure(_)) => {
                "storage temporarily unavailable, retry later".to_string()
            }
            ServerError::Relay(_) | ServerError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        }

        let error_response = ErrorResponse {
            error: self.error_type().to_string(),
            message: self.public_message(),
        };

        (status, Json(error_response)).into_response()
    }
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

/// Helper function to create a bad request error
pub fn bad_request(message: &str) -> ServerError {
    ServerError::BadRequest(message.to_string())
}
