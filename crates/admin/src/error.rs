//! Unified error handling for the HTTP API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{AuthError, TokenError};
use crate::ws::HubError;

/// Application-level error type for API handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication failed.
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Token lookup or issuance failed.
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// Notification hub is not accepting work.
    #[error("Notification error: {0}")]
    Hub(#[from] HubError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body, the same `{error, message}` envelope every endpoint uses.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: bool,
    message: String,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::InvalidArgument(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(RepositoryError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            Self::Auth(AuthError::InvalidCredentials | AuthError::InvalidEmail(_))
            | Self::Token(TokenError::NotFound)
            | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Hub(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_) | Self::Auth(_) | Self::Token(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "API request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            _ if status.is_server_error() => "Internal server error".to_string(),
            Self::Auth(_) | Self::Token(_) => "invalid credentials".to_string(),
            _ => self.to_string(),
        };

        (
            status,
            Json(ErrorBody {
                error: true,
                message,
            }),
        )
            .into_response()
    }
}

/// Set the Sentry user context for the authenticated staff user.
pub fn set_sentry_user(user_id: i32, email: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: Some(email.to_owned()),
            ..Default::default()
        }));
    });
}
