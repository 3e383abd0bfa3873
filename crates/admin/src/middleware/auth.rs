//! Bearer token authentication.
//!
//! Admin API requests carry `Authorization: Bearer <token>`. The token is
//! hashed and resolved to a staff user through the token table.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::set_sentry_user;
use crate::models::User;
use crate::services::{AuthService, TokenError};
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireToken(user): RequireToken) -> impl IntoResponse {
///     format!("Hello, {}!", user.first_name)
/// }
/// ```
pub struct RequireToken(pub User);

/// Error returned when a request is not authenticated.
#[derive(Debug)]
pub enum AuthRejection {
    /// No usable `Authorization` header.
    MissingToken,
    /// The token is unknown or expired.
    InvalidToken,
    /// The token could not be checked.
    Unavailable,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingToken => (StatusCode::UNAUTHORIZED, "missing authentication token"),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid authentication token"),
            Self::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, "authentication unavailable"),
        };
        (status, Json(json!({"error": true, "message": message}))).into_response()
    }
}

impl FromRequestParts<AppState> for RequireToken {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AuthRejection::MissingToken)?;

        let user = AuthService::new(state.pool())
            .user_for_token(token)
            .await
            .map_err(|e| match e {
                TokenError::NotFound => AuthRejection::InvalidToken,
                other => {
                    tracing::error!(error = %other, "token lookup failed");
                    AuthRejection::Unavailable
                }
            })?;

        set_sentry_user(user.id.as_i32(), user.email.as_str());
        Ok(Self(user))
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
