//! Authentication endpoints.

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::middleware::RequireToken;
use crate::models::Token;
use crate::routes::StatusResponse;
use crate::services::AuthService;
use crate::state::AppState;

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/authenticate", post(authenticate))
        .route("/api/is-authenticated", post(is_authenticated))
}

/// Credentials posted by the login form.
#[derive(Debug, Deserialize)]
pub struct AuthenticateRequest {
    pub email: String,
    pub password: String,
}

/// Successful login.
#[derive(Debug, Serialize)]
pub struct AuthenticateResponse {
    pub error: bool,
    pub message: String,
    pub authentication_token: Token,
}

/// Check credentials and issue a bearer token, replacing any earlier token
/// for the same user.
///
/// # Errors
///
/// Returns 401 for unknown email or wrong password.
pub async fn authenticate(
    State(state): State<AppState>,
    Json(body): Json<AuthenticateRequest>,
) -> Result<Json<AuthenticateResponse>, AppError> {
    let auth = AuthService::new(state.pool());
    let user = auth.authenticate(&body.email, &body.password).await?;
    let token = auth.issue_token(&user, state.config().token_ttl).await?;

    info!(user_id = %user.id, "token issued");

    Ok(Json(AuthenticateResponse {
        error: false,
        message: format!("token for {} created", user.email),
        authentication_token: token,
    }))
}

/// Report whether the presented bearer token is valid.
pub async fn is_authenticated(RequireToken(user): RequireToken) -> Json<StatusResponse> {
    Json(StatusResponse::ok(format!(
        "authenticated user {}",
        user.email
    )))
}
