//! Staff user management endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::delete,
};
use tracing::info;

use widget_store_core::UserId;

use crate::db::UserRepository;
use crate::error::AppError;
use crate::middleware::RequireToken;
use crate::routes::StatusResponse;
use crate::state::AppState;
use crate::ws::InboundEvent;

/// Build the users router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/admin/users/{id}", delete(delete_user))
}

/// Delete a staff user and their tokens, then tell every connected client to
/// log that user out.
///
/// # Errors
///
/// Returns 400 when a user tries to delete themselves, 404 if the user does
/// not exist.
pub async fn delete_user(
    RequireToken(current): RequireToken,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<StatusResponse>, AppError> {
    if current.id == id {
        return Err(AppError::BadRequest(
            "you cannot delete your own account".to_string(),
        ));
    }

    UserRepository::new(state.pool()).delete(id).await?;
    state.hub().submit(InboundEvent::delete_user(id))?;

    info!(user_id = %id, deleted_by = %current.id, "user deleted");
    Ok(Json(StatusResponse::ok("user deleted")))
}
