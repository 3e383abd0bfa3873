//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                          - Liveness
//! GET    /health/ready                    - Database readiness
//!
//! # Auth
//! POST   /api/authenticate                - Email + password -> bearer token
//! POST   /api/is-authenticated            - Check a bearer token
//!
//! # Admin (bearer token required)
//! POST   /api/admin/all-sales             - Paged one-off orders
//! POST   /api/admin/all-subscriptions     - Paged subscriptions
//! GET    /api/admin/get-sale/{id}         - Single order of either kind
//! POST   /api/admin/refund                - Mark an order refunded
//! POST   /api/admin/cancel-subscription   - Mark a subscription cancelled
//! DELETE /api/admin/users/{id}            - Delete a staff user, log them out everywhere
//!
//! # Live notifications
//! GET    /ws                              - WebSocket upgrade
//! ```

pub mod auth;
pub mod health;
pub mod orders;
pub mod users;

use axum::{Router, routing::get};
use serde::Serialize;

use crate::state::AppState;
use crate::ws::ws_endpoint;

/// Build the complete application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(auth::router())
        .merge(orders::router())
        .merge(users::router())
        .route("/ws", get(ws_endpoint))
}

/// `{error, message}` envelope returned by endpoints with nothing else to say.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub error: bool,
    pub message: String,
}

impl StatusResponse {
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            error: false,
            message: message.into(),
        }
    }
}
