//! Order and subscription endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::info;

use widget_store_core::{OrderId, OrderStatus};

use crate::db::{OrderPage, OrderRepository};
use crate::error::AppError;
use crate::middleware::RequireToken;
use crate::models::Order;
use crate::routes::StatusResponse;
use crate::state::AppState;

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/all-sales", post(all_sales))
        .route("/api/admin/all-subscriptions", post(all_subscriptions))
        .route("/api/admin/get-sale/{id}", get(get_sale))
        .route("/api/admin/refund", post(refund))
        .route("/api/admin/cancel-subscription", post(cancel_subscription))
}

/// Paging parameters posted by list views.
#[derive(Debug, Deserialize)]
pub struct PageRequest {
    pub page_size: i64,
    pub page: i64,
}

/// Body of status-changing requests.
#[derive(Debug, Deserialize)]
pub struct OrderIdRequest {
    pub id: OrderId,
}

/// List one-off orders, newest first.
///
/// # Errors
///
/// Returns 400 for a page or page size below 1.
pub async fn all_sales(
    RequireToken(_user): RequireToken,
    State(state): State<AppState>,
    Json(body): Json<PageRequest>,
) -> Result<Json<OrderPage>, AppError> {
    let page = OrderRepository::new(state.pool())
        .list_paged(body.page_size, body.page, false)
        .await?;
    Ok(Json(page))
}

/// List subscriptions, newest first.
///
/// # Errors
///
/// Returns 400 for a page or page size below 1.
pub async fn all_subscriptions(
    RequireToken(_user): RequireToken,
    State(state): State<AppState>,
    Json(body): Json<PageRequest>,
) -> Result<Json<OrderPage>, AppError> {
    let page = OrderRepository::new(state.pool())
        .list_paged(body.page_size, body.page, true)
        .await?;
    Ok(Json(page))
}

/// Fetch a single order or subscription.
///
/// # Errors
///
/// Returns 404 if the order does not exist.
pub async fn get_sale(
    RequireToken(_user): RequireToken,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>, AppError> {
    let order = OrderRepository::new(state.pool()).get_by_id(id).await?;
    Ok(Json(order))
}

/// Mark an order refunded. The payment gateway refund itself happens
/// upstream; this records the outcome.
///
/// # Errors
///
/// Returns 500 if the update fails.
pub async fn refund(
    RequireToken(user): RequireToken,
    State(state): State<AppState>,
    Json(body): Json<OrderIdRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    OrderRepository::new(state.pool())
        .update_status(body.id, OrderStatus::Refunded.id())
        .await?;

    info!(order_id = %body.id, user_id = %user.id, "order refunded");
    Ok(Json(StatusResponse::ok("Charge refunded")))
}

/// Mark a subscription cancelled.
///
/// # Errors
///
/// Returns 500 if the update fails.
pub async fn cancel_subscription(
    RequireToken(user): RequireToken,
    State(state): State<AppState>,
    Json(body): Json<OrderIdRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    OrderRepository::new(state.pool())
        .update_status(body.id, OrderStatus::Cancelled.id())
        .await?;

    info!(order_id = %body.id, user_id = %user.id, "subscription cancelled");
    Ok(Json(StatusResponse::ok("Subscription cancelled")))
}
