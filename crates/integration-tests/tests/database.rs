//! Repositories, the token service and authenticated HTTP against `PostgreSQL`.
//!
//! Run with:
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/widgets_test \
//!     cargo test -p widget-store-integration-tests --test database -- --ignored
//! ```

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{Value, json};
use sqlx::PgPool;

use widget_store_admin::db::{
    OrderPage, OrderRepository, RepositoryError, UserRepository, WidgetRepository,
};
use widget_store_admin::models::User;
use widget_store_admin::services::{AuthError, AuthService, TokenError, hash_password};
use widget_store_core::{Amount, Email, OrderId, OrderStatus, StatusId, UserId, WidgetId};
use widget_store_integration_tests::{
    TestServer, insert_order, insert_widget, isolated_pool, test_pool, unique_suffix,
};

const PASSWORD: &str = "correct horse battery staple";
const TTL: Duration = Duration::from_secs(3600);

async fn create_user(pool: &PgPool) -> User {
    let email = Email::parse(&format!("staff-{}@example.com", unique_suffix())).unwrap();
    let hash = hash_password(PASSWORD).unwrap();
    UserRepository::new(pool)
        .create("Test", "Staff", &email, &hash)
        .await
        .unwrap()
}

// =============================================================================
// Users and authentication
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_duplicate_email_conflicts() {
    let pool = test_pool().await;
    let user = create_user(&pool).await;

    let result = UserRepository::new(&pool)
        .create("Other", "Person", &user.email, "hash")
        .await;
    assert!(matches!(result, Err(RepositoryError::Conflict(_))));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_get_user_by_id() {
    let pool = test_pool().await;
    let user = create_user(&pool).await;
    let users = UserRepository::new(&pool);

    let found = users.get_by_id(user.id).await.unwrap();
    assert_eq!(found.id, user.id);
    assert_eq!(found.email, user.email);
    assert_eq!(found.full_name(), "Test Staff");

    assert!(matches!(
        users.get_by_id(UserId::new(i32::MAX)).await,
        Err(RepositoryError::NotFound)
    ));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_authenticate() {
    let pool = test_pool().await;
    let user = create_user(&pool).await;
    let auth = AuthService::new(&pool);

    let found = auth.authenticate(user.email.as_str(), PASSWORD).await.unwrap();
    assert_eq!(found.id, user.id);

    assert!(matches!(
        auth.authenticate(user.email.as_str(), "wrong").await,
        Err(AuthError::InvalidCredentials)
    ));
    assert!(matches!(
        auth.authenticate("nobody-here@example.com", PASSWORD).await,
        Err(AuthError::InvalidCredentials)
    ));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_set_password() {
    let pool = test_pool().await;
    let user = create_user(&pool).await;
    let users = UserRepository::new(&pool);

    let new_hash = hash_password("a different password").unwrap();
    users.update_password(user.id, &new_hash).await.unwrap();

    let auth = AuthService::new(&pool);
    assert!(auth.authenticate(user.email.as_str(), PASSWORD).await.is_err());
    auth.authenticate(user.email.as_str(), "a different password")
        .await
        .unwrap();
}

// =============================================================================
// Tokens
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_token_resolves_to_user() {
    let pool = test_pool().await;
    let user = create_user(&pool).await;
    let auth = AuthService::new(&pool);

    let token = auth.issue_token(&user, TTL).await.unwrap();
    let resolved = auth.user_for_token(&token.plain_text).await.unwrap();

    assert_eq!(resolved.id, user.id);
    assert_eq!(resolved.email, user.email);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_new_token_replaces_old() {
    let pool = test_pool().await;
    let user = create_user(&pool).await;
    let auth = AuthService::new(&pool);

    let first = auth.issue_token(&user, TTL).await.unwrap();
    let second = auth.issue_token(&user, TTL).await.unwrap();

    assert!(matches!(
        auth.user_for_token(&first.plain_text).await,
        Err(TokenError::NotFound)
    ));
    assert_eq!(
        auth.user_for_token(&second.plain_text).await.unwrap().id,
        user.id
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_expired_token_is_rejected() {
    let pool = test_pool().await;
    let user = create_user(&pool).await;
    let auth = AuthService::new(&pool);

    let token = auth.issue_token(&user, TTL).await.unwrap();
    sqlx::query("UPDATE tokens SET expiry = now() - interval '1 minute' WHERE user_id = $1")
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap();

    assert!(matches!(
        auth.user_for_token(&token.plain_text).await,
        Err(TokenError::NotFound)
    ));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_unknown_token_is_rejected() {
    let pool = test_pool().await;
    let auth = AuthService::new(&pool);

    assert!(matches!(
        auth.user_for_token("AAAAAAAAAAAAAAAAAAAAAAAAAA").await,
        Err(TokenError::NotFound)
    ));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_deleting_user_revokes_token() {
    let pool = test_pool().await;
    let user = create_user(&pool).await;
    let auth = AuthService::new(&pool);
    let token = auth.issue_token(&user, TTL).await.unwrap();

    let users = UserRepository::new(&pool);
    users.delete(user.id).await.unwrap();

    assert!(matches!(
        auth.user_for_token(&token.plain_text).await,
        Err(TokenError::NotFound)
    ));
    assert!(matches!(
        users.delete(user.id).await,
        Err(RepositoryError::NotFound)
    ));
}

// =============================================================================
// Widgets
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_get_widget_by_id() {
    let pool = test_pool().await;
    let widget_id = insert_widget(&pool, true).await;
    let widgets = WidgetRepository::new(&pool);

    let widget = widgets.get_by_id(widget_id).await.unwrap();
    assert_eq!(widget.id, widget_id);
    assert!(widget.is_recurring);
    assert_eq!(widget.plan_id, "price_test");
    assert_eq!(widget.price, Amount::from_cents(1000));

    assert!(matches!(
        widgets.get_by_id(WidgetId::new(i32::MAX)).await,
        Err(RepositoryError::NotFound)
    ));
}

// =============================================================================
// Orders
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_get_order_with_joined_rows() {
    let pool = test_pool().await;
    let widget_id = insert_widget(&pool, true).await;
    let order_id = insert_order(&pool, widget_id).await;

    let order = OrderRepository::new(&pool).get_by_id(order_id).await.unwrap();

    assert_eq!(order.id, order_id);
    assert_eq!(order.widget_id, widget_id);
    assert_eq!(order.widget.id, widget_id);
    assert_eq!(order.transaction.last_four, "4242");
    assert_eq!(order.customer.first_name, "Test");
    assert_eq!(order.status_id, OrderStatus::Cleared.id());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_missing_order_is_not_found() {
    let pool = test_pool().await;

    let result = OrderRepository::new(&pool)
        .get_by_id(OrderId::new(i32::MAX))
        .await;
    assert!(matches!(result, Err(RepositoryError::NotFound)));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_update_status() {
    let pool = test_pool().await;
    let widget_id = insert_widget(&pool, false).await;
    let order_id = insert_order(&pool, widget_id).await;
    let orders = OrderRepository::new(&pool);

    orders
        .update_status(order_id, OrderStatus::Refunded.id())
        .await
        .unwrap();
    let order = orders.get_by_id(order_id).await.unwrap();
    assert_eq!(order.status_id, OrderStatus::Refunded.id());

    // Unknown ids update nothing and are not an error.
    orders
        .update_status(OrderId::new(i32::MAX), OrderStatus::Refunded.id())
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_update_status_accepts_unseeded_status() {
    let pool = test_pool().await;
    let widget_id = insert_widget(&pool, false).await;
    let order_id = insert_order(&pool, widget_id).await;
    let orders = OrderRepository::new(&pool);

    orders
        .update_status(order_id, StatusId::new(99))
        .await
        .unwrap();
    let order = orders.get_by_id(order_id).await.unwrap();
    assert_eq!(order.status_id, StatusId::new(99));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_paged_orders() {
    let pool = test_pool().await;
    let widget_id = insert_widget(&pool, false).await;
    for _ in 0..25 {
        insert_order(&pool, widget_id).await;
    }

    let page = OrderRepository::new(&pool)
        .list_paged(10, 1, false)
        .await
        .unwrap();

    assert_eq!(page.current_page, 1);
    assert_eq!(page.page_size, 10);
    assert!(page.total_records >= 25);
    assert_eq!(page.last_page, page.total_records / 10);
    assert_eq!(page.orders.len(), 10);
    assert!(
        page.orders
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at)
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_later_pages_skip_earlier_rows() {
    let pool = isolated_pool().await;
    let widget_id = insert_widget(&pool, false).await;

    // Spread creation times so newest-first order is unambiguous.
    let mut ids = Vec::new();
    for minutes in 0..25_i32 {
        let id = insert_order(&pool, widget_id).await;
        sqlx::query(
            "UPDATE orders SET created_at = now() + make_interval(mins => $1) WHERE id = $2",
        )
        .bind(minutes)
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();
        ids.push(id);
    }
    ids.reverse();

    let orders = OrderRepository::new(&pool);
    let page_ids = |page: &OrderPage| page.orders.iter().map(|o| o.id).collect::<Vec<_>>();

    let first = orders.list_paged(10, 1, false).await.unwrap();
    assert_eq!(first.total_records, 25);
    assert_eq!(first.last_page, 2);
    assert_eq!(page_ids(&first), &ids[..10]);

    let second = orders.list_paged(10, 2, false).await.unwrap();
    assert_eq!(second.current_page, 2);
    assert_eq!(page_ids(&second), &ids[10..20]);

    let third = orders.list_paged(10, 3, false).await.unwrap();
    assert_eq!(page_ids(&third), &ids[20..]);

    let beyond = orders.list_paged(10, 4, false).await.unwrap();
    assert!(beyond.orders.is_empty());
    assert_eq!(beyond.total_records, 25);

    let subscriptions = orders.list_paged(10, 1, true).await.unwrap();
    assert_eq!(subscriptions.total_records, 0);
    assert!(subscriptions.orders.is_empty());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_paging_keeps_partitions_apart() {
    let pool = test_pool().await;
    let subscription_widget = insert_widget(&pool, true).await;
    let subscription_id = insert_order(&pool, subscription_widget).await;

    let orders = OrderRepository::new(&pool);
    let sales = orders.list_paged(1000, 1, false).await.unwrap();
    assert!(sales.orders.iter().all(|o| o.id != subscription_id));

    let subscriptions = orders.list_paged(1, 1, true).await.unwrap();
    assert_eq!(subscriptions.orders.len(), 1);
    assert!(subscriptions.total_records >= 1);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_invalid_page_arguments() {
    let pool = test_pool().await;
    let orders = OrderRepository::new(&pool);

    assert!(matches!(
        orders.list_paged(0, 1, false).await,
        Err(RepositoryError::InvalidArgument(_))
    ));
    assert!(matches!(
        orders.list_paged(10, 0, true).await,
        Err(RepositoryError::InvalidArgument(_))
    ));
}

// =============================================================================
// HTTP with a live database
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_login_then_refund_over_http() {
    let pool = test_pool().await;
    let user = create_user(&pool).await;
    let widget_id = insert_widget(&pool, false).await;
    let order_id = insert_order(&pool, widget_id).await;

    let server = TestServer::start_with_pool(pool.clone()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/api/authenticate"))
        .json(&json!({"email": user.email.as_str(), "password": PASSWORD}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], false);
    let token = body["authentication_token"]["token"]
        .as_str()
        .unwrap()
        .to_owned();
    assert_eq!(token.len(), 26);

    let response = client
        .get(server.url(&format!("/api/admin/get-sale/{order_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let order: Value = response.json().await.unwrap();
    assert_eq!(order["id"], order_id.as_i32());

    let response = client
        .post(server.url("/api/admin/refund"))
        .bearer_auth(&token)
        .json(&json!({"id": order_id.as_i32()}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let order = OrderRepository::new(&pool).get_by_id(order_id).await.unwrap();
    assert_eq!(order.status_id, OrderStatus::Refunded.id());

    server.stop().await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_wrong_password_over_http() {
    let pool = test_pool().await;
    let user = create_user(&pool).await;
    let server = TestServer::start_with_pool(pool).await;

    let response = reqwest::Client::new()
        .post(server.url("/api/authenticate"))
        .json(&json!({"email": user.email.as_str(), "password": "nope"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    server.stop().await;
}
