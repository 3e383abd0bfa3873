//! Integration test support for the widget store backend.
//!
//! # Running Tests
//!
//! ```bash
//! # WebSocket tests run in-process and need nothing else
//! cargo test -p widget-store-integration-tests
//!
//! # Database tests need PostgreSQL
//! DATABASE_URL=postgres://localhost/widgets_test \
//!     cargo test -p widget-store-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `websocket` - Notification hub over real sockets
//! - `http` - Routing, health and authentication rejections
//! - `database` - Repositories and token service against `PostgreSQL`

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use secrecy::SecretString;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use tokio::task::JoinHandle;

use widget_store_admin::config::{AdminConfig, Environment};
use widget_store_admin::db::{
    self, CustomerRepository, OrderRepository, TransactionRepository,
};
use widget_store_admin::models::{NewCustomer, NewOrder, NewTransaction};
use widget_store_admin::routes;
use widget_store_admin::state::AppState;
use widget_store_admin::ws::{Hub, HubHandle};
use widget_store_core::{
    Amount, CurrencyCode, Email, OrderId, OrderStatus, TransactionStatus, WidgetId,
};

// =============================================================================
// In-process server
// =============================================================================

/// Points at a port nothing listens on, so the lazy pool fails fast.
const UNREACHABLE_DATABASE_URL: &str = "postgres://widgets@127.0.0.1:1/widgets";

/// Configuration for an in-process server.
#[must_use]
pub fn test_config(database_url: &str) -> AdminConfig {
    AdminConfig {
        database_url: SecretString::from(database_url.to_owned()),
        host: [127, 0, 0, 1].into(),
        port: 0,
        environment: Environment::Development,
        frontend_url: "http://localhost:4000".to_owned(),
        token_ttl: Duration::from_secs(3600),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// The full router served on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub hub: HubHandle,
    hub_task: JoinHandle<()>,
    server_task: JoinHandle<()>,
}

impl TestServer {
    /// Start a server whose database is unreachable. Enough for the
    /// WebSocket endpoint, liveness and authentication rejections.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(1))
            .connect_lazy(UNREACHABLE_DATABASE_URL)
            .expect("Failed to build lazy pool");
        Self::start_with_pool(pool).await
    }

    /// Start a server backed by `pool`.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start_with_pool(pool: PgPool) -> Self {
        let (hub, hub_task) = Hub::spawn();
        let state = AppState::new(test_config(UNREACHABLE_DATABASE_URL), pool, hub.clone());
        let app = routes::routes().with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");

        let server_task = tokio::spawn(async move {
            let _ = axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await;
        });

        Self {
            addr,
            hub,
            hub_task,
            server_task,
        }
    }

    /// WebSocket URL of the endpoint.
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// HTTP URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Shut the hub down and stop serving.
    pub async fn stop(self) {
        self.hub.shutdown().await;
        let _ = self.hub_task.await;
        self.server_task.abort();
    }
}

// =============================================================================
// Database fixtures
// =============================================================================

/// Connect to `DATABASE_URL` and apply migrations.
///
/// # Panics
///
/// Panics if `DATABASE_URL` is unset or the database is unreachable.
pub async fn test_pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for database tests");
    let pool = db::create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to test database");
    sqlx::migrate!("../admin/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Connect to `DATABASE_URL` inside a fresh schema of its own and apply
/// migrations there. Tables start empty apart from seeded lookups, so counts
/// and page contents are exact.
///
/// # Panics
///
/// Panics if `DATABASE_URL` is unset or the database is unreachable.
pub async fn isolated_pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for database tests");
    let schema = format!("test_{}", unique_suffix().replace('-', "_"));

    let admin = PgPool::connect(&url)
        .await
        .expect("Failed to connect to test database");
    sqlx::query(&format!("CREATE SCHEMA {schema}"))
        .execute(&admin)
        .await
        .expect("Failed to create test schema");
    admin.close().await;

    let options = PgConnectOptions::from_str(&url)
        .expect("Invalid DATABASE_URL")
        .options([("search_path", schema.as_str())]);
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .expect("Failed to connect to test schema");
    sqlx::migrate!("../admin/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// A value unique to this process and moment, for emails and names.
#[must_use]
pub fn unique_suffix() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{}-{nanos}", std::process::id())
}

/// Insert a widget and return its id.
///
/// # Panics
///
/// Panics if the insert fails.
pub async fn insert_widget(pool: &PgPool, recurring: bool) -> WidgetId {
    sqlx::query_scalar::<_, WidgetId>(
        r"
        INSERT INTO widgets (name, description, price, is_recurring, plan_id)
        VALUES ($1, 'test widget', 1000, $2, $3)
        RETURNING id
        ",
    )
    .bind(format!("widget-{}", unique_suffix()))
    .bind(recurring)
    .bind(if recurring { "price_test" } else { "" })
    .fetch_one(pool)
    .await
    .expect("Failed to insert widget")
}

/// Record a cleared order for `widget_id` with a fresh transaction and
/// customer.
///
/// # Panics
///
/// Panics if any insert fails.
pub async fn insert_order(pool: &PgPool, widget_id: WidgetId) -> OrderId {
    let transaction_id = TransactionRepository::new(pool)
        .insert(&NewTransaction {
            amount: Amount::from_cents(1000),
            currency: CurrencyCode::Usd,
            last_four: "4242".to_owned(),
            expiry_month: 12,
            expiry_year: 2030,
            payment_intent: format!("pi_{}", unique_suffix()),
            payment_method: "pm_card_visa".to_owned(),
            bank_return_code: "ch_test".to_owned(),
            transaction_status_id: TransactionStatus::Cleared.id(),
        })
        .await
        .expect("Failed to insert transaction");

    let customer_id = CustomerRepository::new(pool)
        .insert(&NewCustomer {
            first_name: "Test".to_owned(),
            last_name: "Customer".to_owned(),
            email: Email::parse(&format!("customer-{}@example.com", unique_suffix()))
                .expect("valid email"),
        })
        .await
        .expect("Failed to insert customer");

    OrderRepository::new(pool)
        .insert(&NewOrder {
            widget_id,
            transaction_id,
            customer_id,
            status_id: OrderStatus::Cleared.id(),
            quantity: 1,
            amount: Amount::from_cents(1000),
        })
        .await
        .expect("Failed to insert order")
}
