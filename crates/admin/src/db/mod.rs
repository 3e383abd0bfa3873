//! Database operations for the widget store `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `widgets` - Catalog items (`is_recurring` splits orders from subscriptions)
//! - `statuses` / `transaction_statuses` - Status lookup tables
//! - `transactions` - Payment attempts reported by the gateway
//! - `customers` - Checkout identities
//! - `orders` - Purchases joining widget, transaction and customer
//! - `users` - Staff accounts
//! - `tokens` - Hashed authentication tokens (one live token per user)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p widget-store-cli -- migrate
//! ```
//!
//! # Timeouts
//!
//! Every repository call is bounded by [`QUERY_TIMEOUT`], measured from the
//! start of the call. A call that runs over is abandoned and reported as
//! [`RepositoryError::Timeout`].

pub mod customers;
pub mod orders;
pub mod tokens;
pub mod transactions;
pub mod users;
pub mod widgets;

use std::future::Future;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use customers::CustomerRepository;
pub use orders::{OrderPage, OrderQuery, OrderRepository};
pub use tokens::TokenRepository;
pub use transactions::TransactionRepository;
pub use users::UserRepository;
pub use widgets::WidgetRepository;

/// Upper bound on the wall-clock time of a single repository operation.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(3);

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The operation did not finish within its time bound.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// The caller passed arguments the query cannot use.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Run `operation`, failing with [`RepositoryError::Timeout`] if it takes
/// longer than `limit`. The operation future is dropped on timeout, so no
/// partial result escapes.
pub(crate) async fn bounded<T, F>(limit: Duration, operation: F) -> Result<T, RepositoryError>
where
    F: Future<Output = Result<T, RepositoryError>>,
{
    tokio::time::timeout(limit, operation)
        .await
        .map_err(|_| RepositoryError::Timeout(limit))?
}

/// Map a unique-constraint violation to [`RepositoryError::Conflict`].
pub(crate) fn conflict_on_unique(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_bounded_times_out() {
        let result: Result<(), _> = bounded(QUERY_TIMEOUT, async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(RepositoryError::Timeout(d)) if d == QUERY_TIMEOUT));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_passes_result_through() {
        let result = bounded(QUERY_TIMEOUT, async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(42)
        })
        .await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_bounded_passes_errors_through() {
        let result: Result<(), _> =
            bounded(QUERY_TIMEOUT, async { Err(RepositoryError::NotFound) }).await;

        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }
}
