//! Customer repository.

use sqlx::PgPool;
use tracing::instrument;

use widget_store_core::CustomerId;

use super::{QUERY_TIMEOUT, RepositoryError, bounded};
use crate::models::NewCustomer;

/// Repository for checkout customers.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a customer. Existing customers with the same email are not
    /// looked up; every checkout gets its own row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    /// Returns `RepositoryError::Timeout` if the insert exceeds [`QUERY_TIMEOUT`].
    #[instrument(skip(self, customer))]
    pub async fn insert(&self, customer: &NewCustomer) -> Result<CustomerId, RepositoryError> {
        bounded(QUERY_TIMEOUT, async {
            let id = sqlx::query_scalar::<_, CustomerId>(
                r"
                INSERT INTO customers (first_name, last_name, email)
                VALUES ($1, $2, $3)
                RETURNING id
                ",
            )
            .bind(&customer.first_name)
            .bind(&customer.last_name)
            .bind(&customer.email)
            .fetch_one(self.pool)
            .await?;
            Ok(id)
        })
        .await
    }
}
