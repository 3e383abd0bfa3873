//! Payment transaction repository.

use sqlx::PgPool;
use tracing::instrument;

use widget_store_core::TransactionId;

use super::{QUERY_TIMEOUT, RepositoryError, bounded};
use crate::models::NewTransaction;

/// Repository for recording payment transactions.
pub struct TransactionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TransactionRepository<'a> {
    /// Create a new transaction repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record the outcome of a payment attempt.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    /// Returns `RepositoryError::Timeout` if the insert exceeds [`QUERY_TIMEOUT`].
    #[instrument(skip(self, txn), fields(payment_intent = %txn.payment_intent))]
    pub async fn insert(&self, txn: &NewTransaction) -> Result<TransactionId, RepositoryError> {
        bounded(QUERY_TIMEOUT, async {
            let id = sqlx::query_scalar::<_, TransactionId>(
                r"
                INSERT INTO transactions
                    (amount, currency, last_four, expiry_month, expiry_year,
                     payment_intent, payment_method, bank_return_code,
                     transaction_status_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING id
                ",
            )
            .bind(txn.amount)
            .bind(txn.currency.as_str())
            .bind(&txn.last_four)
            .bind(txn.expiry_month)
            .bind(txn.expiry_year)
            .bind(&txn.payment_intent)
            .bind(&txn.payment_method)
            .bind(&txn.bank_return_code)
            .bind(txn.transaction_status_id)
            .fetch_one(self.pool)
            .await?;
            Ok(id)
        })
        .await
    }
}
