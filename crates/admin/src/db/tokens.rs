//! Authentication token repository.
//!
//! Only the SHA-256 hash of a token is stored. A user has at most one live
//! token: persisting a new one removes every older one in the same database
//! transaction, so there is never a window with zero valid tokens.

use sqlx::PgPool;
use tracing::instrument;

use super::users::UserRow;
use super::{QUERY_TIMEOUT, RepositoryError, bounded};
use crate::models::{Token, User};

/// Repository for authentication tokens.
pub struct TokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TokenRepository<'a> {
    /// Create a new token repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store `token` for `user`, replacing any token they already had.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either statement fails; nothing
    /// is changed in that case.
    /// Returns `RepositoryError::Timeout` if the transaction exceeds [`QUERY_TIMEOUT`].
    #[instrument(skip(self, token, user), fields(user_id = %user.id))]
    pub async fn persist(&self, token: &Token, user: &User) -> Result<(), RepositoryError> {
        bounded(QUERY_TIMEOUT, async {
            let mut tx = self.pool.begin().await?;

            sqlx::query("DELETE FROM tokens WHERE user_id = $1")
                .bind(user.id)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                r"
                INSERT INTO tokens (user_id, name, email, token_hash, expiry)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(user.id)
            .bind(user.full_name())
            .bind(&user.email)
            .bind(&token.hash)
            .bind(token.expiry)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok(())
        })
        .await
    }

    /// Find the user owning an unexpired token with this hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no unexpired token matches.
    /// Returns `RepositoryError::Timeout` if the query exceeds [`QUERY_TIMEOUT`].
    #[instrument(skip_all)]
    pub async fn resolve_user(&self, token_hash: &[u8]) -> Result<User, RepositoryError> {
        bounded(QUERY_TIMEOUT, async {
            let row = sqlx::query_as::<_, UserRow>(
                r"
                SELECT u.id, u.first_name, u.last_name, u.email, u.created_at, u.updated_at
                FROM users u
                JOIN tokens t ON t.user_id = u.id
                WHERE t.token_hash = $1 AND t.expiry > now()
                ",
            )
            .bind(token_hash)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

            row.try_into()
        })
        .await
    }
}
