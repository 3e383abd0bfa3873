//! Staff user repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use widget_store_core::{Email, UserId};

use super::{QUERY_TIMEOUT, RepositoryError, bounded, conflict_on_unique};
use crate::models::User;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
pub(super) struct UserRow {
    id: UserId,
    first_name: String,
    last_name: String,
    email: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for staff accounts.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this id.
    /// Returns `RepositoryError::Timeout` if the query exceeds [`QUERY_TIMEOUT`].
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn get_by_id(&self, id: UserId) -> Result<User, RepositoryError> {
        bounded(QUERY_TIMEOUT, async {
            let row = sqlx::query_as::<_, UserRow>(
                r"
                SELECT id, first_name, last_name, email, created_at, updated_at
                FROM users
                WHERE id = $1
                ",
            )
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

            row.try_into()
        })
        .await
    }

    /// Get a user by email. [`Email`] is already lowercased, so the lookup is
    /// case-insensitive with respect to what the caller typed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this email.
    /// Returns `RepositoryError::Timeout` if the query exceeds [`QUERY_TIMEOUT`].
    #[instrument(skip(self), fields(email = %email))]
    pub async fn get_by_email(&self, email: &Email) -> Result<User, RepositoryError> {
        let (user, _) = self.get_with_password_hash(email).await?;
        Ok(user)
    }

    /// Get a user by email together with their stored password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this email.
    /// Returns `RepositoryError::Timeout` if the query exceeds [`QUERY_TIMEOUT`].
    pub async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<(User, String), RepositoryError> {
        bounded(QUERY_TIMEOUT, async {
            let row = sqlx::query_as::<_, UserWithHashRow>(
                r"
                SELECT id, first_name, last_name, email, password, created_at, updated_at
                FROM users
                WHERE email = $1
                ",
            )
            .bind(email)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

            Ok((row.user.try_into()?, row.password))
        })
        .await
    }

    /// Create a staff user with an already hashed password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken.
    /// Returns `RepositoryError::Timeout` if the insert exceeds [`QUERY_TIMEOUT`].
    #[instrument(skip(self, password_hash), fields(email = %email))]
    pub async fn create(
        &self,
        first_name: &str,
        last_name: &str,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        bounded(QUERY_TIMEOUT, async {
            let row = sqlx::query_as::<_, UserRow>(
                r"
                INSERT INTO users (first_name, last_name, email, password)
                VALUES ($1, $2, $3, $4)
                RETURNING id, first_name, last_name, email, created_at, updated_at
                ",
            )
            .bind(first_name)
            .bind(last_name)
            .bind(email)
            .bind(password_hash)
            .fetch_one(self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "a user with this email already exists"))?;

            row.try_into()
        })
        .await
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this id.
    /// Returns `RepositoryError::Timeout` if the update exceeds [`QUERY_TIMEOUT`].
    #[instrument(skip(self, password_hash), fields(user_id = %id))]
    pub async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        bounded(QUERY_TIMEOUT, async {
            let result =
                sqlx::query("UPDATE users SET password = $1, updated_at = now() WHERE id = $2")
                    .bind(password_hash)
                    .bind(id)
                    .execute(self.pool)
                    .await?;

            if result.rows_affected() == 0 {
                return Err(RepositoryError::NotFound);
            }
            Ok(())
        })
        .await
    }

    /// Delete a user and every token issued to them.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this id.
    /// Returns `RepositoryError::Timeout` if the delete exceeds [`QUERY_TIMEOUT`].
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        bounded(QUERY_TIMEOUT, async {
            let mut tx = self.pool.begin().await?;

            sqlx::query("DELETE FROM tokens WHERE user_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            let result = sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            if result.rows_affected() == 0 {
                return Err(RepositoryError::NotFound);
            }

            tx.commit().await?;
            Ok(())
        })
        .await
    }
}
