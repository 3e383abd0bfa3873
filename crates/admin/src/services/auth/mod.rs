//! Password authentication and token issuance.

use std::time::Duration;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use widget_store_core::{Email, EmailError, TokenScope};

use super::tokens::{TokenError, generate_token, hash_token};
use crate::db::{RepositoryError, TokenRepository, UserRepository};
use crate::models::{Token, User};

/// Errors that can occur during authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Wrong password or unknown email.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The stored hash could not be parsed or the hasher failed.
    #[error("password hashing error")]
    PasswordHash,

    /// Token generation or lookup failed.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: TokenRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens: TokenRepository::new(pool),
        }
    }

    /// Check an email and password.
    ///
    /// The email is lowercased before lookup.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email is unknown or the
    /// password does not match.
    /// Returns `AuthError::PasswordHash` if the stored hash is unusable.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .get_with_password_hash(&email)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::InvalidCredentials,
                other => AuthError::Repository(other),
            })?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Issue a fresh authentication token, replacing any the user had.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if the token cannot be generated.
    /// Returns `AuthError::Repository` if it cannot be stored.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn issue_token(&self, user: &User, ttl: Duration) -> Result<Token, AuthError> {
        let token = generate_token(user.id, ttl, TokenScope::Authentication)?;
        self.tokens.persist(&token, user).await?;
        Ok(token)
    }

    /// Resolve a presented bearer token to its user.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::NotFound` if the token is unknown or expired.
    pub async fn user_for_token(&self, plain_text: &str) -> Result<User, TokenError> {
        let hash = hash_token(plain_text);
        Ok(self.tokens.resolve_user(&hash).await?)
    }
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::PasswordHash)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|e| match e {
            argon2::password_hash::Error::Password => AuthError::InvalidCredentials,
            _ => AuthError::PasswordHash,
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse battery staple", &hash).is_ok());
    }

    #[test]
    fn test_wrong_password_is_invalid_credentials() {
        let hash = hash_password("password1").unwrap();
        assert!(matches!(
            verify_password("password2", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_corrupt_hash_is_distinct_from_wrong_password() {
        assert!(matches!(
            verify_password("password1", "not-a-phc-string"),
            Err(AuthError::PasswordHash)
        ));
    }
}
