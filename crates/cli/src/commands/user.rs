//! Staff user management commands.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string

use widget_store_admin::db::UserRepository;
use widget_store_admin::services::hash_password;
use widget_store_core::{Email, UserId};

use super::{CommandError, connect};

/// Create a staff user.
///
/// # Errors
///
/// Returns `CommandError::InvalidEmail` for a malformed email and
/// `CommandError::Repository` if the email is already taken.
pub async fn create(
    email: &str,
    first_name: &str,
    last_name: &str,
    password: &str,
) -> Result<UserId, CommandError> {
    let email = Email::parse(email)?;
    let password_hash = hash_password(password)?;

    let pool = connect().await?;
    let user = UserRepository::new(&pool)
        .create(first_name, last_name, &email, &password_hash)
        .await?;

    tracing::info!("User created successfully! ID: {}, Email: {}", user.id, user.email);
    Ok(user.id)
}

/// Replace a staff user's password. Existing tokens stay valid until they
/// expire.
///
/// # Errors
///
/// Returns `CommandError::Repository` if no user has this email.
pub async fn set_password(email: &str, password: &str) -> Result<(), CommandError> {
    let email = Email::parse(email)?;
    let password_hash = hash_password(password)?;

    let pool = connect().await?;
    let users = UserRepository::new(&pool);
    let user = users.get_by_email(&email).await?;
    users.update_password(user.id, &password_hash).await?;

    tracing::info!("Password updated for {}", user.email);
    Ok(())
}
