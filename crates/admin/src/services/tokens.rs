//! Bearer token generation.
//!
//! A token is 16 bytes from the operating system's secure random source,
//! base32 encoded without padding. Only its SHA-256 digest is persisted, so a
//! database leak does not leak usable tokens.

use std::time::Duration;

use chrono::Utc;
use data_encoding::BASE32_NOPAD;
use rand::TryRngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use thiserror::Error;

use widget_store_core::{TokenScope, UserId};

use crate::db::RepositoryError;
use crate::models::Token;

/// Number of random bytes in a token.
const TOKEN_BYTES: usize = 16;

/// Errors from token operations.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The secure random source could not be read.
    #[error("secure random source unavailable: {0}")]
    RandomSource(String),

    /// The token's lifetime cannot be represented as a timestamp.
    #[error("invalid token lifetime: {0:?}")]
    InvalidTtl(Duration),

    /// No unexpired token matches.
    #[error("token not found or expired")]
    NotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for TokenError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}

/// Generate a token for `user_id` that expires `ttl` from now.
///
/// # Errors
///
/// Returns `TokenError::RandomSource` if the OS random source fails.
/// Returns `TokenError::InvalidTtl` if `ttl` overflows the expiry timestamp.
pub fn generate_token(
    user_id: UserId,
    ttl: Duration,
    scope: TokenScope,
) -> Result<Token, TokenError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| TokenError::RandomSource(e.to_string()))?;

    let plain_text = BASE32_NOPAD.encode(&bytes);
    let hash = hash_token(&plain_text);

    let expiry = chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .ok_or(TokenError::InvalidTtl(ttl))?;

    Ok(Token {
        plain_text,
        user_id,
        hash,
        expiry,
        scope,
    })
}

/// SHA-256 digest of a plaintext token, as stored in `tokens.token_hash`.
#[must_use]
pub fn hash_token(plain_text: &str) -> Vec<u8> {
    Sha256::digest(plain_text.as_bytes()).to_vec()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_shape() {
        let token = generate_token(
            UserId::new(1),
            Duration::from_secs(3600),
            TokenScope::Authentication,
        )
        .unwrap();

        // 16 bytes = 128 bits, 26 base32 characters without padding
        assert_eq!(token.plain_text.len(), 26);
        assert!(!token.plain_text.contains('='));
        assert!(
            token
                .plain_text
                .chars()
                .all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c))
        );
        assert_eq!(token.hash.len(), 32);
        assert_eq!(token.hash, hash_token(&token.plain_text));
        assert_eq!(token.user_id, UserId::new(1));
    }

    #[test]
    fn test_generate_sets_expiry() {
        let before = Utc::now();
        let token = generate_token(
            UserId::new(1),
            Duration::from_secs(24 * 3600),
            TokenScope::Authentication,
        )
        .unwrap();

        let lifetime = token.expiry - before;
        assert!(lifetime >= chrono::Duration::hours(24));
        assert!(lifetime < chrono::Duration::hours(24) + chrono::Duration::seconds(5));
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = generate_token(UserId::new(1), Duration::from_secs(60), TokenScope::Authentication)
            .unwrap();
        let b = generate_token(UserId::new(1), Duration::from_secs(60), TokenScope::Authentication)
            .unwrap();
        assert_ne!(a.plain_text, b.plain_text);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn test_overflowing_ttl_rejected() {
        let result = generate_token(
            UserId::new(1),
            Duration::from_secs(u64::MAX),
            TokenScope::Authentication,
        );
        assert!(matches!(result, Err(TokenError::InvalidTtl(_))));
    }

    #[test]
    fn test_hash_is_sha256() {
        assert_eq!(
            hex::encode(hash_token("abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_not_found_maps_from_repository() {
        assert!(matches!(
            TokenError::from(RepositoryError::NotFound),
            TokenError::NotFound
        ));
        assert!(matches!(
            TokenError::from(RepositoryError::Timeout(Duration::from_secs(3))),
            TokenError::Repository(RepositoryError::Timeout(_))
        ));
    }
}
