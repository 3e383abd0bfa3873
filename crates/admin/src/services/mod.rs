//! Business logic services for the back office.
//!
//! # Services
//!
//! - `auth` - Password authentication and token issuance
//! - `tokens` - Bearer token generation and hashing

pub mod auth;
pub mod tokens;

pub use auth::{AuthError, AuthService, hash_password};
pub use tokens::{TokenError, generate_token, hash_token};
