//! Request extractors for the API.

pub mod auth;

pub use auth::{AuthRejection, RequireToken};
