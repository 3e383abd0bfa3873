//! Core types for the widget store.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod scope;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Amount, CurrencyCode};
pub use scope::{ScopeError, TokenScope};
pub use status::*;
