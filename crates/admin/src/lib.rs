//! Widget store back-office server library.
//!
//! Order and subscription management, staff authentication with bearer
//! tokens, and live notifications to connected browsers over WebSocket.
//! The binary in `main.rs` wires these together; integration tests use the
//! same pieces directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod ws;
