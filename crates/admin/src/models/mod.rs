//! Domain models for the widget store back office.
//!
//! These are validated domain objects; the row types used to read them from
//! `PostgreSQL` live next to the queries in [`crate::db`].

pub mod customer;
pub mod order;
pub mod token;
pub mod transaction;
pub mod user;
pub mod widget;

pub use customer::NewCustomer;
pub use order::{NewOrder, Order, OrderCustomer, OrderTransaction, OrderWidget};
pub use token::Token;
pub use transaction::NewTransaction;
pub use user::User;
pub use widget::Widget;
