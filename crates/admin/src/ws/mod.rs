//! Live notifications over WebSocket.
//!
//! Every browser tab of the back office keeps a WebSocket open on `/ws`.
//! Connections are owned by a single [`Hub`] task: per-connection reader tasks
//! forward decoded events to it through one FIFO queue, and it fans results
//! out to every registered connection.
//!
//! ```text
//! socket reader ──► HubHandle ──► [command queue] ──► Hub ──► outbox ──► socket writer
//! ```

pub mod events;
pub mod handler;
pub mod hub;
pub mod registry;

pub use events::{Action, InboundEvent, OutboundEvent};
pub use handler::ws_endpoint;
pub use hub::{Hub, HubError, HubHandle};
pub use registry::{Connection, ConnectionId, ConnectionRegistry, DeliveryError, Outgoing};
