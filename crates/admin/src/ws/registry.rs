//! Connection registry.
//!
//! The registry is owned by the hub task and never shared, so iteration and
//! mutation cannot interleave. Entries are keyed by a monotonically
//! increasing [`ConnectionId`]; ids are never reused within a process.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Identity of a live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Frames queued for a connection's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Text(Arc<str>),
    Close,
}

/// Why a frame could not be queued for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The client is not keeping up and its outbox is full.
    #[error("outbox full")]
    Full,
    /// The writer task has gone away.
    #[error("connection closed")]
    Closed,
}

/// A registered connection.
#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub remote_addr: SocketAddr,
    /// Set once the client identifies itself.
    pub username: Option<String>,
    outbox: mpsc::Sender<Outgoing>,
}

impl Connection {
    #[must_use]
    pub const fn new(
        id: ConnectionId,
        remote_addr: SocketAddr,
        outbox: mpsc::Sender<Outgoing>,
    ) -> Self {
        Self {
            id,
            remote_addr,
            username: None,
            outbox,
        }
    }

    /// Queue a text frame without waiting.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Full` if the outbox is full and
    /// `DeliveryError::Closed` if the writer has stopped.
    pub fn deliver(&self, text: &Arc<str>) -> Result<(), DeliveryError> {
        self.outbox
            .try_send(Outgoing::Text(Arc::clone(text)))
            .map_err(|e| match e {
                TrySendError::Full(_) => DeliveryError::Full,
                TrySendError::Closed(_) => DeliveryError::Closed,
            })
    }

    /// Ask the writer to send a close frame. If the outbox is full the
    /// writer still stops once the connection is dropped from the registry.
    pub fn close(&self) {
        let _ = self.outbox.try_send(Outgoing::Close);
    }
}

/// Live connections keyed by id.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: BTreeMap<ConnectionId, Connection>,
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection with no username.
    pub fn register(&mut self, mut connection: Connection) {
        connection.username = None;
        self.connections.insert(connection.id, connection);
    }

    /// Remove a connection. Removing an absent id is a no-op.
    pub fn unregister(&mut self, id: ConnectionId) -> Option<Connection> {
        self.connections.remove(&id)
    }

    /// Associate a username with a connection. Returns `false` if the id is
    /// not registered.
    pub fn set_username(&mut self, id: ConnectionId, username: String) -> bool {
        match self.connections.get_mut(&id) {
            Some(connection) => {
                connection.username = Some(username);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// Iterate over live connections in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Remove every connection, in registration order.
    pub fn drain(&mut self) -> impl Iterator<Item = Connection> {
        std::mem::take(&mut self.connections).into_values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
