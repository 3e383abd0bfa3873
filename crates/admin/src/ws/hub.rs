//! Broadcast hub.
//!
//! A single task owns the [`ConnectionRegistry`] and consumes one unbounded
//! command queue in arrival order. Everything that touches the registry,
//! including every broadcast send, goes through that queue, so the hub never
//! runs concurrently with itself.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::events::{Action, InboundEvent, OutboundEvent};
use super::registry::{Connection, ConnectionId, ConnectionRegistry, Outgoing};

/// Frames a connection may have queued before it counts as too slow.
pub const OUTBOX_CAPACITY: usize = 64;

/// Errors returned by [`HubHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HubError {
    /// The hub has shut down and accepts no more commands.
    #[error("notification hub is closed")]
    Closed,
}

#[derive(Debug)]
enum HubCommand {
    Register(Connection),
    Unregister(ConnectionId),
    /// `from` is `None` for events raised by the server itself.
    Inbound {
        from: Option<ConnectionId>,
        event: InboundEvent,
    },
    Broadcast(OutboundEvent),
    Count(oneshot::Sender<usize>),
    Shutdown(oneshot::Sender<()>),
}

/// The dispatcher. Create with [`Hub::new`] and drive with [`Hub::run`].
#[derive(Debug)]
pub struct Hub {
    commands: mpsc::UnboundedReceiver<HubCommand>,
    registry: ConnectionRegistry,
}

/// Cloneable sender side of the hub.
#[derive(Debug, Clone)]
pub struct HubHandle {
    commands: mpsc::UnboundedSender<HubCommand>,
    next_id: Arc<AtomicU64>,
}

impl Hub {
    /// Create a hub and the handle used to talk to it.
    #[must_use]
    pub fn new() -> (Self, HubHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let hub = Self {
            commands: rx,
            registry: ConnectionRegistry::new(),
        };
        let handle = HubHandle {
            commands: tx,
            next_id: Arc::new(AtomicU64::new(1)),
        };
        (hub, handle)
    }

    /// Create a hub and run it on the current runtime.
    #[must_use]
    pub fn spawn() -> (HubHandle, JoinHandle<()>) {
        let (hub, handle) = Self::new();
        (handle, tokio::spawn(hub.run()))
    }

    /// Process commands until shut down or every handle is dropped.
    #[instrument(name = "hub", skip_all)]
    pub async fn run(mut self) {
        info!("notification hub started");

        let mut done = None;
        while let Some(command) = self.commands.recv().await {
            if let HubCommand::Shutdown(reply) = command {
                done = Some(reply);
                break;
            }
            self.apply(command);
        }

        // Refuse new commands, then finish what was already queued.
        self.commands.close();
        while let Some(command) = self.commands.recv().await {
            match command {
                HubCommand::Shutdown(reply) => {
                    let _ = reply.send(());
                }
                other => self.apply(other),
            }
        }

        let closed = self.registry.len();
        for connection in self.registry.drain() {
            connection.close();
        }
        info!(closed, "notification hub stopped");

        if let Some(reply) = done {
            let _ = reply.send(());
        }
    }

    fn apply(&mut self, command: HubCommand) {
        match command {
            HubCommand::Register(connection) => {
                debug!(
                    connection_id = %connection.id,
                    remote_addr = %connection.remote_addr,
                    "connection registered"
                );
                self.registry.register(connection);
            }
            HubCommand::Unregister(id) => {
                if self.registry.unregister(id).is_some() {
                    debug!(connection_id = %id, "connection unregistered");
                }
            }
            HubCommand::Inbound { from, event } => self.dispatch(from, event),
            HubCommand::Broadcast(event) => {
                self.broadcast(&event);
            }
            HubCommand::Count(reply) => {
                let _ = reply.send(self.registry.len());
            }
            HubCommand::Shutdown(reply) => {
                let _ = reply.send(());
            }
        }
    }

    fn dispatch(&mut self, from: Option<ConnectionId>, event: InboundEvent) {
        match event.action() {
            Action::DeleteUser => {
                info!(user_id = %event.user_id, "user deleted, broadcasting logout");
                self.broadcast(&OutboundEvent::logout(event.user_id));
            }
            Action::Identify => {
                let known =
                    from.is_some_and(|id| self.registry.set_username(id, event.username.clone()));
                if !known {
                    debug!(?from, "identify from unregistered connection");
                }
            }
            Action::Unknown(action) => {
                debug!(?from, action, "ignoring unknown action");
            }
        }
    }

    /// Send `event` to every registered connection, closing and removing
    /// the ones that cannot take it. Returns the number of deliveries.
    fn broadcast(&mut self, event: &OutboundEvent) -> usize {
        let text: Arc<str> = match serde_json::to_string(event) {
            Ok(json) => json.into(),
            Err(e) => {
                warn!(error = %e, "failed to serialize outbound event");
                return 0;
            }
        };

        let mut delivered = 0;
        let mut failed = Vec::new();
        for connection in self.registry.iter() {
            match connection.deliver(&text) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(
                        connection_id = %connection.id,
                        remote_addr = %connection.remote_addr,
                        error = %e,
                        "dropping connection after failed delivery"
                    );
                    failed.push(connection.id);
                }
            }
        }

        for id in &failed {
            if let Some(connection) = self.registry.unregister(*id) {
                connection.close();
            }
        }

        debug!(
            action = %event.action,
            delivered,
            pruned = failed.len(),
            "broadcast complete"
        );
        delivered
    }
}

impl HubHandle {
    /// Register a new connection and return its id and the receiving end of
    /// its outbox.
    ///
    /// # Errors
    ///
    /// Returns `HubError::Closed` if the hub has shut down.
    pub fn connect(
        &self,
        remote_addr: SocketAddr,
    ) -> Result<(ConnectionId, mpsc::Receiver<Outgoing>), HubError> {
        let id = ConnectionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(OUTBOX_CAPACITY);
        self.send(HubCommand::Register(Connection::new(id, remote_addr, tx)))?;
        Ok((id, rx))
    }

    /// Remove a connection. Does nothing if it is already gone.
    pub fn unregister(&self, id: ConnectionId) {
        let _ = self.send(HubCommand::Unregister(id));
    }

    /// Queue an event received from a client.
    ///
    /// # Errors
    ///
    /// Returns `HubError::Closed` if the hub has shut down.
    pub fn dispatch(&self, from: ConnectionId, event: InboundEvent) -> Result<(), HubError> {
        self.send(HubCommand::Inbound {
            from: Some(from),
            event,
        })
    }

    /// Queue an event raised by the server rather than a client, such as
    /// `deleteUser` after an account is removed through the API.
    ///
    /// # Errors
    ///
    /// Returns `HubError::Closed` if the hub has shut down.
    pub fn submit(&self, event: InboundEvent) -> Result<(), HubError> {
        self.send(HubCommand::Inbound { from: None, event })
    }

    /// Queue an event for every connection.
    ///
    /// # Errors
    ///
    /// Returns `HubError::Closed` if the hub has shut down.
    pub fn broadcast(&self, event: OutboundEvent) -> Result<(), HubError> {
        self.send(HubCommand::Broadcast(event))
    }

    /// Number of registered connections, once every command queued before
    /// this call has been processed.
    ///
    /// # Errors
    ///
    /// Returns `HubError::Closed` if the hub has shut down.
    pub async fn connection_count(&self) -> Result<usize, HubError> {
        let (tx, rx) = oneshot::channel();
        self.send(HubCommand::Count(tx))?;
        rx.await.map_err(|_| HubError::Closed)
    }

    /// Stop the hub: already queued commands are processed, then every
    /// connection is closed. Resolves once the hub has stopped; calling it on
    /// a stopped hub returns immediately.
    pub async fn shutdown(&self) {
        let (tx, rx) = oneshot::channel();
        if self.send(HubCommand::Shutdown(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    fn send(&self, command: HubCommand) -> Result<(), HubError> {
        self.commands.send(command).map_err(|_| HubError::Closed)
    }
}
