//! WebSocket upgrade handler and per-connection tasks.

use std::net::SocketAddr;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::Response;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use super::events::{InboundEvent, OutboundEvent};
use super::hub::HubHandle;
use super::registry::{ConnectionId, Outgoing};

/// `GET /ws`: upgrade to a WebSocket and attach it to the hub.
pub async fn ws_endpoint(
    ws: WebSocketUpgrade,
    ConnectInfo(remote_addr): ConnectInfo<SocketAddr>,
    State(hub): State<HubHandle>,
) -> Response {
    ws.on_upgrade(move |socket| serve_connection(socket, remote_addr, hub))
}

/// Run one connection until either side goes away.
///
/// The welcome frame is written before the connection is registered, so it
/// always arrives first. Afterwards a writer task drains the outbox while this
/// task reads; whichever finishes first cancels the other, and the connection
/// is unregistered on the way out.
#[instrument(skip_all, fields(remote_addr = %remote_addr))]
async fn serve_connection(socket: WebSocket, remote_addr: SocketAddr, hub: HubHandle) {
    let (mut sender, receiver) = socket.split();

    let welcome = match serde_json::to_string(&OutboundEvent::welcome()) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "failed to serialize welcome message");
            return;
        }
    };
    if sender.send(Message::Text(welcome.into())).await.is_err() {
        debug!("client disconnected before welcome");
        return;
    }

    let Ok((id, outbox)) = hub.connect(remote_addr) else {
        let _ = sender.send(Message::Close(None)).await;
        return;
    };
    info!(connection_id = %id, "websocket connected");

    let mut write_task = tokio::spawn(write_outbox(sender, outbox));
    let mut read_task = tokio::spawn(read_events(receiver, id, hub.clone()));

    tokio::select! {
        _ = &mut write_task => read_task.abort(),
        _ = &mut read_task => write_task.abort(),
    }

    hub.unregister(id);
    info!(connection_id = %id, "websocket disconnected");
}

/// Forward queued frames to the socket until the outbox closes or a write
/// fails.
async fn write_outbox(
    mut sender: SplitSink<WebSocket, Message>,
    mut outbox: mpsc::Receiver<Outgoing>,
) {
    while let Some(outgoing) = outbox.recv().await {
        match outgoing {
            Outgoing::Text(text) => {
                if sender.send(Message::Text(text.to_string().into())).await.is_err() {
                    break;
                }
            }
            Outgoing::Close => {
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
        }
    }
}

/// Decode client frames and hand them to the hub. Ends on close, transport
/// error or the first frame that is not a valid event.
async fn read_events(mut receiver: SplitStream<WebSocket>, id: ConnectionId, hub: HubHandle) {
    while let Some(frame) = receiver.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!(connection_id = %id, error = %e, "websocket read failed");
                break;
            }
        };

        let event = match serde_json::from_str::<InboundEvent>(text.as_str()) {
            Ok(event) => event,
            Err(e) => {
                debug!(connection_id = %id, error = %e, "malformed event, closing connection");
                break;
            }
        };

        if hub.dispatch(id, event).is_err() {
            break;
        }
    }
}
