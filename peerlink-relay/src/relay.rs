//! Relay server core: shared state, WebSocket handler, and message routing.
//!
//! The relay accepts WebSocket connections and assigns each client a random
//! identifier. A new client immediately receives an `init` event naming its
//! identifier and the identifiers of all existing peers, and everyone else
//! receives a `new-peer` event. Afterwards, any JSON text frame carrying a
//! `target` field is forwarded to the client owning that identifier with a
//! `sender` field stamped on. Unknown or unreachable targets are dropped
//! silently; the protocol has no error or ack frames.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use peerlink_proto::{ClientId, ServerEvent, envelope};

use crate::registry::ClientRegistry;

/// Shared relay server state holding the client registry.
#[derive(Default)]
pub struct RelayState {
    /// Registry of currently connected clients.
    pub registry: ClientRegistry,
}

impl RelayState {
    /// Creates a new relay state with an empty client registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Handles an upgraded WebSocket connection for a single client.
///
/// The connection lifecycle:
/// 1. Generate an identifier and register the client.
/// 2. Send the client its `init` event (own id plus existing peer ids).
/// 3. Broadcast `new-peer` to all other clients.
/// 4. Enter the message loop, routing envelopes to their targets.
/// 5. On disconnect, unregister the client. Peers are not notified of the
///    departure; they detect liveness through their own peer connections.
pub async fn handle_socket(socket: WebSocket, state: Arc<RelayState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let client_id = ClientId::generate();

    // Create a channel feeding this client's WebSocket writer task.
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Message>();

    // Snapshot of peers connected strictly before this client, taken
    // atomically with the insertion.
    let other_client_ids = state.registry.register(&client_id, tx).await;

    tracing::info!(client_id = %client_id, peers = other_client_ids.len(), "client connected");

    // The client learns its own identity before any peer hears about it.
    let init = ServerEvent::Init {
        id: client_id.clone(),
        other_client_ids,
    };
    if let Err(e) = send_event(&mut ws_sender, &init).await {
        tracing::warn!(client_id = %client_id, error = %e, "failed to send init event");
        state.registry.unregister(&client_id).await;
        return;
    }

    let new_peer = ServerEvent::NewPeer {
        id: client_id.clone(),
    };
    match new_peer.to_json() {
        Ok(json) => {
            state
                .registry
                .broadcast(&Message::Text(json.into()), &client_id)
                .await;
        }
        Err(e) => {
            tracing::error!(client_id = %client_id, error = %e, "failed to encode new-peer event");
        }
    }

    // Writer task: forward messages from the channel to the WebSocket.
    let writer_id = client_id.clone();
    let mut write_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                tracing::warn!(client_id = %writer_id, "WebSocket write failed");
                break;
            }
        }
    });

    // Reader task: process incoming frames from this client.
    let reader_id = client_id.clone();
    let reader_state = Arc::clone(&state);
    let mut read_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_receiver.next().await {
            match msg {
                Message::Text(text) => {
                    handle_text_frame(&reader_id, text.as_str(), &reader_state).await;
                }
                Message::Close(_) => {
                    tracing::info!(client_id = %reader_id, "received close frame");
                    break;
                }
                _ => {
                    // Ignore binary, ping, pong frames.
                }
            }
        }
    });

    // Wait for either task to finish, then abort the other.
    tokio::select! {
        _ = &mut read_task => {
            write_task.abort();
        }
        _ = &mut write_task => {
            read_task.abort();
        }
    }

    state.registry.unregister(&client_id).await;
    tracing::info!(client_id = %client_id, "client disconnected and unregistered");
}

/// Handles a text frame from a connected client: decode, stamp, forward.
///
/// Malformed frames are dropped with a warning and the connection stays
/// open. A `target` that is unknown or no longer writable makes the frame a
/// silent no-op; the sender is not told either way.
async fn handle_text_frame(client_id: &ClientId, text: &str, state: &Arc<RelayState>) {
    let mut env = match envelope::decode(text) {
        Ok(env) => env,
        Err(e) => {
            tracing::warn!(client_id = %client_id, error = %e, "dropping malformed frame");
            return;
        }
    };

    let Some(recipient) = state.registry.sender_of(&env.target).await else {
        tracing::debug!(
            client_id = %client_id,
            target = %env.target,
            "target not connected or not open, dropping message"
        );
        return;
    };

    // Stamp the registered identifier, discarding any client-supplied value.
    env.sender = Some(client_id.clone());

    match envelope::encode(&env) {
        Ok(json) => {
            tracing::debug!(client_id = %client_id, target = %env.target, "relaying message");
            if recipient.send(Message::Text(json.into())).is_err() {
                tracing::debug!(target = %env.target, "recipient channel closed, message dropped");
            }
        }
        Err(e) => {
            tracing::warn!(client_id = %client_id, error = %e, "failed to re-encode envelope");
        }
    }
}

/// Encodes a server event and sends it directly on a WebSocket sink.
async fn send_event(
    ws_sender: &mut (impl SinkExt<Message, Error = axum::Error> + Unpin),
    event: &ServerEvent,
) -> Result<(), String> {
    let json = event.to_json().map_err(|e| e.to_string())?;
    ws_sender
        .send(Message::Text(json.into()))
        .await
        .map_err(|e| format!("WebSocket send error: {e}"))
}

/// Starts the relay server on the given address and returns the bound
/// address and a join handle.
///
/// This is the primary entry point used by both `main.rs` and test code.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    start_server_with_state(addr, Arc::new(RelayState::new())).await
}

/// Starts the relay server with a pre-configured [`RelayState`].
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state(
    addr: &str,
    state: Arc<RelayState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = axum::Router::new()
        .route("/", axum::routing::get(ws_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "relay server error");
        }
    });

    Ok((bound_addr, handle))
}

/// Starts the relay server in-process for testing.
///
/// Binds to `127.0.0.1:0` (OS-assigned port) and returns the bound address
/// and a [`tokio::task::JoinHandle`] for cleanup.
#[cfg(test)]
pub async fn start_test_server() -> (std::net::SocketAddr, tokio::task::JoinHandle<()>) {
    start_server("127.0.0.1:0")
        .await
        .expect("failed to start test server")
}

/// axum handler that upgrades an HTTP request to a WebSocket connection.
async fn ws_handler(
    ws: axum::extract::ws::WebSocketUpgrade,
    axum::extract::State(state): axum::extract::State<Arc<RelayState>>,
) -> impl axum::response::IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}
