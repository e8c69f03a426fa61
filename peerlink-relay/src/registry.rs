//! In-memory registry of currently connected clients.
//!
//! The [`ClientRegistry`] maps each assigned identifier to the sender half
//! of the channel feeding that client's WebSocket writer task. Entries are
//! created when a connection is accepted and removed when it closes for any
//! reason; identifiers are immutable for the lifetime of an entry.

use std::collections::HashMap;

use axum::extract::ws::Message;
use peerlink_proto::ClientId;
use tokio::sync::{RwLock, mpsc};

/// Registry of live connections, keyed by client identifier.
///
/// The map key guarantees no duplicate identifiers at any instant. A closed
/// channel (the writer task has exited) marks a connection as no longer
/// writable; such clients are skipped when routing and broadcasting, and
/// their entries are removed when the connection handler unwinds.
#[derive(Default)]
pub struct ClientRegistry {
    connections: RwLock<HashMap<ClientId, mpsc::UnboundedSender<Message>>>,
}

impl ClientRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a client, returning the identifiers of all clients that
    /// were connected strictly before it.
    ///
    /// The snapshot is taken and the entry inserted under a single write
    /// lock, so a concurrently connecting client either appears in the
    /// snapshot or sees this one in its own — never both, never neither.
    pub async fn register(
        &self,
        id: &ClientId,
        sender: mpsc::UnboundedSender<Message>,
    ) -> Vec<ClientId> {
        let mut conns = self.connections.write().await;
        let others: Vec<ClientId> = conns.keys().cloned().collect();
        conns.insert(id.clone(), sender);
        others
    }

    /// Removes a client from the registry, returning whether it was present.
    pub async fn unregister(&self, id: &ClientId) -> bool {
        let mut conns = self.connections.write().await;
        conns.remove(id).is_some()
    }

    /// Returns a clone of the sender for the given identifier, if the client
    /// is registered and its channel is still open.
    pub async fn sender_of(&self, id: &ClientId) -> Option<mpsc::UnboundedSender<Message>> {
        let conns = self.connections.read().await;
        conns.get(id).filter(|tx| !tx.is_closed()).cloned()
    }

    /// Sends a message to every registered client except `exclude`.
    ///
    /// Clients whose channel has closed are skipped; delivery is
    /// fire-and-forget.
    pub async fn broadcast(&self, message: &Message, exclude: &ClientId) {
        let conns = self.connections.read().await;
        for (id, sender) in conns.iter() {
            if id == exclude {
                continue;
            }
            if sender.send(message.clone()).is_err() {
                tracing::debug!(client_id = %id, "skipping closed connection in broadcast");
            }
        }
    }

    /// Returns the number of currently registered clients.
    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Returns whether the registry holds no clients.
    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }
}
