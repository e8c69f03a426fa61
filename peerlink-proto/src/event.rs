//! Server-originated events pushed to clients as JSON text frames.

use serde::{Deserialize, Serialize};

use crate::id::ClientId;

/// Events the relay sends to clients on its own initiative.
///
/// Clients never send these; everything client-originated goes through the
/// routed [`Envelope`](crate::envelope::Envelope) instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Sent to a client immediately after its connection is accepted.
    Init {
        /// The identifier assigned to the receiving client.
        id: ClientId,
        /// Identifiers of all clients connected strictly before this one
        /// and still connected at the time of its connection.
        #[serde(rename = "otherClientIds")]
        other_client_ids: Vec<ClientId>,
    },

    /// Broadcast to every existing client when a new client connects.
    NewPeer {
        /// The identifier of the newly connected client.
        id: ClientId,
    },
}

impl ServerEvent {
    /// Encodes the event as a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails, which for these types only
    /// happens on allocation failure.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
