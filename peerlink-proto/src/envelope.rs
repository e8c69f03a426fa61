//! The routed-message envelope and its JSON codec.
//!
//! Clients address each other by identifier: any JSON object carrying a
//! `target` field is forwarded verbatim to the client owning that
//! identifier, with a `sender` field attached by the relay. The relay
//! validates only the fields it manages; everything else is opaque payload
//! (SDP offers/answers, ICE candidates, application data).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::id::ClientId;

/// Error type for envelope encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// The frame is not a JSON object with a string `target` field.
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A client-to-client message routed through the relay.
///
/// `target` is required and validated at the boundary; `sender` is set by
/// the relay before forwarding, overwriting any client-supplied value. All
/// remaining fields are carried through unaltered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Identifier of the addressed recipient.
    pub target: ClientId,
    /// Identifier of the originating client. Stamped by the relay; any
    /// value supplied by the sender is discarded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<ClientId>,
    /// Free-form payload fields, forwarded without inspection.
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// Decodes an [`Envelope`] from a JSON text frame.
///
/// # Errors
///
/// Returns [`EnvelopeError::Malformed`] if the text is not valid JSON or
/// lacks a string `target` field.
pub fn decode(text: &str) -> Result<Envelope, EnvelopeError> {
    Ok(serde_json::from_str(text)?)
}

/// Encodes an [`Envelope`] into a JSON text frame.
///
/// # Errors
///
/// Returns [`EnvelopeError::Malformed`] if a payload value cannot be
/// serialized (e.g. a non-finite float).
pub fn encode(envelope: &Envelope) -> Result<String, EnvelopeError> {
    Ok(serde_json::to_string(envelope)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_minimal() {
        let envelope = decode(r#"{"target":"b2"}"#).unwrap();
        assert_eq!(envelope.target, ClientId::from("b2"));
        assert!(envelope.sender.is_none());
        assert!(envelope.rest.is_empty());
    }

    #[test]
    fn decode_preserves_payload_fields() {
        let envelope =
            decode(r#"{"target":"b2","type":"offer","sdp":"v=0...","n":7}"#).unwrap();
        assert_eq!(envelope.rest.get("type"), Some(&json!("offer")));
        assert_eq!(envelope.rest.get("sdp"), Some(&json!("v=0...")));
        assert_eq!(envelope.rest.get("n"), Some(&json!(7)));
    }

    #[test]
    fn decode_missing_target_fails() {
        assert!(decode(r#"{"type":"offer","sdp":"..."}"#).is_err());
    }

    #[test]
    fn decode_non_string_target_fails() {
        assert!(decode(r#"{"target":42}"#).is_err());
    }

    #[test]
    fn decode_non_object_fails() {
        assert!(decode("[1,2,3]").is_err());
        assert!(decode("not json").is_err());
        assert!(decode("").is_err());
    }

    #[test]
    fn client_supplied_sender_is_captured_for_overwrite() {
        let mut envelope = decode(r#"{"target":"b2","sender":"spoofed"}"#).unwrap();
        assert_eq!(envelope.sender, Some(ClientId::from("spoofed")));
        envelope.sender = Some(ClientId::from("a1"));
        let value: Value = serde_json::from_str(&encode(&envelope).unwrap()).unwrap();
        assert_eq!(value["sender"], json!("a1"));
    }

    #[test]
    fn encode_round_trips_nested_payload() {
        let original = decode(
            r#"{"target":"b2","candidate":{"sdpMid":"0","candidate":"candidate:1"}}"#,
        )
        .unwrap();
        let decoded = decode(&encode(&original).unwrap()).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn encode_omits_absent_sender() {
        let envelope = decode(r#"{"target":"b2","x":1}"#).unwrap();
        let value: Value = serde_json::from_str(&encode(&envelope).unwrap()).unwrap();
        assert_eq!(value, json!({ "target": "b2", "x": 1 }));
    }
}
