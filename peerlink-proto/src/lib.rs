//! Shared protocol definitions for the Peerlink signaling wire format.

pub mod envelope;
pub mod event;
pub mod id;

pub use envelope::Envelope;
pub use event::ServerEvent;
pub use id::ClientId;
