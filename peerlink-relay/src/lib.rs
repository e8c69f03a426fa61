//! Peerlink relay server library.
//!
//! Exposes the signaling relay for use in tests and embedding.
//! The relay accepts WebSocket connections, assigns each client a random
//! identifier, announces joins to existing peers, and forwards JSON
//! messages between clients addressed by identifier.

pub mod config;
pub mod registry;
pub mod relay;
