//! Peerlink signaling relay server.
//!
//! An axum WebSocket server that assigns each connecting client a random
//! identifier and forwards JSON messages between clients addressed by
//! identifier, so peers can exchange session-negotiation data (SDP offers,
//! ICE candidates) before talking directly.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:8000
//! cargo run --bin peerlink-relay
//!
//! # Run on custom address
//! cargo run --bin peerlink-relay -- --bind 127.0.0.1:9090
//!
//! # Or via environment variable
//! PEERLINK_ADDR=127.0.0.1:9090 cargo run --bin peerlink-relay
//! ```

use std::sync::Arc;

use clap::Parser;
use peerlink_relay::config::{RelayCliArgs, RelayConfig};
use peerlink_relay::relay::{self, RelayState};

#[tokio::main]
async fn main() {
    let cli = RelayCliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match RelayConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing with the resolved log level.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(addr = %config.bind_addr, "starting peerlink signaling relay");

    let state = Arc::new(RelayState::new());

    match relay::start_server_with_state(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "signaling relay listening");
            if let Ok(ip) = local_ip_address::local_ip() {
                tracing::info!("reachable at ws://{ip}:{}", bound_addr.port());
            }
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "relay server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start relay server");
            std::process::exit(1);
        }
    }
}
