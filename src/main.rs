//! beacon-bridge server entry point.
//!
//! Composes the bridge over the in-memory SDK and serves the WebSocket
//! host transport.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use beacon_bridge::api;
use beacon_bridge::app_state::AppState;
use beacon_bridge::bridge::BeaconBridge;
use beacon_bridge::config::{BridgeConfig, LogFormat};
use beacon_bridge::domain::RadioPowerState;
use beacon_bridge::sdk::memory::MemoryBackend;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = BridgeConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting beacon-bridge");

    // Build SDK backend and broker
    let backend = MemoryBackend::new(RadioPowerState::PoweredOn);
    let services = backend.services(config.radio_settle_delay);

    // Build application state
    let app_state = AppState {
        bridge: Arc::new(BeaconBridge::new(services)),
    };

    // Build router
    let app = api::build_app(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
