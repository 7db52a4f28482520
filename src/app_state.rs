//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::bridge::BeaconBridge;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Bridge executing host commands.
    pub bridge: Arc<BeaconBridge>,
}
