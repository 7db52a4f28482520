//! Seams to the external proximity SDK.
//!
//! The bridge never talks to BLE hardware, the location engine or the
//! vendor backend directly. Each capability is a trait here; the
//! composition root injects implementations. [`memory`] provides an
//! in-process implementation used by the demo host and the tests.

pub mod memory;

use std::fmt;

use async_trait::async_trait;

use crate::config::SdkConfig;
use crate::domain::{DeviceSnapshot, PermissionSnapshot, RadioPowerState, ShopSnapshot, Token};

/// Failure reported by the external SDK.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct SdkError(pub String);

impl SdkError {
    /// Creates an error from any message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// SDK lifecycle: setup, backend sync, beeper start.
#[async_trait]
pub trait ProximitySdk: Send + Sync + fmt::Debug {
    /// Applies the host's setup.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError`] if the SDK rejects the configuration.
    fn configure(&self, config: &SdkConfig) -> Result<(), SdkError>;

    /// Refreshes the local catalog cache from the backend.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError`] if the sync fails.
    async fn sync(&self) -> Result<(), SdkError>;

    /// Starts the beeper (advertising and background scanning).
    ///
    /// # Errors
    ///
    /// Returns [`SdkError`] if the beeper cannot start.
    fn start_beeper(&self) -> Result<(), SdkError>;
}

/// Derives tokens from host-supplied hex strings.
pub trait TokenGenerator: Send + Sync + fmt::Debug {
    /// Returns `None` if `hex` is empty or malformed.
    fn create(&self, hex: &str) -> Option<Token>;
}

/// Generator that decodes the hex string into the raw token bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexTokenGenerator;

impl TokenGenerator for HexTokenGenerator {
    fn create(&self, hex: &str) -> Option<Token> {
        Token::from_hex(hex)
    }
}

/// Locker scanning and unlock engine.
///
/// Start and stop are fire-and-forget from the bridge's point of view.
#[async_trait]
pub trait LockerEngine: Send + Sync + fmt::Debug {
    /// Starts scanning for devices that accept any of `tokens`.
    fn start_search(&self, tokens: &[Token]);

    /// Stops scanning.
    fn stop_search(&self);

    /// Devices currently in range.
    fn visible_devices(&self) -> Vec<DeviceSnapshot>;

    /// Applies `token` to a nearby locker and returns the raw unlock result.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError`] if no locker accepted the token.
    async fn apply(&self, token: Token) -> Result<Vec<u8>, SdkError>;
}

/// Receives radio power changes from the platform.
pub trait RadioDelegate: Send + Sync + fmt::Debug {
    /// Called on every power state change.
    fn on_power_state_changed(&self, state: RadioPowerState);
}

/// Platform Bluetooth radio.
pub trait RadioAdapter: Send + Sync + fmt::Debug {
    /// Current power state.
    fn power_state(&self) -> RadioPowerState;

    /// Installs the delegate notified on state changes.
    fn set_delegate(&self, delegate: std::sync::Arc<dyn RadioDelegate>);
}

/// Geofencing engine.
pub trait LocationEngine: Send + Sync + fmt::Debug {
    /// Shops the user is currently inside.
    fn entered_shops(&self) -> Vec<ShopSnapshot>;
}

/// Runtime permissions the platform grants the SDK.
pub trait PlatformPermissions: Send + Sync + fmt::Debug {
    /// Current grant state.
    fn snapshot(&self) -> PermissionSnapshot;

    /// Asks the platform to prompt for the missing permissions. The outcome
    /// is observed through later [`snapshot`](Self::snapshot) calls.
    fn request(&self);
}
