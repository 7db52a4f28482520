//! Host action names.

use std::fmt;
use std::str::FromStr;

use crate::error::BridgeError;

/// Operation requested by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Online SDK setup.
    InitSdk,
    /// Offline SDK setup.
    InitWithOfflineConfig,
    /// Platform permission snapshot.
    IsPermissionGranted,
    /// Prompt for missing platform permissions.
    RequestPermissions,
    /// Start the beeper (location monitoring and device advertising).
    EnableBeeper,
    /// Apply a token to a nearby locker.
    ApplyToken,
    /// Start a device search and stream its events.
    SearchDevices,
    /// Stop the device search.
    StopSearching,
    /// One-shot radio state query.
    BluetoothState,
    /// Stream radio state changes.
    SubscribeBluetoothEvents,
    /// Stop the radio stream.
    UnsubscribeBluetoothEvents,
    /// Stream shop enter/exit events.
    SubscribeToLocations,
    /// Stop the location stream.
    UnsubscribeFromLocations,
    /// Shops the user is inside.
    GetEnteredShops,
    /// Devices currently in range.
    GetNearbyDevices,
    /// Stream SDK log lines.
    SubscribeLogEvents,
    /// Stop the log stream.
    UnsubscribeLogEvents,
}

impl Action {
    /// Every action, in host table order.
    pub const ALL: [Self; 17] = [
        Self::InitSdk,
        Self::InitWithOfflineConfig,
        Self::IsPermissionGranted,
        Self::RequestPermissions,
        Self::EnableBeeper,
        Self::ApplyToken,
        Self::SearchDevices,
        Self::StopSearching,
        Self::BluetoothState,
        Self::SubscribeBluetoothEvents,
        Self::UnsubscribeBluetoothEvents,
        Self::SubscribeToLocations,
        Self::UnsubscribeFromLocations,
        Self::GetEnteredShops,
        Self::GetNearbyDevices,
        Self::SubscribeLogEvents,
        Self::UnsubscribeLogEvents,
    ];

    /// Wire name of the action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InitSdk => "initSDK",
            Self::InitWithOfflineConfig => "initWithOfflineConfig",
            Self::IsPermissionGranted => "isPermissionGranted",
            Self::RequestPermissions => "requestPermissions",
            Self::EnableBeeper => "enableBeeper",
            Self::ApplyToken => "applyToken",
            Self::SearchDevices => "searchDevices",
            Self::StopSearching => "stopSearching",
            Self::BluetoothState => "bluetoothState",
            Self::SubscribeBluetoothEvents => "subscribeBluetoothEvents",
            Self::UnsubscribeBluetoothEvents => "unsubscribeBluetoothEvents",
            Self::SubscribeToLocations => "subscribeToLocations",
            Self::UnsubscribeFromLocations => "unsubscribeFromLocations",
            Self::GetEnteredShops => "getEnteredShops",
            Self::GetNearbyDevices => "getNearbyDevices",
            Self::SubscribeLogEvents => "subscribeLogEvents",
            Self::UnsubscribeLogEvents => "unsubscribeLogEvents",
        }
    }

    /// Returns `true` if the SDK must be initialized first.
    ///
    /// The radio and the permissions are platform facilities, so their
    /// actions work before init.
    #[must_use]
    pub const fn requires_init(&self) -> bool {
        !matches!(
            self,
            Self::InitSdk
                | Self::InitWithOfflineConfig
                | Self::IsPermissionGranted
                | Self::RequestPermissions
                | Self::BluetoothState
                | Self::SubscribeBluetoothEvents
                | Self::UnsubscribeBluetoothEvents
        )
    }
}

impl FromStr for Action {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| BridgeError::UnknownAction(s.to_string()))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
