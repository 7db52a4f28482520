//! Platform permission state.

use serde::Serialize;

/// Whether the platform lets the SDK use the radio and location services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSnapshot {
    /// Bluetooth scan, connect and advertise are granted.
    pub is_bt_ready: bool,
    /// Location access is granted.
    pub is_location_granted: bool,
}

impl PermissionSnapshot {
    /// Every permission granted.
    pub const GRANTED: Self = Self {
        is_bt_ready: true,
        is_location_granted: true,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_host_field_names() {
        let snapshot = PermissionSnapshot {
            is_bt_ready: true,
            is_location_granted: false,
        };
        assert_eq!(
            serde_json::to_value(snapshot).unwrap_or_default(),
            json!({ "isBtReady": true, "isLocationGranted": false })
        );
    }
}
