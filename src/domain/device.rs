//! Point-in-time snapshots of locker devices and shops.
//!
//! Snapshots are taken when the engine emits an event and are never
//! mutated afterwards; the builder methods consume `self` and are only used
//! while constructing one.

use serde::{Deserialize, Serialize};

/// Connection state of a locker device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionStatus {
    /// A connection is established.
    Connected,
    /// A connection attempt is in progress.
    Connecting,
    /// No connection.
    #[default]
    NotConnected,
}

/// State of a single lock on a locker device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LockState {
    /// The lock is closed.
    Locked,
    /// The lock is open.
    Unlocked,
    /// The device did not report the lock.
    Unknown,
}

/// Immutable snapshot of a locker device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSnapshot {
    device_id: u64,
    shop_name: String,
    is_connectable: bool,
    connection_status: ConnectionStatus,
    user_data: Option<String>,
    lock_statuses: Vec<LockState>,
}

impl DeviceSnapshot {
    /// Creates a non-connectable, disconnected snapshot with no locks.
    #[must_use]
    pub fn new(device_id: u64, shop_name: impl Into<String>) -> Self {
        Self {
            device_id,
            shop_name: shop_name.into(),
            is_connectable: false,
            connection_status: ConnectionStatus::NotConnected,
            user_data: None,
            lock_statuses: Vec::new(),
        }
    }

    /// Sets whether the device accepts connections.
    #[must_use]
    pub fn connectable(mut self, is_connectable: bool) -> Self {
        self.is_connectable = is_connectable;
        self
    }

    /// Sets the connection status.
    #[must_use]
    pub fn with_connection_status(mut self, status: ConnectionStatus) -> Self {
        self.connection_status = status;
        self
    }

    /// Attaches the device's user data string.
    #[must_use]
    pub fn with_user_data(mut self, user_data: impl Into<String>) -> Self {
        self.user_data = Some(user_data.into());
        self
    }

    /// Sets the ordered lock statuses.
    #[must_use]
    pub fn with_lock_statuses(mut self, lock_statuses: Vec<LockState>) -> Self {
        self.lock_statuses = lock_statuses;
        self
    }

    /// Device identifier.
    #[must_use]
    pub const fn device_id(&self) -> u64 {
        self.device_id
    }

    /// Name of the shop the device belongs to.
    #[must_use]
    pub fn shop_name(&self) -> &str {
        &self.shop_name
    }

    /// Whether the device accepts connections.
    #[must_use]
    pub const fn is_connectable(&self) -> bool {
        self.is_connectable
    }

    /// Connection status at snapshot time.
    #[must_use]
    pub const fn connection_status(&self) -> ConnectionStatus {
        self.connection_status
    }

    /// User data, if the device carries any.
    #[must_use]
    pub fn user_data(&self) -> Option<&str> {
        self.user_data.as_deref()
    }

    /// Lock statuses in device order.
    #[must_use]
    pub fn lock_statuses(&self) -> &[LockState] {
        &self.lock_statuses
    }
}

/// Short device description returned by `getNearbyDevices`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSummary {
    /// Device identifier.
    pub device_id: u64,
    /// Name of the shop the device belongs to.
    pub shop_name: String,
    /// Whether the device accepts connections.
    pub is_connectable: bool,
}

impl From<&DeviceSnapshot> for DeviceSummary {
    fn from(device: &DeviceSnapshot) -> Self {
        Self {
            device_id: device.device_id,
            shop_name: device.shop_name.clone(),
            is_connectable: device.is_connectable,
        }
    }
}

/// Immutable snapshot of a shop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopSnapshot {
    /// Shop identifier.
    pub shop_id: u64,
    /// Display name.
    pub shop_name: String,
}

impl ShopSnapshot {
    /// Creates a shop snapshot.
    #[must_use]
    pub fn new(shop_id: u64, shop_name: impl Into<String>) -> Self {
        Self {
            shop_id,
            shop_name: shop_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_every_field() {
        let device = DeviceSnapshot::new(7, "Kiosk")
            .connectable(true)
            .with_connection_status(ConnectionStatus::Connecting)
            .with_user_data("cell-3")
            .with_lock_statuses(vec![LockState::Locked, LockState::Unlocked]);
        assert_eq!(device.device_id(), 7);
        assert_eq!(device.shop_name(), "Kiosk");
        assert!(device.is_connectable());
        assert_eq!(device.connection_status(), ConnectionStatus::Connecting);
        assert_eq!(device.user_data(), Some("cell-3"));
        assert_eq!(
            device.lock_statuses(),
            &[LockState::Locked, LockState::Unlocked]
        );
    }

    #[test]
    fn summary_serializes_camel_case() {
        let device = DeviceSnapshot::new(42, "Main St").connectable(true);
        let json = serde_json::to_value(DeviceSummary::from(&device)).unwrap_or_default();
        assert_eq!(
            json,
            serde_json::json!({ "deviceId": 42, "shopName": "Main St", "isConnectable": true })
        );
    }

    #[test]
    fn shop_serializes_camel_case() {
        let json = serde_json::to_value(ShopSnapshot::new(3, "Cafe")).unwrap_or_default();
        assert_eq!(json, serde_json::json!({ "shopId": 3, "shopName": "Cafe" }));
    }
}
