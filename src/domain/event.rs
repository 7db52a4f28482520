//! Domain events produced by the SDK's event sources.
//!
//! Every event belongs to exactly one [`Topic`]. The broker forwards events
//! to the host without interpreting them; [`DomainEvent::to_payload`] is the
//! only place their host-facing JSON shape is defined.

use serde::Serialize;
use serde_json::{Value, json};

use super::{DeviceSnapshot, RadioEventState, ShopSnapshot, Topic};

/// Lifecycle transition of a locker device, as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DeviceEventKind {
    /// The device came into range.
    Detected,
    /// Connectivity or advertised state changed.
    StateChanged,
    /// One of the device's locks changed state.
    LockStateChanged,
    /// The device went out of range.
    Lost,
}

impl DeviceEventKind {
    /// Host-facing status string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Detected => "DeviceDetected",
            Self::StateChanged => "DeviceStateChanged",
            Self::LockStateChanged => "DeviceLockStateChanged",
            Self::Lost => "DeviceLost",
        }
    }
}

/// Kind of a location engine event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GeofenceEventKind {
    /// Entered a shop.
    Entered,
    /// Left a shop.
    Exited,
    /// Entered a merchant area.
    MerchantEntered,
    /// Left a merchant area.
    MerchantExited,
}

impl GeofenceEventKind {
    /// Host-facing event name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Entered => "onShopEntered",
            Self::Exited => "onShopExit",
            Self::MerchantEntered => "onMerchantEntered",
            Self::MerchantExited => "onMerchantExit",
        }
    }
}

/// Location engine event. Carries a shop only for shop enter/exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeofenceEvent {
    kind: GeofenceEventKind,
    shop: Option<ShopSnapshot>,
}

impl GeofenceEvent {
    /// Entered `shop`.
    #[must_use]
    pub const fn entered(shop: ShopSnapshot) -> Self {
        Self {
            kind: GeofenceEventKind::Entered,
            shop: Some(shop),
        }
    }

    /// Left `shop`.
    #[must_use]
    pub const fn exited(shop: ShopSnapshot) -> Self {
        Self {
            kind: GeofenceEventKind::Exited,
            shop: Some(shop),
        }
    }

    /// Entered a merchant area.
    #[must_use]
    pub const fn merchant_entered() -> Self {
        Self {
            kind: GeofenceEventKind::MerchantEntered,
            shop: None,
        }
    }

    /// Left a merchant area.
    #[must_use]
    pub const fn merchant_exited() -> Self {
        Self {
            kind: GeofenceEventKind::MerchantExited,
            shop: None,
        }
    }

    /// Event kind.
    #[must_use]
    pub const fn kind(&self) -> GeofenceEventKind {
        self.kind
    }

    /// Shop, for shop enter/exit events.
    #[must_use]
    pub const fn shop(&self) -> Option<&ShopSnapshot> {
        self.shop.as_ref()
    }
}

/// One SDK log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// Component that produced the line.
    pub tag: String,
    /// Log message.
    pub message: String,
}

/// Event produced by a topic event source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    /// Radio power changed.
    Radio {
        /// New collapsed state.
        state: RadioEventState,
    },
    /// Locker device transition.
    Device {
        /// Transition kind.
        kind: DeviceEventKind,
        /// Device state at emission time.
        device: DeviceSnapshot,
    },
    /// Shop or merchant enter/exit.
    Geofence(GeofenceEvent),
    /// SDK log line.
    Log(LogLine),
}

impl DomainEvent {
    /// Returns the topic this event is delivered on.
    #[must_use]
    pub const fn topic(&self) -> Topic {
        match self {
            Self::Radio { .. } => Topic::RadioState,
            Self::Device { .. } => Topic::DeviceSearch,
            Self::Geofence(_) => Topic::GeofenceEvents,
            Self::Log(_) => Topic::LogStream,
        }
    }

    /// Builds the JSON payload delivered to the host.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        match self {
            Self::Radio { state } => state.to_payload(),
            Self::Device { kind, device } => json!({
                "deviceId": device.device_id(),
                "shopName": device.shop_name(),
                "isConnectable": device.is_connectable(),
                "connectionStatus": device.connection_status(),
                "status": kind.as_str(),
                "userData": device.user_data().unwrap_or_default(),
                "lockStatuses": device.lock_statuses(),
            }),
            Self::Geofence(event) => match event.shop() {
                Some(shop) => json!({ "event": event.kind().as_str(), "shop": shop }),
                None => json!({ "event": event.kind().as_str() }),
            },
            Self::Log(line) => Value::String(format!("{}: {}", line.tag, line.message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LockState;

    #[test]
    fn topic_accessor() {
        let device = DomainEvent::Device {
            kind: DeviceEventKind::Lost,
            device: DeviceSnapshot::new(1, "A"),
        };
        assert_eq!(device.topic(), Topic::DeviceSearch);
        let radio = DomainEvent::Radio {
            state: RadioEventState::Enabled,
        };
        assert_eq!(radio.topic(), Topic::RadioState);
        let shop = DomainEvent::Geofence(GeofenceEvent::merchant_exited());
        assert_eq!(shop.topic(), Topic::GeofenceEvents);
    }

    #[test]
    fn device_payload_shape() {
        let event = DomainEvent::Device {
            kind: DeviceEventKind::LockStateChanged,
            device: DeviceSnapshot::new(9, "Depot")
                .connectable(true)
                .with_lock_statuses(vec![LockState::Unlocked]),
        };
        let payload = event.to_payload();
        assert_eq!(payload["deviceId"], 9);
        assert_eq!(payload["shopName"], "Depot");
        assert_eq!(payload["isConnectable"], true);
        assert_eq!(payload["connectionStatus"], "notConnected");
        assert_eq!(payload["status"], "DeviceLockStateChanged");
        assert_eq!(payload["userData"], "");
        assert_eq!(payload["lockStatuses"], json!(["unlocked"]));
    }

    #[test]
    fn geofence_payload_includes_shop_only_when_present() {
        let entered = DomainEvent::Geofence(GeofenceEvent::entered(ShopSnapshot::new(5, "Deli")));
        assert_eq!(
            entered.to_payload(),
            json!({ "event": "onShopEntered", "shop": { "shopId": 5, "shopName": "Deli" } })
        );
        let merchant = DomainEvent::Geofence(GeofenceEvent::merchant_entered());
        assert_eq!(merchant.to_payload(), json!({ "event": "onMerchantEntered" }));
    }

    #[test]
    fn log_payload_is_tagged_string() {
        let event = DomainEvent::Log(LogLine {
            tag: "Scanner".to_string(),
            message: "started".to_string(),
        });
        assert_eq!(event.to_payload(), json!("Scanner: started"));
    }
}
