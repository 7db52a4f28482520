//! Subscription lanes.
//!
//! A [`Topic`] identifies an independent event lane. Every lane has its own
//! single-subscriber slot in the [`crate::broker::SubscriptionBroker`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Independent event lane with its own subscriber slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// Bluetooth radio enabled/disabled notifications.
    RadioState,
    /// Locker device lifecycle events during a search session.
    DeviceSearch,
    /// Shop and merchant enter/exit events from the location engine.
    GeofenceEvents,
    /// SDK log lines.
    LogStream,
}

impl Topic {
    /// Every topic, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::RadioState,
        Self::DeviceSearch,
        Self::GeofenceEvents,
        Self::LogStream,
    ];

    /// Returns the topic name as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RadioState => "radio_state",
            Self::DeviceSearch => "device_search",
            Self::GeofenceEvents => "geofence_events",
            Self::LogStream => "log_stream",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_serde_name() {
        for topic in Topic::ALL {
            let json = serde_json::to_string(&topic).unwrap_or_default();
            assert_eq!(json, format!("\"{topic}\""));
        }
    }
}
