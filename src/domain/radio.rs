//! Bluetooth radio power states.
//!
//! The radio subsystem reports a rich [`RadioPowerState`]; hosts only ever
//! see the collapsed [`RadioEventState`].

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Raw power state as reported by the platform radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RadioPowerState {
    /// Radio is on and usable.
    PoweredOn,
    /// Radio is switched off.
    PoweredOff,
    /// Radio stack is restarting.
    Resetting,
    /// The app may not use the radio.
    Unauthorized,
    /// The device has no usable radio.
    Unsupported,
    /// State has not been determined yet.
    Unknown,
}

/// Binary radio state delivered to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RadioEventState {
    /// The radio is powered on.
    Enabled,
    /// Any state other than powered on.
    Disabled,
}

impl RadioEventState {
    /// Returns the state as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
        }
    }

    /// Host payload: `{"state": "enabled"}`.
    #[must_use]
    pub fn to_payload(self) -> Value {
        json!({ "state": self.as_str() })
    }
}

impl From<RadioPowerState> for RadioEventState {
    fn from(state: RadioPowerState) -> Self {
        match state {
            RadioPowerState::PoweredOn => Self::Enabled,
            RadioPowerState::PoweredOff
            | RadioPowerState::Resetting
            | RadioPowerState::Unauthorized
            | RadioPowerState::Unsupported
            | RadioPowerState::Unknown => Self::Disabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_powered_on_is_enabled() {
        assert_eq!(
            RadioEventState::from(RadioPowerState::PoweredOn),
            RadioEventState::Enabled
        );
        for state in [
            RadioPowerState::PoweredOff,
            RadioPowerState::Resetting,
            RadioPowerState::Unauthorized,
            RadioPowerState::Unsupported,
            RadioPowerState::Unknown,
        ] {
            assert_eq!(RadioEventState::from(state), RadioEventState::Disabled);
        }
    }

    #[test]
    fn payload_shape() {
        assert_eq!(
            RadioEventState::Disabled.to_payload(),
            json!({ "state": "disabled" })
        );
    }
}
