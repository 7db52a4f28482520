//! WebSocket message types: envelope, host commands, callback frames.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::broker::CallbackFrame;

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for commands; server-generated otherwise.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: Value,
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Host → bridge command.
    Command,
    /// Bridge → host callback result.
    Callback,
    /// Bridge → host envelope error.
    Error,
}

/// Payload of a [`WsMessageType::Command`] envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostCommand {
    /// Callback every result of this command is addressed to.
    pub callback_id: String,
    /// Action name, e.g. `searchDevices`.
    pub action: String,
    /// Positional JSON arguments.
    #[serde(default)]
    pub args: Vec<Value>,
}

impl WsMessage {
    /// Wraps a dispatch queue frame for the host.
    #[must_use]
    pub fn callback(frame: &CallbackFrame) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            msg_type: WsMessageType::Callback,
            timestamp: Utc::now(),
            payload: serde_json::to_value(frame).unwrap_or_default(),
        }
    }

    /// Envelope-level error, for frames that never reached the bridge.
    #[must_use]
    pub fn error(id: impl Into<String>, code: u32, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            msg_type: WsMessageType::Error,
            timestamp: Utc::now(),
            payload: serde_json::json!({
                "code": code,
                "message": message.into(),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::broker::PluginResult;
    use serde_json::json;

    #[test]
    fn command_envelope_parses() {
        let raw = json!({
            "id": "req-1",
            "type": "command",
            "timestamp": "2025-01-01T00:00:00Z",
            "payload": {
                "callbackId": "cb-7",
                "action": "applyToken",
                "args": ["ab12"]
            }
        });
        let msg: Result<WsMessage, _> = serde_json::from_value(raw);
        let Ok(msg) = msg else {
            panic!("envelope rejected");
        };
        assert_eq!(msg.msg_type, WsMessageType::Command);
        let command: Result<HostCommand, _> = serde_json::from_value(msg.payload);
        assert_eq!(
            command.ok(),
            Some(HostCommand {
                callback_id: "cb-7".into(),
                action: "applyToken".into(),
                args: vec![json!("ab12")],
            })
        );
    }

    #[test]
    fn args_default_to_empty() {
        let command: Result<HostCommand, _> =
            serde_json::from_value(json!({ "callbackId": "c", "action": "stopSearching" }));
        assert!(command.is_ok_and(|c| c.args.is_empty()));
    }

    #[test]
    fn callback_envelope_shape() {
        let frame = CallbackFrame {
            callback_id: "cb-1".into(),
            result: PluginResult::ok_with(json!({ "state": "enabled" })).keep_alive(true),
        };
        let msg = WsMessage::callback(&frame);
        let value = serde_json::to_value(&msg).unwrap_or_default();
        assert_eq!(value["type"], "callback");
        assert_eq!(value["payload"]["callbackId"], "cb-1");
        assert_eq!(value["payload"]["status"], "ok");
        assert_eq!(value["payload"]["keepAlive"], true);
        assert_eq!(value["payload"]["payload"]["state"], "enabled");
    }
}
