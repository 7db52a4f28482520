//! Host callback channels and the dispatch queue behind them.
//!
//! Every result the bridge sends to the host travels as a
//! [`CallbackFrame`] through one [`DispatchQueue`]. The queue has a single
//! consumer (the host transport), so writes to the host are never
//! concurrent with each other and frames arrive in the order they were
//! enqueued.

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::BridgeError;

/// Outcome status of a plugin result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResultStatus {
    /// The operation succeeded or an event is being delivered.
    Ok,
    /// The operation failed.
    Error,
    /// Nothing to report; used to close a keep-alive callback.
    NoResult,
}

/// Single result delivered to a host callback.
///
/// `keep_alive` tells the host to keep listening on the same callback for
/// further results instead of treating this one as final.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginResult {
    /// Outcome status.
    pub status: ResultStatus,
    /// Whether more results will follow on the same callback.
    pub keep_alive: bool,
    /// Optional JSON payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl PluginResult {
    /// Final success without payload.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            status: ResultStatus::Ok,
            keep_alive: false,
            payload: None,
        }
    }

    /// Final success carrying `payload`.
    #[must_use]
    pub const fn ok_with(payload: Value) -> Self {
        Self {
            status: ResultStatus::Ok,
            keep_alive: false,
            payload: Some(payload),
        }
    }

    /// Final failure carrying the error body of `err`.
    #[must_use]
    pub fn error(err: &BridgeError) -> Self {
        Self {
            status: ResultStatus::Error,
            keep_alive: false,
            payload: serde_json::to_value(err.body()).ok(),
        }
    }

    /// Terminal frame that closes a keep-alive callback.
    #[must_use]
    pub const fn terminator() -> Self {
        Self {
            status: ResultStatus::NoResult,
            keep_alive: false,
            payload: None,
        }
    }

    /// Sets the keep-alive flag.
    #[must_use]
    pub const fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Returns `true` if the host should stop listening after this result.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        !self.keep_alive
    }
}

/// A result addressed to one host callback.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackFrame {
    /// Host callback identifier.
    pub callback_id: String,
    /// The result itself.
    #[serde(flatten)]
    pub result: PluginResult,
}

/// Serialized queue of frames bound for the host.
#[derive(Debug, Clone)]
pub struct DispatchQueue {
    sender: mpsc::UnboundedSender<CallbackFrame>,
}

impl DispatchQueue {
    /// Creates a queue and the receiver its single consumer drains.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CallbackFrame>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Creates a channel for the host callback `callback_id`.
    #[must_use]
    pub fn channel(&self, callback_id: impl Into<String>) -> CallbackChannel {
        CallbackChannel {
            callback_id: callback_id.into(),
            queue: self.clone(),
        }
    }

    /// Returns `true` once the consumer has gone away.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Transport channel to one pending host callback.
#[derive(Debug, Clone)]
pub struct CallbackChannel {
    callback_id: String,
    queue: DispatchQueue,
}

impl CallbackChannel {
    /// Host callback identifier.
    #[must_use]
    pub fn callback_id(&self) -> &str {
        &self.callback_id
    }

    /// Returns `true` once the host transport behind this channel is gone.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }

    /// Enqueues `result` for the host.
    ///
    /// Returns `false` if the host transport is gone. The failure is not
    /// retried.
    pub fn send(&self, result: PluginResult) -> bool {
        let frame = CallbackFrame {
            callback_id: self.callback_id.clone(),
            result,
        };
        match self.queue.sender.send(frame) {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!(callback_id = %self.callback_id, "host gone, frame dropped");
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frames_arrive_in_send_order() {
        let (queue, mut rx) = DispatchQueue::new();
        let a = queue.channel("a");
        let b = queue.channel("b");
        assert!(a.send(PluginResult::ok().keep_alive(true)));
        assert!(b.send(PluginResult::ok()));
        assert!(a.send(PluginResult::terminator()));

        let ids: Vec<String> = [rx.recv().await, rx.recv().await, rx.recv().await]
            .into_iter()
            .flatten()
            .map(|f| f.callback_id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "a"]);
    }

    #[test]
    fn send_after_host_gone_fails_silently() {
        let (queue, rx) = DispatchQueue::new();
        drop(rx);
        assert!(queue.is_closed());
        assert!(!queue.channel("x").send(PluginResult::ok()));
    }

    #[test]
    fn frame_serializes_flat() {
        let frame = CallbackFrame {
            callback_id: "cb-1".to_string(),
            result: PluginResult::ok_with(serde_json::json!({"state": "enabled"})).keep_alive(true),
        };
        let json = serde_json::to_value(&frame).unwrap_or_default();
        assert_eq!(
            json,
            serde_json::json!({
                "callbackId": "cb-1",
                "status": "ok",
                "keepAlive": true,
                "payload": { "state": "enabled" }
            })
        );
    }

    #[test]
    fn terminator_is_final_no_result() {
        let t = PluginResult::terminator();
        assert!(t.is_final());
        assert_eq!(t.status, ResultStatus::NoResult);
        assert!(t.payload.is_none());
    }

    #[test]
    fn error_result_carries_code() {
        let result = PluginResult::error(&BridgeError::NotInitialized);
        assert_eq!(result.status, ResultStatus::Error);
        let Some(payload) = result.payload else {
            panic!("expected payload");
        };
        assert_eq!(payload["code"], 2001);
    }
}
