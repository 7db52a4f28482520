//! WebSocket connection state machine.
//!
//! Each connection owns one [`DispatchQueue`] and one command worker. The
//! read loop only parses envelopes and forwards commands, so a slow action
//! (a radio probe) never stalls reading or writing. The worker runs the
//! connection's commands one at a time, in arrival order, so a subscribe is
//! always installed before a following unsubscribe looks for it.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::messages::{HostCommand, WsMessage, WsMessageType};
use crate::bridge::BeaconBridge;
use crate::broker::DispatchQueue;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads command envelopes and queues them for the command worker.
/// - Writes every frame from the connection's dispatch queue to the client.
/// - On close, drops the streams still addressed to this connection.
pub async fn run_connection(socket: WebSocket, bridge: Arc<BeaconBridge>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (queue, mut frames) = DispatchQueue::new();
    let (commands, pending) = mpsc::unbounded_channel();
    let worker = tokio::spawn(run_commands(pending, queue, Arc::clone(&bridge)));

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = handle_text_message(&text, &commands)
                            && ws_tx.send(Message::text(reply)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            frame = frames.recv() => {
                let Some(frame) = frame else { break };
                let json = serde_json::to_string(&WsMessage::callback(&frame)).unwrap_or_default();
                if ws_tx.send(Message::text(json)).await.is_err() {
                    break;
                }
            }
        }
    }

    // Closing the receiver first marks every channel of this connection as
    // gone; commands still queued then run to completion against it.
    drop(frames);
    drop(commands);
    if let Err(e) = worker.await {
        tracing::warn!(error = %e, "command worker failed");
    }
    let released = bridge.release_orphaned_streams();
    tracing::debug!(released, "ws connection closed");
}

/// Executes the connection's commands sequentially.
async fn run_commands(
    mut pending: mpsc::UnboundedReceiver<HostCommand>,
    queue: DispatchQueue,
    bridge: Arc<BeaconBridge>,
) {
    while let Some(command) = pending.recv().await {
        let channel = queue.channel(command.callback_id);
        bridge.execute(&command.action, &command.args, channel).await;
    }
}

/// Parses a text frame and queues its command, returning an error reply if
/// it is not a command envelope.
fn handle_text_message(text: &str, commands: &mpsc::UnboundedSender<HostCommand>) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return serde_json::to_string(&WsMessage::error("", 400, "malformed JSON")).ok();
    };
    if msg.msg_type != WsMessageType::Command {
        return serde_json::to_string(&WsMessage::error(msg.id, 400, "expected a command")).ok();
    }
    let command = match serde_json::from_value::<HostCommand>(msg.payload) {
        Ok(command) => command,
        Err(e) => {
            let reply = WsMessage::error(msg.id, 400, format!("malformed command: {e}"));
            return serde_json::to_string(&reply).ok();
        }
    };

    if commands.send(command).is_err() {
        tracing::debug!(id = %msg.id, "command worker gone, command dropped");
    }
    None
}
