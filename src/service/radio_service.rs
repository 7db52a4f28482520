//! Radio state probing and change notifications.
//!
//! [`RadioStateProber`] answers one-shot state queries and installs
//! `RadioState` subscriptions whose first frame is always a snapshot.
//! [`RadioStateFeed`] is the event source for that topic: the platform
//! radio's delegate callback, translated 1:1 into broker events.

use std::sync::Arc;
use std::time::Duration;

use crate::broker::{
    CallbackChannel, Emitter, EventSource, ListenerId, ListenerSet, PluginResult,
    SubscriptionBroker, SubscriptionId,
};
use crate::domain::{DomainEvent, RadioEventState, RadioPowerState, Topic};
use crate::error::BridgeError;
use crate::sdk::{RadioAdapter, RadioDelegate};

/// Event source for [`Topic::RadioState`].
#[derive(Debug, Default)]
pub struct RadioStateFeed {
    listeners: ListenerSet,
}

impl RadioStateFeed {
    /// Creates a feed with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RadioDelegate for RadioStateFeed {
    fn on_power_state_changed(&self, state: RadioPowerState) {
        tracing::info!(?state, "radio power state changed");
        self.listeners.emit(&DomainEvent::Radio {
            state: state.into(),
        });
    }
}

impl EventSource for RadioStateFeed {
    fn attach(&self, emitter: Emitter) -> ListenerId {
        self.listeners.insert(emitter)
    }

    fn detach(&self, listener: ListenerId) {
        self.listeners.remove(listener);
    }
}

/// Reads the radio state and streams its changes.
#[derive(Debug)]
pub struct RadioStateProber {
    broker: SubscriptionBroker,
    adapter: Arc<dyn RadioAdapter>,
    settle_delay: Duration,
}

impl RadioStateProber {
    /// Creates a prober waiting `settle_delay` before each classification.
    #[must_use]
    pub fn new(
        broker: SubscriptionBroker,
        adapter: Arc<dyn RadioAdapter>,
        settle_delay: Duration,
    ) -> Self {
        Self {
            broker,
            adapter,
            settle_delay,
        }
    }

    /// Reads the current radio state.
    ///
    /// The first read wakes the radio stack; the state is classified after
    /// the settling delay so a transient reading right after a state-change
    /// interrupt is not reported.
    pub async fn query_state(&self) -> RadioEventState {
        let _ = self.adapter.power_state();
        tokio::time::sleep(self.settle_delay).await;
        let power = self.adapter.power_state();
        let state = RadioEventState::from(power);
        tracing::debug!(?power, state = state.as_str(), "radio state probed");
        state
    }

    /// Subscribes `channel` to radio changes, delivering the current state
    /// as the first frame.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::TopicUnavailable`] if the broker has no radio
    /// event source.
    pub async fn subscribe_with_immediate_state(
        &self,
        channel: CallbackChannel,
    ) -> Result<SubscriptionId, BridgeError> {
        let snapshot = self.query_state().await;
        let frame = PluginResult::ok_with(snapshot.to_payload()).keep_alive(true);
        self.broker
            .subscribe_with_preamble(Topic::RadioState, channel, vec![frame])
    }

    /// Removes subscription `id` without notifying its channel.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.broker.unsubscribe(Topic::RadioState, id)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::broker::{CallbackFrame, DispatchQueue, ResultStatus};
    use crate::sdk::memory::MemoryRadio;
    use serde_json::json;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn prober(initial: RadioPowerState) -> (RadioStateProber, Arc<MemoryRadio>) {
        let radio = Arc::new(MemoryRadio::new(initial));
        let feed = Arc::new(RadioStateFeed::new());
        radio.set_delegate(Arc::clone(&feed) as Arc<dyn RadioDelegate>);
        let broker = SubscriptionBroker::builder()
            .source(Topic::RadioState, feed as Arc<dyn EventSource>)
            .build();
        let adapter: Arc<dyn RadioAdapter> = Arc::clone(&radio) as Arc<dyn RadioAdapter>;
        let prober = RadioStateProber::new(broker, adapter, Duration::from_millis(330));
        (prober, radio)
    }

    fn drain(rx: &mut UnboundedReceiver<CallbackFrame>) -> Vec<CallbackFrame> {
        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(frame);
        }
        frames
    }

    #[tokio::test(start_paused = true)]
    async fn query_collapses_to_binary_state() {
        let (prober, radio) = prober(RadioPowerState::PoweredOn);
        assert_eq!(prober.query_state().await, RadioEventState::Enabled);
        radio.set_power_state(RadioPowerState::Unauthorized);
        assert_eq!(prober.query_state().await, RadioEventState::Disabled);
    }

    #[tokio::test(start_paused = true)]
    async fn query_waits_for_settling_delay() {
        let (prober, _radio) = prober(RadioPowerState::PoweredOff);
        let started = tokio::time::Instant::now();
        let _ = prober.query_state().await;
        assert!(started.elapsed() >= Duration::from_millis(330));
    }

    #[tokio::test(start_paused = true)]
    async fn query_reads_state_after_delay() {
        let (prober, radio) = prober(RadioPowerState::Resetting);
        let probe = prober.query_state();
        let flip = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            radio.set_power_state(RadioPowerState::PoweredOn);
        };
        let (state, ()) = tokio::join!(probe, flip);
        assert_eq!(state, RadioEventState::Enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_is_first_frame_without_any_change() {
        let (prober, _radio) = prober(RadioPowerState::PoweredOff);
        let (queue, mut rx) = DispatchQueue::new();
        let result = prober.subscribe_with_immediate_state(queue.channel("bt")).await;
        assert!(result.is_ok());

        let frames = drain(&mut rx);
        assert_eq!(frames.len(), 1);
        let Some(first) = frames.first() else {
            panic!("expected snapshot");
        };
        assert_eq!(first.result.status, ResultStatus::Ok);
        assert!(first.result.keep_alive);
        assert_eq!(first.result.payload, Some(json!({ "state": "disabled" })));
    }

    #[tokio::test(start_paused = true)]
    async fn changes_follow_snapshot_on_same_channel() {
        let (prober, radio) = prober(RadioPowerState::PoweredOff);
        let (queue, mut rx) = DispatchQueue::new();
        let _ = prober.subscribe_with_immediate_state(queue.channel("bt")).await;
        radio.set_power_state(RadioPowerState::PoweredOn);
        radio.set_power_state(RadioPowerState::PoweredOff);

        let states: Vec<serde_json::Value> = drain(&mut rx)
            .into_iter()
            .filter_map(|f| f.result.payload)
            .map(|p| p["state"].clone())
            .collect();
        assert_eq!(states, vec![json!("disabled"), json!("enabled"), json!("disabled")]);
    }

    #[tokio::test(start_paused = true)]
    async fn resubscribe_terminates_previous_listener_first() {
        let (prober, _radio) = prober(RadioPowerState::PoweredOn);
        let (queue, mut rx) = DispatchQueue::new();
        let _ = prober.subscribe_with_immediate_state(queue.channel("first")).await;
        let _ = prober.subscribe_with_immediate_state(queue.channel("second")).await;

        let frames: Vec<(String, ResultStatus)> = drain(&mut rx)
            .into_iter()
            .map(|f| (f.callback_id, f.result.status))
            .collect();
        assert_eq!(
            frames,
            vec![
                ("first".to_string(), ResultStatus::Ok),
                ("first".to_string(), ResultStatus::NoResult),
                ("second".to_string(), ResultStatus::Ok),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unsubscribe_stops_change_delivery() {
        let (prober, radio) = prober(RadioPowerState::PoweredOn);
        let (queue, mut rx) = DispatchQueue::new();
        let Ok(id) = prober.subscribe_with_immediate_state(queue.channel("bt")).await else {
            panic!("subscribe failed");
        };
        let _ = drain(&mut rx);
        assert!(prober.unsubscribe(id));
        radio.set_power_state(RadioPowerState::PoweredOff);
        assert!(drain(&mut rx).is_empty());
    }
}
