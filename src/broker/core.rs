//! The subscription broker.
//!
//! [`SubscriptionBroker`] owns one [`SubscriberSlot`] per registered topic.
//! Each slot sits behind its own mutex, so operations on one topic are
//! serialized while different topics proceed independently. Frames are
//! enqueued on the host dispatch queue while the slot lock is held, which
//! keeps per-topic delivery order identical to production order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::channel::{CallbackChannel, PluginResult};
use super::slot::{ActiveSubscription, SubscriberSlot, SubscriptionId};
use super::source::EventSource;
use crate::domain::{DomainEvent, Topic};
use crate::error::BridgeError;

#[derive(Debug)]
struct Lane {
    source: Arc<dyn EventSource>,
    slot: Mutex<SubscriberSlot>,
}

impl Lane {
    fn slot(&self) -> MutexGuard<'_, SubscriberSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
struct BrokerInner {
    lanes: HashMap<Topic, Lane>,
}

/// Builder registering one [`EventSource`] per topic.
#[derive(Debug, Default)]
pub struct SubscriptionBrokerBuilder {
    sources: HashMap<Topic, Arc<dyn EventSource>>,
}

impl SubscriptionBrokerBuilder {
    /// Registers `source` for `topic`, replacing any earlier registration.
    #[must_use]
    pub fn source(mut self, topic: Topic, source: Arc<dyn EventSource>) -> Self {
        self.sources.insert(topic, source);
        self
    }

    /// Builds the broker with an empty slot per registered topic.
    #[must_use]
    pub fn build(self) -> SubscriptionBroker {
        let lanes = self
            .sources
            .into_iter()
            .map(|(topic, source)| {
                let lane = Lane {
                    source,
                    slot: Mutex::new(SubscriberSlot::new()),
                };
                (topic, lane)
            })
            .collect();
        SubscriptionBroker {
            inner: Arc::new(BrokerInner { lanes }),
        }
    }
}

/// Turns multi-producer event sources into single-subscriber keep-alive
/// callback channels, one per topic.
///
/// Cloning is cheap and every clone refers to the same slots.
#[derive(Debug, Clone)]
pub struct SubscriptionBroker {
    inner: Arc<BrokerInner>,
}

impl SubscriptionBroker {
    /// Starts building a broker.
    #[must_use]
    pub fn builder() -> SubscriptionBrokerBuilder {
        SubscriptionBrokerBuilder::default()
    }

    /// Returns `true` if an event source is registered for `topic`.
    #[must_use]
    pub fn has_topic(&self, topic: Topic) -> bool {
        self.inner.lanes.contains_key(&topic)
    }

    /// Installs `channel` as the only subscriber of `topic`.
    ///
    /// A previous subscriber is sent a terminal frame and its source
    /// listener is detached before the new listener is attached.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::TopicUnavailable`] if no source is registered
    /// for `topic`.
    pub fn subscribe(
        &self,
        topic: Topic,
        channel: CallbackChannel,
    ) -> Result<SubscriptionId, BridgeError> {
        self.subscribe_with_preamble(topic, channel, Vec::new())
    }

    /// Like [`subscribe`](Self::subscribe), but delivers `preamble` to the
    /// new channel before any event from the source can reach it.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::TopicUnavailable`] if no source is registered
    /// for `topic`.
    pub fn subscribe_with_preamble(
        &self,
        topic: Topic,
        channel: CallbackChannel,
        preamble: Vec<PluginResult>,
    ) -> Result<SubscriptionId, BridgeError> {
        let lane = self.lane(topic)?;
        let mut slot = lane.slot();

        if let Some(previous) = slot.take() {
            retire(topic, lane, previous, true);
        }

        let id = slot.next_id();
        for frame in preamble {
            channel.send(frame);
        }
        let listener = lane.source.attach(self.emitter(topic));
        tracing::debug!(
            %topic,
            subscription_id = %id,
            callback_id = channel.callback_id(),
            "subscriber installed"
        );
        let _ = slot.install(ActiveSubscription {
            channel,
            id,
            listener,
        });
        Ok(id)
    }

    /// Removes subscription `id` from `topic` without notifying its channel.
    ///
    /// Returns `false` if `id` is not the live subscription.
    pub fn unsubscribe(&self, topic: Topic, id: SubscriptionId) -> bool {
        self.release(topic, Some(id), false)
    }

    /// Sends the terminal frame to the live subscriber of `topic` and
    /// removes it. Returns `false` if the slot was empty.
    pub fn terminate(&self, topic: Topic) -> bool {
        self.release(topic, None, true)
    }

    /// Like [`terminate`](Self::terminate), but only if `id` is still the
    /// live subscription.
    pub fn terminate_subscription(&self, topic: Topic, id: SubscriptionId) -> bool {
        self.release(topic, Some(id), true)
    }

    /// Removes every subscriber whose host transport is gone, without
    /// notifying it. Returns the topics that were released.
    pub fn release_closed(&self) -> Vec<Topic> {
        let mut released = Vec::new();
        for (&topic, lane) in &self.inner.lanes {
            let mut slot = lane.slot();
            if slot.channel().is_some_and(CallbackChannel::is_closed)
                && let Some(active) = slot.take()
            {
                retire(topic, lane, active, false);
                released.push(topic);
            }
        }
        released
    }

    /// Delivers `event` to the subscriber of `topic` as a keep-alive frame.
    ///
    /// Events for a topic without a subscriber are dropped. Returns `true`
    /// if the frame was handed to the host transport.
    pub fn emit(&self, topic: Topic, event: DomainEvent) -> bool {
        let Some(lane) = self.inner.lanes.get(&topic) else {
            tracing::trace!(%topic, "no lane for topic, event dropped");
            return false;
        };
        if event.topic() != topic {
            tracing::warn!(%topic, event_topic = %event.topic(), "event emitted on wrong topic");
            return false;
        }

        let slot = lane.slot();
        let Some(channel) = slot.channel() else {
            tracing::trace!(%topic, "no subscriber, event dropped");
            return false;
        };
        tracing::trace!(%topic, callback_id = channel.callback_id(), "forwarding event");
        channel.send(PluginResult::ok_with(event.to_payload()).keep_alive(true))
    }

    /// Id of the live subscription on `topic`, if any.
    #[must_use]
    pub fn active_subscription(&self, topic: Topic) -> Option<SubscriptionId> {
        self.inner
            .lanes
            .get(&topic)
            .and_then(|lane| lane.slot().subscription_id())
    }

    fn lane(&self, topic: Topic) -> Result<&Lane, BridgeError> {
        self.inner
            .lanes
            .get(&topic)
            .ok_or(BridgeError::TopicUnavailable(topic))
    }

    fn release(&self, topic: Topic, id: Option<SubscriptionId>, notify: bool) -> bool {
        let Some(lane) = self.inner.lanes.get(&topic) else {
            return false;
        };
        let mut slot = lane.slot();
        let removed = match id {
            Some(id) => slot.take_if(id),
            None => slot.take(),
        };
        match removed {
            Some(active) => {
                retire(topic, lane, active, notify);
                true
            }
            None => {
                tracing::debug!(%topic, subscription_id = ?id, "nothing to release");
                false
            }
        }
    }

    fn emitter(&self, topic: Topic) -> Emitter {
        Emitter {
            topic,
            broker: Arc::downgrade(&self.inner),
        }
    }
}

/// Detaches `active` from the source and, if `notify`, closes its channel.
fn retire(topic: Topic, lane: &Lane, active: ActiveSubscription, notify: bool) {
    lane.source.detach(active.listener);
    if notify {
        active.channel.send(PluginResult::terminator());
    }
    tracing::debug!(
        %topic,
        subscription_id = %active.id,
        callback_id = active.channel.callback_id(),
        notified = notify,
        "subscriber removed"
    );
}

/// Handle an event source uses to push events into the broker.
///
/// Holds a weak reference: once every broker clone is dropped, emitting
/// becomes a no-op.
#[derive(Debug, Clone)]
pub struct Emitter {
    topic: Topic,
    broker: Weak<BrokerInner>,
}

impl Emitter {
    /// Forwards `event` to the broker. See [`SubscriptionBroker::emit`].
    pub fn emit(&self, event: DomainEvent) -> bool {
        match self.broker.upgrade() {
            Some(inner) => SubscriptionBroker { inner }.emit(self.topic, event),
            None => false,
        }
    }
}
