//! Per-topic subscriber bookkeeping.
//!
//! A [`SubscriberSlot`] binds a topic to at most one live subscription. The
//! channel, subscription id and source listener live in a single optional
//! [`ActiveSubscription`], so an id can never outlive its channel.

use std::fmt;

use serde::Serialize;

use super::channel::CallbackChannel;
use super::source::ListenerId;

/// Identifier of one subscription on a topic.
///
/// Strictly increasing per topic, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Raw id value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The live binding of a topic to a host channel.
#[derive(Debug)]
pub(crate) struct ActiveSubscription {
    pub(crate) channel: CallbackChannel,
    pub(crate) id: SubscriptionId,
    pub(crate) listener: ListenerId,
}

/// Subscriber slot for one topic.
#[derive(Debug, Default)]
pub struct SubscriberSlot {
    active: Option<ActiveSubscription>,
    last_id: u64,
}

impl SubscriberSlot {
    /// Creates an empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            active: None,
            last_id: 0,
        }
    }

    /// Id of the live subscription, if any.
    #[must_use]
    pub fn subscription_id(&self) -> Option<SubscriptionId> {
        self.active.as_ref().map(|active| active.id)
    }

    /// Channel of the live subscription, if any.
    #[must_use]
    pub fn channel(&self) -> Option<&CallbackChannel> {
        self.active.as_ref().map(|active| &active.channel)
    }

    pub(crate) fn next_id(&mut self) -> SubscriptionId {
        self.last_id = self.last_id.saturating_add(1);
        SubscriptionId(self.last_id)
    }

    pub(crate) fn install(&mut self, active: ActiveSubscription) -> Option<ActiveSubscription> {
        self.active.replace(active)
    }

    pub(crate) fn take(&mut self) -> Option<ActiveSubscription> {
        self.active.take()
    }

    /// Clears the slot only if `id` is the live subscription.
    pub(crate) fn take_if(&mut self, id: SubscriptionId) -> Option<ActiveSubscription> {
        if self.subscription_id() == Some(id) {
            self.active.take()
        } else {
            None
        }
    }
}
