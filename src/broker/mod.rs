//! Subscription broker: per-topic slots, event sources, host channels.
//!
//! The broker is the only component that mutates subscriber slots. Event
//! sources push through an [`Emitter`]; results reach the host through a
//! [`CallbackChannel`] backed by the shared [`DispatchQueue`].

pub mod channel;
pub mod core;
pub mod slot;
pub mod source;

pub use channel::{CallbackChannel, CallbackFrame, DispatchQueue, PluginResult, ResultStatus};
pub use self::core::{Emitter, SubscriptionBroker, SubscriptionBrokerBuilder};
pub use slot::{SubscriberSlot, SubscriptionId};
pub use source::{EventSource, ListenerId, ListenerSet};
