//! The capability the broker consumes from each topic event source.
//!
//! A source accepts an [`Emitter`] on [`EventSource::attach`] and pushes
//! events through it until [`EventSource::detach`] is called with the
//! returned [`ListenerId`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use super::core::Emitter;
use crate::domain::DomainEvent;

/// Handle for one attached listener on an event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Wraps a raw listener id.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw id value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Producer of domain events for one topic.
///
/// The broker calls `attach`/`detach` while holding the topic's slot lock.
/// Implementations must not emit synchronously from inside either call.
pub trait EventSource: Send + Sync + fmt::Debug {
    /// Starts delivering events to `emitter`.
    fn attach(&self, emitter: Emitter) -> ListenerId;

    /// Stops delivering events to the listener. Unknown ids are ignored.
    fn detach(&self, listener: ListenerId);
}

/// Listener registry for [`EventSource`] implementations.
///
/// [`ListenerSet::emit`] snapshots the listeners and releases its lock
/// before calling into the broker, so a concurrent `detach` from the broker
/// never waits on a producer.
#[derive(Debug, Default)]
pub struct ListenerSet {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, Emitter)>>,
}

impl ListenerSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `emitter`.
    pub fn insert(&self, emitter: Emitter) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed).saturating_add(1));
        self.lock().push((id, emitter));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn remove(&self, listener: ListenerId) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != listener);
        listeners.len() != before
    }

    /// Pushes `event` to every listener. Returns how many accepted it.
    pub fn emit(&self, event: &DomainEvent) -> usize {
        let emitters: Vec<Emitter> = {
            let listeners = self.lock();
            listeners.iter().map(|(_, emitter)| emitter.clone()).collect()
        };
        let mut delivered = 0;
        for emitter in &emitters {
            if emitter.emit(event.clone()) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Number of attached listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(ListenerId, Emitter)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
