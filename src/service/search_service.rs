//! Device search sessions layered on the `DeviceSearch` topic.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::broker::{CallbackChannel, SubscriptionBroker, SubscriptionId};
use crate::domain::{Token, Topic};
use crate::error::BridgeError;
use crate::sdk::LockerEngine;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SearchSession {
    tokens: BTreeSet<Token>,
    active: bool,
}

/// Owns the process-wide search session and the `DeviceSearch` lane.
///
/// Starting a search does not subscribe: callers arm the search with
/// [`start_search`](Self::start_search) and listen with
/// [`subscribe`](Self::subscribe). Device events are passed through
/// untouched; token matching is the engine's job, so nothing seen before
/// the subscription is replayed.
#[derive(Debug)]
pub struct SearchSessionManager {
    broker: SubscriptionBroker,
    engine: Arc<dyn LockerEngine>,
    session: Mutex<SearchSession>,
}

impl SearchSessionManager {
    /// Creates a manager with an empty session.
    #[must_use]
    pub fn new(broker: SubscriptionBroker, engine: Arc<dyn LockerEngine>) -> Self {
        Self {
            broker,
            engine,
            session: Mutex::new(SearchSession::default()),
        }
    }

    /// Replaces the current session with one searching for `tokens`.
    ///
    /// Scanning against the previous tokens is stopped first; sessions are
    /// never merged.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Search`] if `tokens` is empty. The existing
    /// session is left untouched in that case.
    pub fn start_search(&self, tokens: BTreeSet<Token>) -> Result<(), BridgeError> {
        if tokens.is_empty() {
            return Err(BridgeError::Search("token set is empty".to_string()));
        }

        let mut session = self.session();
        if session.active {
            tracing::debug!(previous = session.tokens.len(), "replacing active search session");
            self.engine.stop_search();
        }
        let list: Vec<Token> = tokens.iter().cloned().collect();
        self.engine.start_search(&list);
        session.tokens = tokens;
        session.active = true;

        tracing::info!(tokens = list.len(), "device search started");
        Ok(())
    }

    /// Stops scanning and clears the session.
    ///
    /// Returns `false` if no session was active.
    pub fn stop_search(&self) -> bool {
        let mut session = self.session();
        if !session.active {
            tracing::debug!("stop requested without an active search");
            return false;
        }
        self.engine.stop_search();
        *session = SearchSession::default();
        tracing::info!("device search stopped");
        true
    }

    /// Subscribes `channel` to device events.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::TopicUnavailable`] if the broker has no
    /// device event source.
    pub fn subscribe(&self, channel: CallbackChannel) -> Result<SubscriptionId, BridgeError> {
        self.broker.subscribe(Topic::DeviceSearch, channel)
    }

    /// Removes subscription `id` without notifying its channel.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.broker.unsubscribe(Topic::DeviceSearch, id)
    }

    /// Copy of the tokens currently searched for.
    #[must_use]
    pub fn active_tokens(&self) -> BTreeSet<Token> {
        self.session().tokens.clone()
    }

    /// Returns `true` while a search is running.
    #[must_use]
    pub fn is_searching(&self) -> bool {
        self.session().active
    }

    fn session(&self) -> MutexGuard<'_, SearchSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::broker::{DispatchQueue, EventSource};
    use crate::domain::{DeviceEventKind, DeviceSnapshot};
    use crate::sdk::memory::MemoryLockers;

    fn manager() -> (SearchSessionManager, Arc<MemoryLockers>) {
        let lockers = Arc::new(MemoryLockers::new());
        let source: Arc<dyn EventSource> = Arc::clone(&lockers) as Arc<dyn EventSource>;
        let broker = SubscriptionBroker::builder()
            .source(Topic::DeviceSearch, source)
            .build();
        let engine: Arc<dyn LockerEngine> = Arc::clone(&lockers) as Arc<dyn LockerEngine>;
        (SearchSessionManager::new(broker, engine), lockers)
    }

    fn tokens(hexes: &[&str]) -> BTreeSet<Token> {
        hexes.iter().filter_map(|h| Token::from_hex(h)).collect()
    }

    #[test]
    fn empty_token_set_is_rejected() {
        let (manager, lockers) = manager();
        let result = manager.start_search(BTreeSet::new());
        assert!(matches!(result, Err(BridgeError::Search(_))));
        assert!(!manager.is_searching());
        assert!(lockers.search_tokens().is_none());
    }

    #[test]
    fn second_start_replaces_tokens() {
        let (manager, lockers) = manager();
        assert!(manager.start_search(tokens(&["aa01"])).is_ok());
        assert!(manager.start_search(tokens(&["bb02"])).is_ok());

        assert_eq!(manager.active_tokens(), tokens(&["bb02"]));
        assert_eq!(lockers.search_tokens(), Some(tokens(&["bb02"]).into_iter().collect::<Vec<_>>()));
        assert_eq!(lockers.stop_count(), 1);
    }

    #[test]
    fn stop_reports_whether_a_session_was_active() {
        let (manager, lockers) = manager();
        assert!(!manager.stop_search());

        assert!(manager.start_search(tokens(&["ab12"])).is_ok());
        assert!(manager.stop_search());
        assert!(manager.active_tokens().is_empty());
        assert!(lockers.search_tokens().is_none());

        assert!(!manager.stop_search());
    }

    #[test]
    fn start_does_not_subscribe() {
        let (manager, lockers) = manager();
        let (queue, mut rx) = DispatchQueue::new();
        assert!(manager.start_search(tokens(&["ab12"])).is_ok());
        lockers.push(DeviceEventKind::Detected, DeviceSnapshot::new(1, "A"));
        assert!(rx.try_recv().is_err());

        let Ok(id) = manager.subscribe(queue.channel("search")) else {
            panic!("subscribe failed");
        };
        lockers.push(DeviceEventKind::Lost, DeviceSnapshot::new(1, "A"));
        assert!(rx.try_recv().is_ok());
        assert!(manager.unsubscribe(id));
    }

    #[test]
    fn subscribe_does_not_replay_devices_seen_earlier() {
        let (manager, lockers) = manager();
        assert!(manager.start_search(tokens(&["aa01"])).is_ok());
        lockers.push(DeviceEventKind::Detected, DeviceSnapshot::new(3, "C"));

        assert!(manager.start_search(tokens(&["bb02"])).is_ok());
        let (queue, mut rx) = DispatchQueue::new();
        assert!(manager.subscribe(queue.channel("search")).is_ok());
        assert!(rx.try_recv().is_err());
    }
}
