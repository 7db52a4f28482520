//! In-process SDK used by the demo host and the tests.
//!
//! Every component keeps its state behind a mutex and exposes "driver"
//! methods (`push`, `enter`, `set_power_state`, ...) that simulate what the
//! vendor SDK would report. Events are always emitted after the component's
//! own lock is released.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use super::{
    HexTokenGenerator, LocationEngine, LockerEngine, PlatformPermissions, ProximitySdk,
    RadioAdapter, RadioDelegate, SdkError, TokenGenerator,
};
use crate::bridge::BridgeServices;
use crate::broker::{Emitter, EventSource, ListenerId, ListenerSet, SubscriptionBroker};
use crate::config::SdkConfig;
use crate::domain::{
    DeviceEventKind, DeviceSnapshot, DomainEvent, GeofenceEvent, LogLine, PermissionSnapshot,
    RadioPowerState, ShopSnapshot, Token, Topic,
};
use crate::service::RadioStateFeed;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct LifecycleState {
    config: Option<SdkConfig>,
    sync_failure: Option<String>,
    beeper_failure: Option<String>,
    syncs: usize,
    beeper_running: bool,
}

/// Lifecycle fake with injectable failures.
#[derive(Debug, Default)]
pub struct MemorySdk {
    state: Mutex<LifecycleState>,
}

impl MemorySdk {
    /// Creates an SDK where every step succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following sync fail with `message`.
    pub fn fail_sync(&self, message: impl Into<String>) {
        lock(&self.state).sync_failure = Some(message.into());
    }

    /// Makes every following beeper start fail with `message`.
    pub fn fail_beeper(&self, message: impl Into<String>) {
        lock(&self.state).beeper_failure = Some(message.into());
    }

    /// Last applied configuration.
    #[must_use]
    pub fn config(&self) -> Option<SdkConfig> {
        lock(&self.state).config.clone()
    }

    /// Number of sync attempts.
    #[must_use]
    pub fn sync_count(&self) -> usize {
        lock(&self.state).syncs
    }

    /// Returns `true` once the beeper started.
    #[must_use]
    pub fn beeper_running(&self) -> bool {
        lock(&self.state).beeper_running
    }
}

#[async_trait]
impl ProximitySdk for MemorySdk {
    fn configure(&self, config: &SdkConfig) -> Result<(), SdkError> {
        tracing::debug!(mode = config.mode(), service_id = config.service_id(), "sdk configured");
        lock(&self.state).config = Some(config.clone());
        Ok(())
    }

    async fn sync(&self) -> Result<(), SdkError> {
        let mut state = lock(&self.state);
        state.syncs += 1;
        match &state.sync_failure {
            Some(message) => Err(SdkError::new(message.clone())),
            None => Ok(()),
        }
    }

    fn start_beeper(&self) -> Result<(), SdkError> {
        let mut state = lock(&self.state);
        if let Some(message) = &state.beeper_failure {
            return Err(SdkError::new(message.clone()));
        }
        state.beeper_running = true;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Lockers
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct LockerState {
    visible: BTreeMap<u64, DeviceSnapshot>,
    search: Option<Vec<Token>>,
    stops: usize,
    applied: Vec<Token>,
    apply_failure: Option<String>,
}

/// Locker engine fake. Also the event source for [`Topic::DeviceSearch`].
#[derive(Debug, Default)]
pub struct MemoryLockers {
    listeners: ListenerSet,
    state: Mutex<LockerState>,
}

impl MemoryLockers {
    /// Creates an engine with no devices in range.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a device transition and emits it.
    ///
    /// `Lost` removes the device from the visible set; every other kind
    /// inserts or refreshes it.
    pub fn push(&self, kind: DeviceEventKind, device: DeviceSnapshot) -> usize {
        {
            let mut state = lock(&self.state);
            match kind {
                DeviceEventKind::Lost => {
                    state.visible.remove(&device.device_id());
                }
                DeviceEventKind::Detected
                | DeviceEventKind::StateChanged
                | DeviceEventKind::LockStateChanged => {
                    state.visible.insert(device.device_id(), device.clone());
                }
            }
        }
        self.listeners.emit(&DomainEvent::Device { kind, device })
    }

    /// Makes every following `apply` fail with `message`.
    pub fn fail_apply(&self, message: impl Into<String>) {
        lock(&self.state).apply_failure = Some(message.into());
    }

    /// Tokens of the running scan, `None` when stopped.
    #[must_use]
    pub fn search_tokens(&self) -> Option<Vec<Token>> {
        lock(&self.state).search.clone()
    }

    /// Number of `stop_search` calls.
    #[must_use]
    pub fn stop_count(&self) -> usize {
        lock(&self.state).stops
    }

    /// Tokens passed to `apply`, in call order.
    #[must_use]
    pub fn applied_tokens(&self) -> Vec<Token> {
        lock(&self.state).applied.clone()
    }
}

#[async_trait]
impl LockerEngine for MemoryLockers {
    fn start_search(&self, tokens: &[Token]) {
        lock(&self.state).search = Some(tokens.to_vec());
    }

    fn stop_search(&self) {
        let mut state = lock(&self.state);
        state.search = None;
        state.stops += 1;
    }

    fn visible_devices(&self) -> Vec<DeviceSnapshot> {
        lock(&self.state).visible.values().cloned().collect()
    }

    async fn apply(&self, token: Token) -> Result<Vec<u8>, SdkError> {
        let mut state = lock(&self.state);
        state.applied.push(token.clone());
        match &state.apply_failure {
            Some(message) => Err(SdkError::new(message.clone())),
            None => Ok(token.as_bytes().to_vec()),
        }
    }
}

impl EventSource for MemoryLockers {
    fn attach(&self, emitter: Emitter) -> ListenerId {
        self.listeners.insert(emitter)
    }

    fn detach(&self, listener: ListenerId) {
        self.listeners.remove(listener);
    }
}

// ---------------------------------------------------------------------------
// Radio
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct RadioInner {
    power: RadioPowerState,
    delegate: Option<Arc<dyn RadioDelegate>>,
}

/// Radio fake whose power state is set by the test or demo driver.
#[derive(Debug)]
pub struct MemoryRadio {
    inner: Mutex<RadioInner>,
}

impl MemoryRadio {
    /// Creates a radio in `power` state with no delegate.
    #[must_use]
    pub const fn new(power: RadioPowerState) -> Self {
        Self {
            inner: Mutex::new(RadioInner {
                power,
                delegate: None,
            }),
        }
    }

    /// Changes the power state and notifies the delegate.
    pub fn set_power_state(&self, power: RadioPowerState) {
        let delegate = {
            let mut inner = lock(&self.inner);
            inner.power = power;
            inner.delegate.clone()
        };
        if let Some(delegate) = delegate {
            delegate.on_power_state_changed(power);
        }
    }
}

impl RadioAdapter for MemoryRadio {
    fn power_state(&self) -> RadioPowerState {
        lock(&self.inner).power
    }

    fn set_delegate(&self, delegate: Arc<dyn RadioDelegate>) {
        lock(&self.inner).delegate = Some(delegate);
    }
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct PermissionState {
    granted: PermissionSnapshot,
    requests: usize,
}

/// Permission fake. Starts fully granted; a request grants everything, as
/// if the user accepted every prompt.
#[derive(Debug)]
pub struct MemoryPermissions {
    state: Mutex<PermissionState>,
}

impl Default for MemoryPermissions {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPermissions {
    /// Creates a platform with every permission granted.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(PermissionState {
                granted: PermissionSnapshot::GRANTED,
                requests: 0,
            }),
        }
    }

    /// Overrides the grant state.
    pub fn set(&self, granted: PermissionSnapshot) {
        lock(&self.state).granted = granted;
    }

    /// Number of permission requests.
    #[must_use]
    pub fn requests(&self) -> usize {
        lock(&self.state).requests
    }
}

impl PlatformPermissions for MemoryPermissions {
    fn snapshot(&self) -> PermissionSnapshot {
        lock(&self.state).granted
    }

    fn request(&self) {
        let mut state = lock(&self.state);
        state.requests += 1;
        state.granted = PermissionSnapshot::GRANTED;
    }
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

/// Geofencing fake. Also the event source for [`Topic::GeofenceEvents`].
#[derive(Debug, Default)]
pub struct MemoryLocations {
    listeners: ListenerSet,
    entered: Mutex<BTreeMap<u64, ShopSnapshot>>,
}

impl MemoryLocations {
    /// Creates an engine outside every shop.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates entering `shop`.
    pub fn enter(&self, shop: ShopSnapshot) -> usize {
        lock(&self.entered).insert(shop.shop_id, shop.clone());
        self.listeners
            .emit(&DomainEvent::Geofence(GeofenceEvent::entered(shop)))
    }

    /// Simulates leaving shop `shop_id`. Returns `None` if it was not entered.
    pub fn exit(&self, shop_id: u64) -> Option<usize> {
        let shop = lock(&self.entered).remove(&shop_id)?;
        Some(
            self.listeners
                .emit(&DomainEvent::Geofence(GeofenceEvent::exited(shop))),
        )
    }

    /// Simulates entering a merchant area.
    pub fn merchant_entered(&self) -> usize {
        self.listeners
            .emit(&DomainEvent::Geofence(GeofenceEvent::merchant_entered()))
    }

    /// Simulates leaving a merchant area.
    pub fn merchant_exited(&self) -> usize {
        self.listeners
            .emit(&DomainEvent::Geofence(GeofenceEvent::merchant_exited()))
    }
}

impl LocationEngine for MemoryLocations {
    fn entered_shops(&self) -> Vec<ShopSnapshot> {
        lock(&self.entered).values().cloned().collect()
    }
}

impl EventSource for MemoryLocations {
    fn attach(&self, emitter: Emitter) -> ListenerId {
        self.listeners.insert(emitter)
    }

    fn detach(&self, listener: ListenerId) {
        self.listeners.remove(listener);
    }
}

// ---------------------------------------------------------------------------
// Logs
// ---------------------------------------------------------------------------

/// SDK log stream fake. Event source for [`Topic::LogStream`].
#[derive(Debug, Default)]
pub struct MemoryLogs {
    listeners: ListenerSet,
}

impl MemoryLogs {
    /// Creates a log stream with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits one log line.
    pub fn push(&self, tag: impl Into<String>, message: impl Into<String>) -> usize {
        self.listeners.emit(&DomainEvent::Log(LogLine {
            tag: tag.into(),
            message: message.into(),
        }))
    }
}

impl EventSource for MemoryLogs {
    fn attach(&self, emitter: Emitter) -> ListenerId {
        self.listeners.insert(emitter)
    }

    fn detach(&self, listener: ListenerId) {
        self.listeners.remove(listener);
    }
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// Every in-memory component, kept around so drivers can reach them after
/// the bridge is built.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    /// Lifecycle.
    pub sdk: Arc<MemorySdk>,
    /// Lockers and device events.
    pub lockers: Arc<MemoryLockers>,
    /// Radio.
    pub radio: Arc<MemoryRadio>,
    /// Runtime permissions.
    pub permissions: Arc<MemoryPermissions>,
    /// Geofencing.
    pub locations: Arc<MemoryLocations>,
    /// SDK logs.
    pub logs: Arc<MemoryLogs>,
}

impl MemoryBackend {
    /// Creates a backend with the radio in `power` state.
    #[must_use]
    pub fn new(power: RadioPowerState) -> Self {
        Self {
            sdk: Arc::new(MemorySdk::new()),
            lockers: Arc::new(MemoryLockers::new()),
            radio: Arc::new(MemoryRadio::new(power)),
            permissions: Arc::new(MemoryPermissions::new()),
            locations: Arc::new(MemoryLocations::new()),
            logs: Arc::new(MemoryLogs::new()),
        }
    }

    /// Wires the components into a broker and the bridge's service set.
    ///
    /// The radio delegate is pointed at a fresh [`RadioStateFeed`], which
    /// becomes the `RadioState` event source.
    #[must_use]
    pub fn services(&self, radio_settle_delay: Duration) -> BridgeServices {
        let feed = Arc::new(RadioStateFeed::new());
        self.radio
            .set_delegate(Arc::clone(&feed) as Arc<dyn RadioDelegate>);

        let broker = SubscriptionBroker::builder()
            .source(Topic::RadioState, feed as Arc<dyn EventSource>)
            .source(
                Topic::DeviceSearch,
                Arc::clone(&self.lockers) as Arc<dyn EventSource>,
            )
            .source(
                Topic::GeofenceEvents,
                Arc::clone(&self.locations) as Arc<dyn EventSource>,
            )
            .source(
                Topic::LogStream,
                Arc::clone(&self.logs) as Arc<dyn EventSource>,
            )
            .build();

        BridgeServices {
            sdk: Arc::clone(&self.sdk) as Arc<dyn ProximitySdk>,
            tokens: Arc::new(HexTokenGenerator) as Arc<dyn TokenGenerator>,
            lockers: Arc::clone(&self.lockers) as Arc<dyn LockerEngine>,
            radio: Arc::clone(&self.radio) as Arc<dyn RadioAdapter>,
            permissions: Arc::clone(&self.permissions) as Arc<dyn PlatformPermissions>,
            locations: Arc::clone(&self.locations) as Arc<dyn LocationEngine>,
            broker,
            radio_settle_delay,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    pub struct CountingDelegate {
        calls: AtomicUsize,
    }

    impl CountingDelegate {
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RadioDelegate for CountingDelegate {
        fn on_power_state_changed(&self, _state: RadioPowerState) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn sync_failure_is_sticky_and_counted() {
        let sdk = MemorySdk::new();
        tokio_test::assert_ok!(sdk.sync().await);
        sdk.fail_sync("backend unreachable");
        let Err(err) = sdk.sync().await else {
            panic!("expected sync failure");
        };
        assert_eq!(err.to_string(), "backend unreachable");
        assert_eq!(sdk.sync_count(), 2);
    }

    #[test]
    fn lost_removes_visible_device() {
        let lockers = MemoryLockers::new();
        lockers.push(DeviceEventKind::Detected, DeviceSnapshot::new(1, "A"));
        lockers.push(DeviceEventKind::Detected, DeviceSnapshot::new(2, "B"));
        lockers.push(DeviceEventKind::Lost, DeviceSnapshot::new(1, "A"));
        let ids: Vec<u64> = lockers
            .visible_devices()
            .iter()
            .map(DeviceSnapshot::device_id)
            .collect();
        assert_eq!(ids, vec![2]);
    }

    #[tokio::test]
    async fn apply_records_token() {
        let lockers = MemoryLockers::new();
        let Some(token) = Token::from_hex("0a0b") else {
            panic!("valid hex");
        };
        let result = tokio_test::assert_ok!(lockers.apply(token.clone()).await);
        assert_eq!(result, vec![0x0a, 0x0b]);
        assert_eq!(lockers.applied_tokens(), vec![token]);
    }

    #[test]
    fn radio_notifies_delegate_on_change() {
        let radio = MemoryRadio::new(RadioPowerState::Unknown);
        let delegate = Arc::new(CountingDelegate::default());
        radio.set_delegate(Arc::clone(&delegate) as Arc<dyn RadioDelegate>);
        radio.set_power_state(RadioPowerState::PoweredOn);
        assert_eq!(radio.power_state(), RadioPowerState::PoweredOn);
        assert_eq!(delegate.calls(), 1);
    }

    #[test]
    fn request_grants_missing_permissions() {
        let permissions = MemoryPermissions::new();
        permissions.set(PermissionSnapshot {
            is_bt_ready: false,
            is_location_granted: false,
        });
        permissions.request();
        assert_eq!(permissions.snapshot(), PermissionSnapshot::GRANTED);
        assert_eq!(permissions.requests(), 1);
    }

    #[test]
    fn exit_of_unknown_shop_is_ignored() {
        let locations = MemoryLocations::new();
        locations.enter(ShopSnapshot::new(4, "Bakery"));
        assert_eq!(locations.exit(99), None);
        assert_eq!(locations.entered_shops().len(), 1);
        assert_eq!(locations.exit(4), Some(0));
        assert!(locations.entered_shops().is_empty());
    }
}
