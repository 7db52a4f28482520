//! Host-facing facade.
//!
//! [`BeaconBridge::execute`] is the single entry point for host commands:
//! it parses the action, gates it on SDK initialization, runs it against
//! the broker and the SDK seams, and reports through the command's
//! [`CallbackChannel`]. One-shot actions send exactly one final result;
//! streaming actions install a subscription and return without a result of
//! their own.

pub mod action;
pub mod args;

pub use action::Action;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde_json::{Value, json};

use crate::broker::{CallbackChannel, PluginResult, SubscriptionBroker};
use crate::config::SdkConfig;
use crate::domain::{DeviceSummary, Token, Topic};
use crate::error::BridgeError;
use crate::sdk::{
    LocationEngine, LockerEngine, PlatformPermissions, ProximitySdk, RadioAdapter, TokenGenerator,
};
use crate::service::{RadioStateProber, SearchSessionManager};

/// Everything the bridge is composed from.
///
/// Built at the composition root and handed to [`BeaconBridge::new`].
#[derive(Debug, Clone)]
pub struct BridgeServices {
    /// SDK lifecycle.
    pub sdk: Arc<dyn ProximitySdk>,
    /// Hex to token conversion.
    pub tokens: Arc<dyn TokenGenerator>,
    /// Locker scanning and unlock.
    pub lockers: Arc<dyn LockerEngine>,
    /// Platform radio.
    pub radio: Arc<dyn RadioAdapter>,
    /// Platform runtime permissions.
    pub permissions: Arc<dyn PlatformPermissions>,
    /// Geofencing.
    pub locations: Arc<dyn LocationEngine>,
    /// Broker with an event source per topic.
    pub broker: SubscriptionBroker,
    /// Settling delay for radio state reads.
    pub radio_settle_delay: Duration,
}

/// Result of one action: a final result, or `None` for streams.
type ActionResult = Result<Option<PluginResult>, BridgeError>;

/// Executes host commands.
#[derive(Debug)]
pub struct BeaconBridge {
    sdk: Arc<dyn ProximitySdk>,
    tokens: Arc<dyn TokenGenerator>,
    lockers: Arc<dyn LockerEngine>,
    locations: Arc<dyn LocationEngine>,
    permissions: Arc<dyn PlatformPermissions>,
    broker: SubscriptionBroker,
    search: SearchSessionManager,
    radio: RadioStateProber,
    initialized: AtomicBool,
}

impl BeaconBridge {
    /// Builds the bridge and its managers from `services`.
    #[must_use]
    pub fn new(services: BridgeServices) -> Self {
        let search =
            SearchSessionManager::new(services.broker.clone(), Arc::clone(&services.lockers));
        let radio = RadioStateProber::new(
            services.broker.clone(),
            services.radio,
            services.radio_settle_delay,
        );
        Self {
            sdk: services.sdk,
            tokens: services.tokens,
            lockers: services.lockers,
            locations: services.locations,
            permissions: services.permissions,
            broker: services.broker,
            search,
            radio,
            initialized: AtomicBool::new(false),
        }
    }

    /// Returns `true` once an init action configured the SDK.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// The underlying broker.
    #[must_use]
    pub const fn broker(&self) -> &SubscriptionBroker {
        &self.broker
    }

    /// The search session manager.
    #[must_use]
    pub const fn search(&self) -> &SearchSessionManager {
        &self.search
    }

    /// Drops every stream whose host transport has gone away, without
    /// notifying it. A search loses its session along with its stream.
    ///
    /// Returns the number of streams released.
    pub fn release_orphaned_streams(&self) -> usize {
        let released = self.broker.release_closed();
        if released.contains(&Topic::DeviceSearch) && self.search.stop_search() {
            tracing::info!("search stopped, its host disconnected");
        }
        released.len()
    }

    /// Runs `action` and reports its outcome on `channel`.
    ///
    /// Failures are sent as error results; nothing is returned to the
    /// caller and no failure disturbs other subscriptions.
    pub async fn execute(&self, action: &str, args: &[Value], channel: CallbackChannel) {
        tracing::debug!(action, callback_id = channel.callback_id(), "executing action");
        match self.dispatch(action, args, channel.clone()).await {
            Ok(Some(result)) => {
                channel.send(result);
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(
                    action,
                    code = err.error_code(),
                    error = %err,
                    "action failed"
                );
                channel.send(PluginResult::error(&err));
            }
        }
    }

    async fn dispatch(&self, name: &str, args: &[Value], channel: CallbackChannel) -> ActionResult {
        let action: Action = name.parse()?;
        if action.requires_init() && !self.is_initialized() {
            return Err(BridgeError::NotInitialized);
        }

        match action {
            Action::InitSdk => {
                let config = SdkConfig::online(&args::string_list(action, args)?)?;
                self.init(config).await
            }
            Action::InitWithOfflineConfig => {
                let config = SdkConfig::offline(&args::string_list(action, args)?)?;
                self.init(config).await
            }
            Action::IsPermissionGranted => {
                let snapshot = self.permissions.snapshot();
                Ok(Some(PluginResult::ok_with(json!(snapshot))))
            }
            Action::RequestPermissions => {
                self.permissions.request();
                Ok(Some(PluginResult::ok()))
            }
            Action::EnableBeeper => self.enable_beeper(),
            Action::ApplyToken => self.apply_token(action, args).await,
            Action::SearchDevices => self.search_devices(action, args, channel),
            Action::StopSearching => self.stop_searching(),
            Action::BluetoothState => {
                let state = self.radio.query_state().await;
                Ok(Some(PluginResult::ok_with(state.to_payload())))
            }
            Action::SubscribeBluetoothEvents => {
                self.radio.subscribe_with_immediate_state(channel).await?;
                Ok(None)
            }
            Action::SubscribeToLocations => self.subscribe(Topic::GeofenceEvents, channel),
            Action::SubscribeLogEvents => self.subscribe(Topic::LogStream, channel),
            Action::UnsubscribeBluetoothEvents => Ok(Some(self.end_stream(Topic::RadioState))),
            Action::UnsubscribeFromLocations => Ok(Some(self.end_stream(Topic::GeofenceEvents))),
            Action::UnsubscribeLogEvents => Ok(Some(self.end_stream(Topic::LogStream))),
            Action::GetEnteredShops => {
                let shops = self.locations.entered_shops();
                Ok(Some(PluginResult::ok_with(json!(shops))))
            }
            Action::GetNearbyDevices => {
                let devices: Vec<DeviceSummary> = self
                    .lockers
                    .visible_devices()
                    .iter()
                    .map(DeviceSummary::from)
                    .collect();
                Ok(Some(PluginResult::ok_with(json!(devices))))
            }
        }
    }

    /// Configures the SDK, then attempts sync and beeper start.
    ///
    /// Both startup steps run even if the first fails; every failure is
    /// reported in [`BridgeError::InitIncomplete`]. The SDK counts as
    /// initialized once configured.
    async fn init(&self, config: SdkConfig) -> ActionResult {
        self.sdk
            .configure(&config)
            .map_err(|e| BridgeError::Sdk(e.to_string()))?;
        self.initialized.store(true, Ordering::Release);
        tracing::info!(mode = config.mode(), service_id = config.service_id(), "sdk configured");

        let mut failures = Vec::new();
        if let Err(e) = self.sdk.sync().await {
            tracing::warn!(error = %e, "sdk sync failed, starting beeper anyway");
            failures.push(BridgeError::Sync(e.to_string()));
        }
        if let Err(e) = self.sdk.start_beeper() {
            tracing::warn!(error = %e, "beeper start failed");
            failures.push(BridgeError::Beeper(e.to_string()));
        }

        if failures.is_empty() {
            tracing::info!("sdk initialized");
            Ok(Some(PluginResult::ok()))
        } else {
            Err(BridgeError::InitIncomplete { failures })
        }
    }

    fn enable_beeper(&self) -> ActionResult {
        if !self.permissions.snapshot().is_bt_ready {
            return Err(BridgeError::PermissionDenied);
        }
        self.sdk
            .start_beeper()
            .map_err(|e| BridgeError::Beeper(e.to_string()))?;
        tracing::info!("beeper enabled");
        Ok(Some(PluginResult::ok()))
    }

    async fn apply_token(&self, action: Action, args: &[Value]) -> ActionResult {
        let hex = args::single_string(action, args)?;
        let token = self
            .tokens
            .create(&hex)
            .ok_or_else(|| BridgeError::Token(hex.clone()))?;
        let result = self
            .lockers
            .apply(token)
            .await
            .map_err(|e| BridgeError::Sdk(e.to_string()))?;
        tracing::info!(bytes = result.len(), "token applied");
        Ok(Some(PluginResult::ok_with(json!(result))))
    }

    fn search_devices(&self, action: Action, args: &[Value], channel: CallbackChannel) -> ActionResult {
        let raw = args::string_list(action, args)?;
        let tokens: BTreeSet<Token> = raw
            .iter()
            .map(|hex| hex.trim())
            .filter(|hex| !hex.is_empty())
            .filter_map(|hex| {
                let token = self.tokens.create(hex);
                if token.is_none() {
                    tracing::warn!(hex, "dropping malformed search token");
                }
                token
            })
            .collect();

        // Checked up front so a missing source cannot replace the session.
        if !self.broker.has_topic(Topic::DeviceSearch) {
            return Err(BridgeError::TopicUnavailable(Topic::DeviceSearch));
        }
        self.search.start_search(tokens)?;
        self.search.subscribe(channel)?;
        Ok(None)
    }

    fn stop_searching(&self) -> ActionResult {
        if !self.search.stop_search() {
            return Err(BridgeError::SearchNotActive);
        }
        self.broker.terminate(Topic::DeviceSearch);
        Ok(Some(PluginResult::ok_with(Value::Bool(true))))
    }

    fn subscribe(&self, topic: Topic, channel: CallbackChannel) -> ActionResult {
        self.broker.subscribe(topic, channel)?;
        Ok(None)
    }

    /// Terminates whatever stream is live on `topic` and acknowledges.
    fn end_stream(&self, topic: Topic) -> PluginResult {
        let ended = self.broker.terminate(topic);
        tracing::debug!(%topic, ended, "unsubscribe requested");
        PluginResult::ok()
    }
}
