//! Bridge configuration.
//!
//! Two layers: [`BridgeConfig`] is the process configuration loaded from
//! environment variables (or a `.env` file via `dotenvy`), and
//! [`SdkConfig`] is the SDK setup the host sends with `initSDK` /
//! `initWithOfflineConfig`.

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::BridgeError;

/// Default settling delay before the radio state is read.
pub const DEFAULT_RADIO_SETTLE_DELAY_MS: u64 = 330;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Top-level process configuration.
///
/// Loaded once at startup via [`BridgeConfig::from_env`].
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Socket address the WebSocket host binds to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Delay between triggering a radio state read and classifying it.
    pub radio_settle_delay: Duration,

    /// Log output format.
    pub log_format: LogFormat,
}

impl BridgeConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()?;

        let radio_settle_delay = Duration::from_millis(parse_env(
            "RADIO_SETTLE_DELAY_MS",
            DEFAULT_RADIO_SETTLE_DELAY_MS,
        ));

        let log_format = match std::env::var("LOG_FORMAT").ok().as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            listen_addr,
            radio_settle_delay,
            log_format,
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// SDK setup sent by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum SdkConfig {
    /// Backend-connected setup.
    Online {
        /// Application key issued by the SDK vendor.
        app_key: String,
        /// Application token issued by the SDK vendor.
        app_token: String,
        /// BLE service identifier the beacons advertise.
        service_id: String,
    },
    /// Setup from a bundled configuration document.
    Offline {
        /// BLE service identifier the beacons advertise.
        service_id: String,
        /// Parsed offline configuration document.
        document: serde_json::Value,
    },
}

impl SdkConfig {
    /// Builds an online config from `[appKey, appToken, serviceId]`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Config`] unless exactly three non-empty
    /// values are given.
    pub fn online(args: &[String]) -> Result<Self, BridgeError> {
        match args {
            [app_key, app_token, service_id] => Ok(Self::Online {
                app_key: non_empty("app key", app_key)?,
                app_token: non_empty("app token", app_token)?,
                service_id: non_empty("service id", service_id)?,
            }),
            _ => Err(BridgeError::Config(format!(
                "expected 3 parameters (app key, app token, service id), got {}",
                args.len()
            ))),
        }
    }

    /// Builds an offline config from `[serviceId, offlineConfigJson]`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Config`] unless exactly two values are given
    /// and the second one is a JSON object.
    pub fn offline(args: &[String]) -> Result<Self, BridgeError> {
        let [service_id, raw] = args else {
            return Err(BridgeError::Config(format!(
                "expected 2 parameters (service id, offline config), got {}",
                args.len()
            )));
        };
        let document: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| BridgeError::Config(format!("offline config is not valid JSON: {e}")))?;
        if !document.is_object() {
            return Err(BridgeError::Config(
                "offline config must be a JSON object".to_string(),
            ));
        }
        Ok(Self::Offline {
            service_id: non_empty("service id", service_id)?,
            document,
        })
    }

    /// BLE service identifier for either variant.
    #[must_use]
    pub fn service_id(&self) -> &str {
        match self {
            Self::Online { service_id, .. } | Self::Offline { service_id, .. } => service_id,
        }
    }

    /// `"online"` or `"offline"`.
    #[must_use]
    pub const fn mode(&self) -> &'static str {
        match self {
            Self::Online { .. } => "online",
            Self::Offline { .. } => "offline",
        }
    }
}

fn non_empty(field: &str, value: &str) -> Result<String, BridgeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BridgeError::Config(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}
