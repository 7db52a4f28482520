//! Bridge error types with host-facing error code mapping.
//!
//! [`BridgeError`] is the central error type for the bridge. Each variant
//! maps to a numeric code and is reported to the host as a failed
//! [`PluginResult`](crate::broker::PluginResult) carrying a structured
//! JSON body. No variant is fatal to the process.

use serde::Serialize;

/// Structured JSON error body sent back through a callback channel.
///
/// ```json
/// {
///   "code": 1002,
///   "message": "invalid token: zz",
///   "details": null
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`BridgeError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Individual failures when several steps failed independently.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

/// Bridge-side error enum with numeric code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category          |
/// |-----------|-------------------|
/// | 1000–1999 | Validation        |
/// | 2000–2999 | State             |
/// | 3000–3999 | SDK               |
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Init arguments have the wrong arity or shape.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A hex string did not decode to a token.
    #[error("invalid token: {0}")]
    Token(String),

    /// The token set for a device search is empty or invalid.
    #[error("invalid search: {0}")]
    Search(String),

    /// Action arguments are not the expected JSON shape.
    #[error("invalid arguments for {action}: {reason}")]
    InvalidArguments {
        /// Action whose arguments were rejected.
        action: String,
        /// What was wrong with them.
        reason: String,
    },

    /// The host asked for an action the bridge does not know.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// The SDK has not been configured yet.
    #[error("sdk not initialized")]
    NotInitialized,

    /// No event source is registered for the topic.
    #[error("no event source registered for topic {0}")]
    TopicUnavailable(crate::domain::Topic),

    /// A stop was requested while no search session was active.
    #[error("no active search session")]
    SearchNotActive,

    /// The platform has not granted the Bluetooth permissions.
    #[error("bluetooth permissions not granted")]
    PermissionDenied,

    /// Remote cache sync failed. Logged; does not block beeper start.
    #[error("unable to sync: {0}")]
    Sync(String),

    /// The beeper failed to start.
    #[error("beeper start failed: {0}")]
    Beeper(String),

    /// The external SDK rejected an operation.
    #[error("sdk error: {0}")]
    Sdk(String),

    /// Init configured the SDK, but one or more startup steps failed.
    #[error("initialization incomplete: {} step(s) failed", failures.len())]
    InitIncomplete {
        /// Every failure, in the order the steps ran.
        failures: Vec<BridgeError>,
    },
}

impl BridgeError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Config(_) => 1001,
            Self::Token(_) => 1002,
            Self::Search(_) => 1003,
            Self::InvalidArguments { .. } => 1004,
            Self::UnknownAction(_) => 1005,
            Self::NotInitialized => 2001,
            Self::TopicUnavailable(_) => 2002,
            Self::SearchNotActive => 2003,
            Self::PermissionDenied => 2004,
            Self::Sync(_) => 3001,
            Self::Beeper(_) => 3002,
            Self::Sdk(_) => 3003,
            Self::InitIncomplete { .. } => 3004,
        }
    }

    /// Builds the JSON error body reported to the host.
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        let details = match self {
            Self::InitIncomplete { failures } => {
                Some(failures.iter().map(ToString::to_string).collect())
            }
            _ => None,
        };
        ErrorBody {
            code: self.error_code(),
            message: self.to_string(),
            details,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_ranges() {
        assert_eq!(BridgeError::Config("x".into()).error_code(), 1001);
        assert_eq!(BridgeError::NotInitialized.error_code(), 2001);
        assert_eq!(BridgeError::Sync("offline".into()).error_code(), 3001);
    }

    #[test]
    fn init_incomplete_lists_every_failure() {
        let err = BridgeError::InitIncomplete {
            failures: vec![
                BridgeError::Sync("timeout".into()),
                BridgeError::Beeper("radio busy".into()),
            ],
        };
        let body = err.body();
        assert_eq!(body.code, 3004);
        let Some(details) = body.details else {
            panic!("expected details");
        };
        assert_eq!(details.len(), 2);
        assert!(details.iter().any(|d| d.contains("timeout")));
        assert!(details.iter().any(|d| d.contains("radio busy")));
    }

    #[test]
    fn plain_errors_have_no_details() {
        let body = BridgeError::Token("zz".into()).body();
        assert!(body.details.is_none());
        let json = serde_json::to_string(&body).unwrap_or_default();
        assert!(!json.contains("details"));
        assert!(json.contains("invalid token: zz"));
    }
}
