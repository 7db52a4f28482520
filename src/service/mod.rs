//! Service layer: broker specializations.
//!
//! [`SearchSessionManager`] adds token sessions on top of the
//! `DeviceSearch` lane; [`RadioStateProber`] composes a one-shot state
//! probe with the `RadioState` lane.

pub mod radio_service;
pub mod search_service;

pub use radio_service::{RadioStateFeed, RadioStateProber};
pub use search_service::SearchSessionManager;
