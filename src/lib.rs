//! # beacon-bridge
//!
//! Keep-alive callback bridge between a proximity/beacon SDK and a host
//! application.
//!
//! The host can only receive one-shot or keep-alive callback results, never
//! native streams. The bridge turns the SDK's unbounded, multi-producer
//! event streams (radio state, locker devices, geofences, logs) into
//! single-consumer callback channels: at most one subscriber per topic,
//! current state replayed on (re)subscription, and a terminal result sent to
//! a displaced subscriber before its replacement sees anything.
//!
//! ## Architecture
//!
//! ```text
//! Host (WebSocket)
//!     │
//!     ├── WS Host (ws/)            one DispatchQueue per connection
//!     ├── BeaconBridge (bridge/)   action parsing, init gate
//!     │
//!     ├── SearchSessionManager ─┐
//!     ├── RadioStateProber ─────┤  (service/)
//!     │                         │
//!     ├── SubscriptionBroker (broker/)  one slot per Topic
//!     │
//!     └── SDK seams (sdk/)         lockers, radio, locations, logs
//! ```

pub mod api;
pub mod app_state;
pub mod bridge;
pub mod broker;
pub mod config;
pub mod domain;
pub mod error;
pub mod sdk;
pub mod service;
pub mod ws;
