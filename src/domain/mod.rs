//! Domain layer: topics, events, snapshots, and tokens.
//!
//! This module contains the bridge's domain model: the event lanes the
//! broker manages, the events flowing through them, the immutable device and
//! shop snapshots they carry, and the opaque authorization tokens.

pub mod device;
pub mod event;
pub mod permission;
pub mod radio;
pub mod token;
pub mod topic;

pub use device::{ConnectionStatus, DeviceSnapshot, DeviceSummary, LockState, ShopSnapshot};
pub use event::{DeviceEventKind, DomainEvent, GeofenceEvent, GeofenceEventKind, LogLine};
pub use permission::PermissionSnapshot;
pub use radio::{RadioEventState, RadioPowerState};
pub use token::Token;
pub use topic::Topic;
