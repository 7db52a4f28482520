//! WebSocket layer: the host transport.
//!
//! The endpoint at `/ws` carries command envelopes from the host and
//! callback envelopes back, one dispatch queue per connection.

pub mod connection;
pub mod handler;
pub mod messages;
