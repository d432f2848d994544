//! Network module
//!
//! Server address parsing, the HTTP liveness client and the beacon loop.

pub mod beacon;
pub mod client;
pub mod endpoint;
