//! Feed reader front-end core
//!
//! Persisted user settings, the server liveness beacon and the small
//! formatting helpers the pages use.

pub mod config;
pub mod network;
pub mod ui;
pub mod utils;
