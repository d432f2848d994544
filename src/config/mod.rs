//! Configuration module
//!
//! Typed user preferences and the durable store they are mirrored into.

pub mod settings;
pub mod storage;
