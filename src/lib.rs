//! SSNP: Synchronous Sensor Network Protocol
//!
//! This library implements a lightweight node-to-node protocol for sensor
//! networks: addressed command/argument messages over an arbitrary packet
//! transport, plus a two-role (master/slave) clock-synchronization exchange
//! built on the classic four-timestamp delay-request/response scheme.

pub mod core;

pub mod network;
pub mod node;
pub mod protocol;
pub mod sync;
pub mod time;

// Re-export commonly used items
pub use crate::core::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
