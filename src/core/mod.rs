//! Core types and traits for the SSNP protocol
//!
//! This module contains the fundamental building blocks used throughout the library.

pub mod error;
pub mod serde;
pub mod types;

pub use self::error::{Error, Result};
pub use self::types::{ClockStatus, NodeConfig, Role};

/// Reserved destination address every node accepts
pub const BROADCAST_ADDRESS: u32 = 0xFFFF_FFFF;

/// Fixed frame header size: destination (4) + source (4) + command (3) + count (1)
pub const HEADER_LEN: usize = 12;

/// Maximum argument-list length representable in the one-byte count field
pub const MAX_ARGUMENTS: usize = 255;

/// Largest possible encoded frame
pub const MAX_FRAME_SIZE: usize = HEADER_LEN + 4 * MAX_ARGUMENTS;

/// Default port for SSNP communication
pub const DEFAULT_PORT: u16 = 4141;
