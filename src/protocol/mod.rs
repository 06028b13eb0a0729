//! Protocol wire format module
//!
//! This module defines the SSNP command set, the message type, and the
//! encoding/decoding of the fixed-header, variable-argument wire frame.

pub mod codec;
pub mod message;

pub use self::codec::FrameCodec;
pub use self::message::{Command, Message};
