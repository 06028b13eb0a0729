//! Clock synchronization engine
//!
//! Implements the four-timestamp delay-request/response arithmetic and the
//! slave-side round bookkeeping. One round at a time, no round identifiers:
//! a new Sync restarts the scratch state and invalidates any in-flight round.

mod engine;

pub use self::engine::{delay_micros, offset_micros};

pub(crate) use self::engine::{begin_round, complete_round, note_request_sent};
