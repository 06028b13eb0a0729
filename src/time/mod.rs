//! Time representation and host clock access
//!
//! The protocol never touches the OS clock directly: all reads and writes go
//! through the [`Clock`] trait so a node can run against the real system
//! clock, a software-adjusted clock, or a manually driven clock in tests.

mod clock;

pub use self::clock::{Clock, ManualClock, SystemClock, WallTime};
