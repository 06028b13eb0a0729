//! Per-node protocol state and command interpretation
//!
//! A [`Node`] owns its [`NodeState`] together with the injected transport,
//! clock, and hook collaborators, and interprets decoded messages with
//! synchronous, run-to-completion dispatch: each inbound frame is fully
//! handled, replies included, before the next one is looked at.

pub mod interpreter;
pub mod state;

pub use self::interpreter::Node;
pub use self::state::{NodeState, SyncPhase, SyncScratch};

use std::time::Duration;

use crate::core::Result;

/// Packet transport supplied by the host.
///
/// Sending is a direct, blocking call; the core treats failures as
/// best-effort losses and never retries.
pub trait Transport {
    /// Hands one encoded frame to the transport
    fn send_packet(&mut self, frame: &[u8]) -> Result<()>;
}

/// Host callbacks invoked by reserved/extension commands.
///
/// Every method defaults to a no-op so integrations only implement what
/// their hardware supports.
pub trait Hooks {
    /// Run one sampling pass over the given window
    fn trigger_sampling(&mut self, _window: Duration) {}

    /// Start the periodic measurement timer
    fn start_timer(&mut self, _period: Duration) {}

    /// Stop the periodic measurement timer
    fn stop_timer(&mut self) {}

    /// Restart the node's firmware/process
    fn soft_restart(&mut self) {}
}

/// Hook set that does nothing; the default for nodes without measurement
/// hardware
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl Hooks for NoHooks {}
