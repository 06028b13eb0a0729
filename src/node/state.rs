use crate::core::{ClockStatus, Role};
use crate::time::WallTime;

/// Where a slave node stands inside a synchronization round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// No round in flight
    Idle,
    /// DelayRequest sent, waiting for the master's DelayResponse.
    ///
    /// There is no timeout: a round that never completes parks here until
    /// the next Sync overwrites the scratch timestamps.
    AwaitingDelayResponse,
}

/// Working timestamps for one in-flight synchronization round, in
/// microseconds since the epoch.
///
/// Overwritten at the start of every round, never explicitly reset; the
/// values are meaningless outside an active round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncScratch {
    /// Master's send time of the Sync broadcast
    pub t1: i64,
    /// Local receive time of the Sync broadcast
    pub t2: i64,
    /// Local send time of the DelayRequest
    pub t3: i64,
    /// Master's send time of the DelayResponse
    pub t4: i64,
}

/// Per-node identity, role, and synchronization scratch data.
///
/// One instance per protocol participant, created at node startup and owned
/// exclusively by it; the interpreter and the sync engine mutate it through
/// an exclusive reference during a single synchronous dispatch, so no
/// locking is involved.
#[derive(Debug)]
pub struct NodeState {
    address: u32,
    pub(crate) role: Role,
    pub(crate) clock_status: ClockStatus,
    pub(crate) last_receipt: WallTime,
    pub(crate) phase: SyncPhase,
    pub(crate) scratch: SyncScratch,
}

impl NodeState {
    /// Creates the state for a node with the given protocol address
    pub fn new(address: u32) -> Self {
        NodeState {
            address,
            role: Role::Undefined,
            clock_status: ClockStatus::Unset,
            last_receipt: WallTime::default(),
            phase: SyncPhase::Idle,
            scratch: SyncScratch::default(),
        }
    }

    /// This node's own address; immutable after creation
    pub fn address(&self) -> u32 {
        self.address
    }

    /// Current operating role
    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether the protocol has ever written the local clock
    pub fn clock_status(&self) -> ClockStatus {
        self.clock_status
    }

    /// Receive instant of the most recently processed frame
    pub fn last_receipt(&self) -> WallTime {
        self.last_receipt
    }

    /// Current synchronization phase
    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    /// The four round timestamps as last written
    pub fn scratch(&self) -> SyncScratch {
        self.scratch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_state() {
        let state = NodeState::new(0x42);
        assert_eq!(state.address(), 0x42);
        assert_eq!(state.role(), Role::Undefined);
        assert_eq!(state.clock_status(), ClockStatus::Unset);
        assert_eq!(state.phase(), SyncPhase::Idle);
        assert_eq!(state.scratch(), SyncScratch::default());
    }
}
