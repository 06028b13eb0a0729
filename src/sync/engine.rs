use tracing::info;

use crate::core::ClockStatus;
use crate::node::{NodeState, SyncPhase, SyncScratch};
use crate::time::{Clock, WallTime};

/// Estimated one-way propagation/processing delay for a completed round,
/// in microseconds: `((t4 - t1) - (t3 - t2)) / 2`.
///
/// Integer division truncates toward zero. Note that `t3` is the slave's own
/// send instant of the delay request, standing in for the master's receive
/// instant; the estimate is only exact when send latency is negligible.
pub fn delay_micros(scratch: &SyncScratch) -> i64 {
    ((scratch.t4 - scratch.t1) - (scratch.t3 - scratch.t2)) / 2
}

/// Estimated difference between the local clock and the master's clock at
/// the midpoint of a round, in microseconds: `t2 - t1 - delay`.
pub fn offset_micros(scratch: &SyncScratch) -> i64 {
    scratch.t2 - scratch.t1 - delay_micros(scratch)
}

/// Starts a round: records the master's send time (`t1`) and the local
/// receive instant of the Sync broadcast (`t2`).
///
/// Overwrites whatever the scratch held before, implicitly abandoning any
/// half-finished round.
pub(crate) fn begin_round(state: &mut NodeState, master_send: WallTime) {
    state.scratch.t1 = master_send.as_micros();
    state.scratch.t2 = state.last_receipt.as_micros();
}

/// Records the local send instant of the DelayRequest (`t3`) and arms the
/// wait for the master's response.
pub(crate) fn note_request_sent(state: &mut NodeState, sent_at: WallTime) {
    state.scratch.t3 = sent_at.as_micros();
    state.phase = SyncPhase::AwaitingDelayResponse;
}

/// Finishes a round: records `t4`, computes delay and offset, and steps the
/// local clock by the offset.
///
/// The clock read and the clock write sit next to each other so the
/// adjustment goes stale as little as possible.
pub(crate) fn complete_round<C: Clock>(
    state: &mut NodeState,
    clock: &mut C,
    master_send: WallTime,
) -> (i64, i64) {
    state.scratch.t4 = master_send.as_micros();

    let delay = delay_micros(&state.scratch);
    let offset = offset_micros(&state.scratch);

    let now = clock.now();
    clock.set(WallTime::from_micros(now.as_micros() - offset));

    state.clock_status = ClockStatus::Set;
    state.phase = SyncPhase::Idle;

    info!(delay_us = delay, offset_us = offset, "sync round complete");
    (delay, offset)
}
