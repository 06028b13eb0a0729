use std::time::Duration;

use tracing::{debug, trace, warn};

use super::state::{NodeState, SyncPhase};
use super::{Hooks, Transport};
use crate::core::{ClockStatus, Error, Result, Role, BROADCAST_ADDRESS};
use crate::protocol::{codec, Command, Message};
use crate::sync;
use crate::time::{Clock, WallTime};

/// A protocol participant: node state plus the injected transport, clock,
/// and hook collaborators.
///
/// Dispatch is synchronous and run-to-completion; nothing here needs locking
/// because at most one logical thread of control ever touches a node.
pub struct Node<T, C, H> {
    state: NodeState,
    transport: T,
    clock: C,
    hooks: H,
}

impl<T, C, H> Node<T, C, H>
where
    T: Transport,
    C: Clock,
    H: Hooks,
{
    /// Creates a node with the given address and collaborators
    pub fn new(address: u32, transport: T, clock: C, hooks: H) -> Self {
        Node {
            state: NodeState::new(address),
            transport,
            clock,
            hooks,
        }
    }

    /// Read access to the node's protocol state
    pub fn state(&self) -> &NodeState {
        &self.state
    }

    /// Read access to the node's clock
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Pre-decode address filter; reads only the frame's destination field
    pub fn accepts(&self, frame: &[u8]) -> bool {
        codec::accepts(self.state.address(), frame)
    }

    /// Decodes and fully interprets one inbound frame.
    ///
    /// The receipt timestamp is captured before decoding starts so the sync
    /// handlers see the wire-arrival instant rather than processing latency.
    pub fn handle_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.state.last_receipt = self.clock.now();
        let msg = codec::decode(frame)?;
        self.dispatch(&msg)
    }

    /// Interprets one decoded message
    pub fn dispatch(&mut self, msg: &Message) -> Result<()> {
        debug!(command = ?msg.command, source = msg.source, "dispatching command");

        match msg.command {
            Command::WhoIsHere => {
                let reply = Message::new(msg.source, self.state.address(), Command::IAmHere);
                self.send_best_effort(&reply);
                Ok(())
            }

            Command::SetAsMaster => {
                self.state.role = Role::Master;
                self.acknowledge(msg);
                Ok(())
            }

            Command::SetAsSlave => {
                self.state.role = Role::Slave;
                self.acknowledge(msg);
                Ok(())
            }

            Command::SetTimeOverwrite => {
                let time = wall_time_arguments(msg)?;
                self.clock.set(time);
                self.state.clock_status = ClockStatus::Set;
                self.acknowledge(msg);
                Ok(())
            }

            Command::GetTimeFromAll => {
                let now = self.clock.now();
                let reply = Message::with_arguments(
                    msg.source,
                    self.state.address(),
                    Command::ReplyTimeFromAll,
                    vec![now.seconds, now.micros],
                );
                self.send_best_effort(&reply);
                Ok(())
            }

            Command::Sync => self.handle_sync(msg),
            Command::DelayRequest => self.handle_delay_request(msg),
            Command::DelayResponse => self.handle_delay_response(msg),

            Command::ConfigureMeasurement => {
                let period = match msg.arguments.as_slice() {
                    [millis] => *millis,
                    args => {
                        return Err(Error::invalid_argument(format!(
                            "ConfigureMeasurement expects one argument, got {}",
                            args.len()
                        )))
                    }
                };
                if period == 0 {
                    self.hooks.stop_timer();
                } else {
                    self.hooks.start_timer(Duration::from_millis(period as u64));
                }
                Ok(())
            }

            Command::Reset => {
                self.hooks.soft_restart();
                Ok(())
            }

            Command::IAmHere
            | Command::ReplyTimeFromAll
            | Command::Ack
            | Command::MeasurementReport => {
                debug!(command = ?msg.command, "no handler, ignoring");
                Ok(())
            }

            Command::Unknown(code) => {
                debug!(code, "unknown command code, ignoring");
                Ok(())
            }
        }
    }

    /// Master's periodic tick: broadcasts a Sync frame carrying the current
    /// send time. Silent no-op in any other role.
    pub fn broadcast_sync(&mut self) {
        if self.state.role != Role::Master {
            trace!(role = ?self.state.role, "sync tick outside master role, skipping");
            return;
        }

        let now = self.clock.now();
        let msg = Message::with_arguments(
            BROADCAST_ADDRESS,
            self.state.address(),
            Command::Sync,
            vec![now.seconds, now.micros],
        );
        self.send_best_effort(&msg);
    }

    /// Host timer callback entry point: forwards a sampling trigger to the
    /// installed hooks
    pub fn trigger_sampling(&mut self, window: Duration) {
        self.hooks.trigger_sampling(window);
    }

    fn handle_sync(&mut self, msg: &Message) -> Result<()> {
        if self.state.role != Role::Slave {
            trace!(role = ?self.state.role, "ignoring Sync outside slave role");
            return Ok(());
        }

        let master_send = wall_time_arguments(msg)?;
        sync::begin_round(&mut self.state, master_send);

        let request = Message::new(BROADCAST_ADDRESS, self.state.address(), Command::DelayRequest);
        self.send_best_effort(&request);

        // t3 is taken right after the send call returns; it stands in for
        // the master's receive instant in the delay formula.
        sync::note_request_sent(&mut self.state, self.clock.now());
        Ok(())
    }

    fn handle_delay_request(&mut self, msg: &Message) -> Result<()> {
        if self.state.role != Role::Master {
            trace!(role = ?self.state.role, "ignoring DelayRequest outside master role");
            return Ok(());
        }

        let now = self.clock.now();
        let reply = Message::with_arguments(
            msg.source,
            self.state.address(),
            Command::DelayResponse,
            vec![now.seconds, now.micros],
        );
        self.send_best_effort(&reply);
        Ok(())
    }

    fn handle_delay_response(&mut self, msg: &Message) -> Result<()> {
        if self.state.role != Role::Slave {
            trace!(role = ?self.state.role, "ignoring DelayResponse outside slave role");
            return Ok(());
        }
        if self.state.phase != SyncPhase::AwaitingDelayResponse {
            trace!("ignoring DelayResponse with no round in flight");
            return Ok(());
        }

        let master_send = wall_time_arguments(msg)?;
        sync::complete_round(&mut self.state, &mut self.clock, master_send);
        Ok(())
    }

    /// Replies with an Ack carrying the acknowledged command's wire code as
    /// its single argument
    fn acknowledge(&mut self, msg: &Message) {
        let ack = Message::with_arguments(
            msg.source,
            self.state.address(),
            Command::Ack,
            vec![msg.command.code()],
        );
        self.send_best_effort(&ack);
    }

    /// Encodes and sends one message; failures are logged, never retried,
    /// and never roll back state the handler already mutated
    fn send_best_effort(&mut self, msg: &Message) {
        let frame = match codec::encode(msg) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(command = ?msg.command, error = %e, "failed to encode reply");
                return;
            }
        };
        if let Err(e) = self.transport.send_packet(&frame) {
            warn!(command = ?msg.command, error = %e, "failed to send reply");
        }
    }
}

/// Interprets a message's arguments as a `(seconds, microseconds)` pair
fn wall_time_arguments(msg: &Message) -> Result<WallTime> {
    match msg.arguments.as_slice() {
        [seconds, micros] => Ok(WallTime::new(*seconds, *micros)),
        args => Err(Error::invalid_argument(format!(
            "{:?} expects (seconds, microseconds), got {} arguments",
            msg.command,
            args.len()
        ))),
    }
}
