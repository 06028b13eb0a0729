use std::net::SocketAddr;

use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{trace, warn};

use crate::core::{Error, NodeConfig, Result};
use crate::node::{Hooks, Node, Transport};
use crate::time::Clock;

/// Transport that queues encoded frames for the async socket loop.
///
/// `send_packet` never blocks on the network, which keeps dispatch
/// run-to-completion: the frame is handed over synchronously and the runner
/// flushes it to the socket.
#[derive(Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<Bytes>,
}

impl ChannelTransport {
    /// Creates a transport feeding the given outbound queue
    pub fn new(tx: mpsc::UnboundedSender<Bytes>) -> Self {
        ChannelTransport { tx }
    }
}

impl Transport for ChannelTransport {
    fn send_packet(&mut self, frame: &[u8]) -> Result<()> {
        self.tx
            .send(Bytes::copy_from_slice(frame))
            .map_err(|_| Error::transport("outbound queue closed"))
    }
}

/// Runs one node against a UDP socket.
///
/// The receive loop applies the cheap address filter before paying for a
/// decode, hands accepted frames to the node synchronously, flushes the
/// node's queued replies, and drives the master's periodic Sync broadcast.
pub struct NodeRunner<C, H> {
    node: Node<ChannelTransport, C, H>,
    socket: UdpSocket,
    outbound_rx: mpsc::UnboundedReceiver<Bytes>,
    config: NodeConfig,
}

impl<C, H> NodeRunner<C, H>
where
    C: Clock,
    H: Hooks,
{
    /// Binds the socket and wires up a node from the given configuration
    pub async fn bind(config: NodeConfig, clock: C, hooks: H) -> Result<Self> {
        let socket = UdpSocket::bind(config.bind_addr).await?;
        socket.set_broadcast(true)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let node = Node::new(config.address, ChannelTransport::new(tx), clock, hooks);

        Ok(NodeRunner {
            node,
            socket,
            outbound_rx: rx,
            config,
        })
    }

    /// The socket address the runner actually bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Access to the node, e.g. for inspecting role and sync state
    pub fn node(&self) -> &Node<ChannelTransport, C, H> {
        &self.node
    }

    /// Mutable access to the node
    pub fn node_mut(&mut self) -> &mut Node<ChannelTransport, C, H> {
        &mut self.node
    }

    /// Points outbound frames at a new target; useful once a peer's
    /// ephemeral port is known
    pub fn set_peer_addr(&mut self, addr: SocketAddr) {
        self.config.peer_addr = addr;
    }

    /// Runs the receive/send/tick loop until a socket error ends it.
    ///
    /// Per-frame failures (truncated frames, bad arity, unknown peers) are
    /// logged and the loop keeps going; nothing a peer sends is fatal.
    pub async fn run(&mut self) -> Result<()> {
        let mut buf = vec![0u8; self.config.recv_buffer_size];
        let mut sync_tick = tokio::time::interval(self.config.sync_interval);

        let node = &mut self.node;
        let socket = &self.socket;
        let outbound_rx = &mut self.outbound_rx;
        let peer_addr = self.config.peer_addr;

        loop {
            tokio::select! {
                received = socket.recv_from(&mut buf) => {
                    let (len, from) = received?;
                    let frame = &buf[..len];

                    if !node.accepts(frame) {
                        trace!(%from, "frame not addressed to us, discarding");
                        continue;
                    }
                    if let Err(e) = node.handle_frame(frame) {
                        warn!(%from, error = %e, "dropping frame");
                    }
                }

                Some(frame) = outbound_rx.recv() => {
                    if let Err(e) = socket.send_to(&frame, peer_addr).await {
                        warn!(error = %e, "failed to send frame");
                    }
                }

                _ = sync_tick.tick() => {
                    node.broadcast_sync();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::core::{ClockStatus, Role, BROADCAST_ADDRESS};
    use crate::node::NoHooks;
    use crate::protocol::{codec, Command, Message};
    use crate::time::SystemClock;

    fn runner_config(address: u32) -> NodeConfig {
        NodeConfig {
            address,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            peer_addr: "127.0.0.1:9".parse().unwrap(), // patched after bind
            sync_interval: Duration::from_millis(50),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_channel_transport_queues_frames() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut transport = ChannelTransport::new(tx);

        transport.send_packet(&[1, 2, 3]).unwrap();
        assert_eq!(rx.recv().await.unwrap(), Bytes::from_static(&[1, 2, 3]));

        drop(rx);
        assert!(transport.send_packet(&[4]).is_err());
    }

    #[tokio::test]
    async fn test_runner_answers_who_is_here() {
        let probe = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let probe_addr = probe.local_addr().unwrap();

        let mut config = runner_config(0x0A);
        config.peer_addr = probe_addr;
        let mut runner = NodeRunner::bind(config, SystemClock::new(), NoHooks)
            .await
            .unwrap();
        let runner_addr = runner.local_addr().unwrap();

        let handle = tokio::spawn(async move { runner.run().await });

        let msg = Message::new(0x0A, 0x0B, Command::WhoIsHere);
        probe
            .send_to(&codec::encode(&msg).unwrap(), runner_addr)
            .await
            .unwrap();

        let mut buf = [0u8; 64];
        let (len, _) = tokio::time::timeout(Duration::from_secs(2), probe.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();

        let reply = codec::decode(&buf[..len]).unwrap();
        assert_eq!(reply.command, Command::IAmHere);
        assert_eq!(reply.destination, 0x0B);
        assert_eq!(reply.source, 0x0A);

        handle.abort();
    }

    #[tokio::test]
    async fn test_runner_discards_foreign_frames() {
        let probe = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let probe_addr = probe.local_addr().unwrap();

        let mut config = runner_config(0x0A);
        config.peer_addr = probe_addr;
        let mut runner = NodeRunner::bind(config, SystemClock::new(), NoHooks)
            .await
            .unwrap();
        let runner_addr = runner.local_addr().unwrap();

        let handle = tokio::spawn(async move { runner.run().await });

        // Addressed to someone else, then to us; only the second is answered
        let foreign = Message::new(0x99, 0x0B, Command::WhoIsHere);
        probe
            .send_to(&codec::encode(&foreign).unwrap(), runner_addr)
            .await
            .unwrap();
        let ours = Message::new(0x0A, 0x0B, Command::GetTimeFromAll);
        probe
            .send_to(&codec::encode(&ours).unwrap(), runner_addr)
            .await
            .unwrap();

        let mut buf = [0u8; 64];
        let (len, _) = tokio::time::timeout(Duration::from_secs(2), probe.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();

        let reply = codec::decode(&buf[..len]).unwrap();
        assert_eq!(reply.command, Command::ReplyTimeFromAll);

        handle.abort();
    }

    #[tokio::test]
    async fn test_master_tick_broadcasts_sync() {
        let probe = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let probe_addr = probe.local_addr().unwrap();

        let mut config = runner_config(0x0A);
        config.peer_addr = probe_addr;
        let mut runner = NodeRunner::bind(config, SystemClock::new(), NoHooks)
            .await
            .unwrap();
        let runner_addr = runner.local_addr().unwrap();

        let handle = tokio::spawn(async move { runner.run().await });

        // Promote the node to master; the ack and then a Sync tick follow
        let promote = Message::new(0x0A, 0x0B, Command::SetAsMaster);
        probe
            .send_to(&codec::encode(&promote).unwrap(), runner_addr)
            .await
            .unwrap();

        let mut saw_sync = false;
        let mut buf = [0u8; 64];
        for _ in 0..4 {
            let (len, _) =
                tokio::time::timeout(Duration::from_secs(2), probe.recv_from(&mut buf))
                    .await
                    .unwrap()
                    .unwrap();
            let msg = codec::decode(&buf[..len]).unwrap();
            if msg.command == Command::Sync {
                assert_eq!(msg.destination, BROADCAST_ADDRESS);
                assert_eq!(msg.arguments.len(), 2);
                saw_sync = true;
                break;
            }
        }
        assert!(saw_sync, "expected a Sync broadcast from the master tick");

        handle.abort();
    }

    #[tokio::test]
    async fn test_two_runners_complete_a_sync_round() {
        // Master and slave wired straight at each other
        let master_cfg = runner_config(0x01);
        let mut master = NodeRunner::bind(master_cfg, SystemClock::new(), NoHooks)
            .await
            .unwrap();
        let master_addr = master.local_addr().unwrap();

        let slave_cfg = runner_config(0x02);
        let mut slave = NodeRunner::bind(slave_cfg, SystemClock::new(), NoHooks)
            .await
            .unwrap();
        let slave_addr = slave.local_addr().unwrap();

        master.set_peer_addr(slave_addr);
        slave.set_peer_addr(master_addr);

        // Assign roles directly; role negotiation is covered elsewhere
        master
            .node_mut()
            .dispatch(&Message::new(0x01, 0xFF, Command::SetAsMaster))
            .unwrap();
        slave
            .node_mut()
            .dispatch(&Message::new(0x02, 0xFF, Command::SetAsSlave))
            .unwrap();
        // Drain the acks queued by the role commands
        while master.outbound_rx.try_recv().is_ok() {}
        while slave.outbound_rx.try_recv().is_ok() {}

        // Let both loops run for a few sync intervals, then inspect the slave
        let _ = tokio::time::timeout(Duration::from_millis(400), async {
            tokio::join!(
                async {
                    let _ = slave.run().await;
                },
                async {
                    let _ = master.run().await;
                }
            )
        })
        .await;

        assert_eq!(slave.node().state().role(), Role::Slave);
        // At least one full round must have adjusted the slave's clock
        assert_eq!(slave.node().state().clock_status(), ClockStatus::Set);
    }
}
