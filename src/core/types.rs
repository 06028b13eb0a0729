use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A node's operating mode, governing which synchronization commands it acts on.
///
/// Starts [`Role::Undefined`] and only ever changes when a `SetAsMaster` or
/// `SetAsSlave` command is received; it never reverts automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// No role assigned yet; synchronization commands are ignored
    Undefined,
    /// Follows a master's clock
    Slave,
    /// Broadcasts Sync frames and answers delay requests
    Master,
}

/// Whether the local clock has ever been written by the protocol.
///
/// Recorded but never branched on; kept for observability only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockStatus {
    /// Clock still runs on whatever the host booted with
    Unset,
    /// Clock was written at least once (time overwrite or sync adjustment)
    Set,
}

/// Configuration for an SSNP node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// This node's protocol address
    pub address: u32,
    /// Local socket address to bind to
    pub bind_addr: SocketAddr,
    /// Socket address outbound frames are sent to (broadcast or peer)
    pub peer_addr: SocketAddr,
    /// Interval between Sync broadcasts while acting as master
    #[serde(serialize_with = "super::serde::serialize_duration")]
    #[serde(deserialize_with = "super::serde::deserialize_duration")]
    pub sync_interval: Duration,
    /// Receive buffer size in bytes
    pub recv_buffer_size: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            address: 1,
            bind_addr: format!("0.0.0.0:{}", super::DEFAULT_PORT).parse().unwrap(),
            peer_addr: format!("255.255.255.255:{}", super::DEFAULT_PORT)
                .parse()
                .unwrap(),
            sync_interval: Duration::from_secs(1),
            recv_buffer_size: super::MAX_FRAME_SIZE,
        }
    }
}
