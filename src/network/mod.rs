//! Network transport adapter
//!
//! The protocol core is transport agnostic; this module supplies the UDP
//! glue that moves frames for it: a queueing [`ChannelTransport`] the node
//! writes replies into, and a [`NodeRunner`] select loop that receives
//! datagrams, filters them by address, dispatches, flushes replies, and
//! drives the master's periodic Sync broadcast.

mod connection;

pub use self::connection::{ChannelTransport, NodeRunner};
