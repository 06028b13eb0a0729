use std::time::Duration;

use ssnp::core::NodeConfig;
use ssnp::network::NodeRunner;
use ssnp::node::NoHooks;
use ssnp::protocol::{Command, Message};
use ssnp::time::SystemClock;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // Two nodes on loopback: node 1 becomes master, node 2 becomes slave,
    // then the master's periodic Sync broadcast drives a few rounds.
    let master_config = NodeConfig {
        address: 1,
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        peer_addr: "127.0.0.1:9".parse().unwrap(), // patched once ports are known
        sync_interval: Duration::from_secs(1),
        ..Default::default()
    };
    let slave_config = NodeConfig {
        address: 2,
        ..master_config.clone()
    };

    let mut master = NodeRunner::bind(master_config, SystemClock::new(), NoHooks)
        .await
        .expect("failed to bind master");
    let mut slave = NodeRunner::bind(slave_config, SystemClock::new(), NoHooks)
        .await
        .expect("failed to bind slave");

    let master_addr = master.local_addr().expect("master address");
    let slave_addr = slave.local_addr().expect("slave address");
    println!("master on {master_addr}, slave on {slave_addr}");

    master.set_peer_addr(slave_addr);
    slave.set_peer_addr(master_addr);

    // Assign roles directly instead of sending SetAsMaster/SetAsSlave frames
    // from a third node
    master
        .node_mut()
        .dispatch(&Message::new(1, 0xFF, Command::SetAsMaster))
        .expect("role assignment");
    slave
        .node_mut()
        .dispatch(&Message::new(2, 0xFF, Command::SetAsSlave))
        .expect("role assignment");

    println!("running five seconds of sync rounds...");
    let _ = tokio::time::timeout(Duration::from_secs(5), async {
        tokio::join!(
            async {
                if let Err(e) = master.run().await {
                    eprintln!("master loop ended: {e}");
                }
            },
            async {
                if let Err(e) = slave.run().await {
                    eprintln!("slave loop ended: {e}");
                }
            }
        )
    })
    .await;

    println!(
        "slave role: {:?}, clock status: {:?}, phase: {:?}",
        slave.node().state().role(),
        slave.node().state().clock_status(),
        slave.node().state().phase(),
    );
    println!(
        "last round scratch (us since epoch): {:?}",
        slave.node().state().scratch(),
    );
}
