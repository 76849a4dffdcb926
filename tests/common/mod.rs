//! Shared test infrastructure for snmp-trapkit.
//!
//! Provides TestAgent (in-process SNMP agent), faulty agents, fixtures and
//! trap helpers.

// Allow dead code and unused imports since not all test files use all utilities
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod agent;
pub mod faulty;
pub mod fixtures;

pub use fixtures::{combined, interface_table, system_mib};
pub use fixtures::{
    COMMUNITY_RO, COMMUNITY_RW, interfaces_subtree, nonexistent_oid, sys_contact, sys_descr,
    sys_name, system_subtree,
};

pub use agent::{TestAgent, TestAgentBuilder};
pub use faulty::{NonIncreasingAgent, SilentAgent};

use snmp_trapkit::{ReceivedTrap, TrapListener};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

/// Start a listener on an ephemeral localhost port.
pub async fn start_listener(listener: &mut TrapListener) -> SocketAddr {
    listener
        .start("127.0.0.1:0".parse().unwrap())
        .await
        .expect("listener failed to start")
}

/// Next dispatched trap, or panic after one second.
pub async fn next_trap(rx: &mut UnboundedReceiver<ReceivedTrap>) -> ReceivedTrap {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("no trap within 1s")
        .expect("handler channel closed")
}

/// Poll `check` until it holds or one second passes.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
