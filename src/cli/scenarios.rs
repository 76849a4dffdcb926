//! Trap scenarios sent by `snmp-trap-send`.
//!
//! Each scenario is a fixed notification shape used to exercise a trap
//! receiver: a cold start, a server alert, an interface going down, a
//! custom enterprise trap, a numbered burst, and a raw hand-built v1
//! datagram.

use std::fmt;
use std::time::Duration;

use clap::ValueEnum;

use crate::oid;
use crate::oid::Oid;
use crate::pdu::Pdu;
use crate::sender::TrapSender;
use crate::value::Value;
use crate::varbind::VarBind;

/// Pause between scenarios when running `all`.
pub const SUITE_PAUSE: Duration = Duration::from_secs(1);

/// Hand-built SNMPv1 Trap-PDU used as a receiver smoke test.
///
/// The enterprise OID declares 8 content octets but carries 7, so the
/// length fields disagree with the payload. A conforming decoder rejects
/// it; [`TrapSender::send_raw`] delivers it unchanged.
pub const RAW_V1_TRAP: &[u8] = &[
    0x30, 0x82, 0x00, 0x4a, // message SEQUENCE
    0x02, 0x01, 0x00, // version: v1
    0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c', // community
    0xa4, 0x3d, // Trap-PDU
    0x06, 0x08, 0x2b, 0x06, 0x01, 0x04, 0x01, 0xce, 0x0f, // enterprise
    0x40, 0x04, 0x7f, 0x00, 0x00, 0x01, // agent-addr 127.0.0.1
    0x02, 0x01, 0x06, // generic-trap: enterpriseSpecific
    0x02, 0x01, 0x01, // specific-trap
    0x43, 0x04, 0x12, 0x34, 0x56, 0x78, // time-stamp
    0x30, 0x00, // varbinds
];

/// A named trap scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Single trap with no payload.
    Basic,
    /// Server alert with host name, CPU, memory and a message.
    Server,
    /// linkDown for ifIndex 2.
    Interface,
    /// Custom enterprise trap carrying every common value type.
    Custom,
    /// `--count` numbered traps, `--interval` apart.
    Burst,
    /// The hand-built v1 datagram, sent without encoding.
    Raw,
    /// Every scenario above, in order.
    All,
}

impl Scenario {
    const SUITES: [Scenario; 6] = [
        Scenario::Basic,
        Scenario::Server,
        Scenario::Interface,
        Scenario::Custom,
        Scenario::Burst,
        Scenario::Raw,
    ];

    /// Concrete scenarios to run; `All` expands to each of them.
    pub fn expand(self) -> Vec<Scenario> {
        match self {
            Scenario::All => Self::SUITES.to_vec(),
            other => vec![other],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Scenario::Basic => "basic",
            Scenario::Server => "server",
            Scenario::Interface => "interface",
            Scenario::Custom => "custom",
            Scenario::Burst => "burst",
            Scenario::Raw => "raw",
            Scenario::All => "all",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of one scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ScenarioOutcome {
    pub scenario: Scenario,
    pub sent: usize,
    pub failed: usize,
}

impl ScenarioOutcome {
    /// A burst passes if anything went out; other scenarios need every
    /// send to succeed.
    pub fn passed(&self) -> bool {
        match self.scenario {
            Scenario::Burst => self.sent > 0,
            _ => self.sent > 0 && self.failed == 0,
        }
    }
}

impl serde::Serialize for Scenario {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

pub fn basic_trap() -> Pdu {
    Pdu::trap_v2(1, 12345, oid!(1, 3, 6, 1, 4, 1, 20408, 4, 1, 1, 2), vec![])
}

pub fn server_trap() -> Pdu {
    Pdu::trap_v2(
        2,
        456789,
        oid!(1, 3, 6, 1, 4, 1, 2021, 251, 1),
        vec![
            VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), "server01.company.com"),
            VarBind::new(oid!(1, 3, 6, 1, 4, 1, 2021, 11, 11, 0), 95),
            VarBind::new(oid!(1, 3, 6, 1, 4, 1, 2021, 4, 6, 0), 1024),
            VarBind::new(
                oid!(1, 3, 6, 1, 4, 1, 2021, 251, 1, 1),
                "High CPU usage detected",
            ),
        ],
    )
}

pub fn interface_trap() -> Pdu {
    let if_entry = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1);
    Pdu::trap_v2(
        3,
        789012,
        crate::pdu::oids::link_down(),
        vec![
            VarBind::new(if_entry.child(1).child(2), 2),
            VarBind::new(if_entry.child(2).child(2), "GigabitEthernet0/2"),
            VarBind::new(if_entry.child(7).child(2), 2),
            VarBind::new(if_entry.child(8).child(2), 2),
        ],
    )
}

pub fn custom_trap() -> Pdu {
    let base = oid!(1, 3, 6, 1, 4, 1, 99999, 1, 1);
    Pdu::trap_v2(
        4,
        987654,
        base.child(1),
        vec![
            VarBind::new(base.child(1), "snmp-trapkit test application"),
            VarBind::new(base.child(2), 42),
            VarBind::new(base.child(3), "Test trap from the snmp-trapkit suite"),
            VarBind::new(base.child(4), Value::IpAddress([192, 168, 1, 100])),
        ],
    )
}

/// Trap number `index` (zero-based) of a burst.
pub fn burst_trap(index: usize) -> Pdu {
    let base = oid!(1, 3, 6, 1, 4, 1, 99999, 1, 2);
    let n = i32::try_from(index + 1).unwrap_or(i32::MAX);
    let uptime = 100_000u32.saturating_add((index as u32).saturating_mul(1000));
    Pdu::trap_v2(
        100 + n,
        uptime,
        base.child(1),
        vec![
            VarBind::new(base.child(1), format!("Burst test trap #{}", n)),
            VarBind::new(base.child(2), n),
        ],
    )
}

fn trap_oid_of(pdu: &Pdu) -> Option<&Oid> {
    pdu.trap_header().map(|(_, oid)| oid)
}

/// Run one concrete scenario. `All` runs nothing; expand it first.
pub async fn run(
    sender: &TrapSender,
    scenario: Scenario,
    count: usize,
    interval: Duration,
) -> ScenarioOutcome {
    let mut outcome = ScenarioOutcome {
        scenario,
        sent: 0,
        failed: 0,
    };

    let single = match scenario {
        Scenario::Basic => Some(basic_trap()),
        Scenario::Server => Some(server_trap()),
        Scenario::Interface => Some(interface_trap()),
        Scenario::Custom => Some(custom_trap()),
        Scenario::Burst => {
            let report = sender
                .send_burst((0..count).map(burst_trap), interval)
                .await;
            outcome.sent = report.sent;
            outcome.failed = report.failed;
            return outcome;
        }
        Scenario::Raw => {
            match sender.send_raw(RAW_V1_TRAP).await {
                Ok(()) => outcome.sent = 1,
                Err(e) => {
                    tracing::warn!(target: "snmp_trapkit::sender", error = %e, "raw send failed");
                    outcome.failed = 1;
                }
            }
            return outcome;
        }
        Scenario::All => None,
    };

    if let Some(pdu) = single {
        let trap_oid = trap_oid_of(&pdu).cloned();
        match sender.send(pdu).await {
            Ok(()) => {
                tracing::info!(
                    target: "snmp_trapkit::sender",
                    scenario = %scenario,
                    trap_oid = ?trap_oid,
                    "scenario trap sent"
                );
                outcome.sent = 1;
            }
            Err(e) => {
                tracing::warn!(
                    target: "snmp_trapkit::sender",
                    scenario = %scenario,
                    error = %e,
                    "scenario trap failed"
                );
                outcome.failed = 1;
            }
        }
    }
    outcome
}
