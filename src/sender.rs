//! Fire-and-forget trap sender.
//!
//! ```no_run
//! use snmp_trapkit::{TrapSender, VarBind, oid};
//! use snmp_trapkit::pdu::oids;
//!
//! # async fn example() -> snmp_trapkit::Result<()> {
//! let sender = TrapSender::builder("127.0.0.1:162")
//!     .community("public")
//!     .build()?;
//!
//! sender
//!     .send_trap_v2(
//!         sender.uptime(),
//!         oids::link_down(),
//!         vec![VarBind::new(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 1, 2), 2)],
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;

use crate::error::{EncodeErrorKind, Error, Result};
use crate::message::Message;
use crate::oid::Oid;
use crate::pdu::{Pdu, TrapV1Pdu};
use crate::transport::UdpTransport;
use crate::util::resolve_addr;
use crate::varbind::VarBind;
use crate::version::Version;

/// A notification ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrapPdu {
    /// Always sent as SNMPv1.
    V1(TrapV1Pdu),
    /// SNMPv2-Trap or InformRequest, sent with the configured version.
    V2(Pdu),
}

impl From<TrapV1Pdu> for TrapPdu {
    fn from(trap: TrapV1Pdu) -> Self {
        TrapPdu::V1(trap)
    }
}

impl From<Pdu> for TrapPdu {
    fn from(pdu: Pdu) -> Self {
        TrapPdu::V2(pdu)
    }
}

/// Sender configuration.
#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// Community string (default: "public")
    pub community: Bytes,
    /// Version used for [`TrapPdu::V2`] (default: v2c)
    pub version: Version,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            community: Bytes::from_static(b"public"),
            version: Version::V2c,
        }
    }
}

/// Builder for [`TrapSender`].
#[derive(Debug, Clone)]
pub struct SenderBuilder {
    target: String,
    config: SenderConfig,
}

impl SenderBuilder {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            config: SenderConfig::default(),
        }
    }

    pub fn community(mut self, community: impl AsRef<[u8]>) -> Self {
        self.config.community = Bytes::copy_from_slice(community.as_ref());
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.config.version = version;
        self
    }

    /// Resolve the target and bind an ephemeral socket. Must run inside a
    /// Tokio runtime.
    pub fn build(self) -> Result<TrapSender> {
        let target = resolve_addr(&self.target)?;
        TrapSender::new(target, self.config)
    }
}

/// Counts from [`TrapSender::send_burst`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BurstReport {
    pub sent: usize,
    pub failed: usize,
}

impl BurstReport {
    pub fn attempted(&self) -> usize {
        self.sent + self.failed
    }
}

/// Sends traps to one receiver over UDP. Nothing is acknowledged or retried.
#[derive(Debug)]
pub struct TrapSender {
    transport: UdpTransport,
    config: SenderConfig,
    request_ids: AtomicI32,
    started: Instant,
}

impl TrapSender {
    pub fn builder(target: impl Into<String>) -> SenderBuilder {
        SenderBuilder::new(target)
    }

    /// Bind a sender for `target`. Must run inside a Tokio runtime.
    pub fn new(target: SocketAddr, config: SenderConfig) -> Result<Self> {
        let transport = UdpTransport::unconnected(target)?;
        tracing::debug!(
            target: "snmp_trapkit::sender",
            { snmp.target = %target,
            snmp.local_addr = %transport.local_addr() },
            "trap sender ready"
        );
        Ok(Self {
            transport,
            config,
            request_ids: AtomicI32::new(1),
            started: Instant::now(),
        })
    }

    pub fn target(&self) -> SocketAddr {
        self.transport.target()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }

    /// Hundredths of a second since the sender was created, for sysUpTime.0.
    pub fn uptime(&self) -> u32 {
        let centis = self.started.elapsed().as_millis() / 10;
        u32::try_from(centis).unwrap_or(u32::MAX)
    }

    fn next_request_id(&self) -> i32 {
        (self.request_ids.fetch_add(1, Ordering::Relaxed) & 0x7FFF_FFFF).max(1)
    }

    /// Encode and send one notification.
    ///
    /// Only Trap-v1, SNMPv2-Trap and InformRequest PDUs are accepted. An
    /// InformRequest is sent but its acknowledgement is not awaited.
    pub async fn send(&self, pdu: impl Into<TrapPdu>) -> Result<()> {
        let message = match pdu.into() {
            TrapPdu::V1(trap) => Message::v1(self.config.community.clone(), trap),
            TrapPdu::V2(pdu) => {
                if !pdu.is_notification() {
                    return Err(Error::encode(EncodeErrorKind::NotANotification(
                        pdu.pdu_type,
                    )));
                }
                Message::new(self.config.version, self.config.community.clone(), pdu)
            }
        };
        self.send_message(&message).await
    }

    /// Send an SNMPv2c trap with sysUpTime.0 and snmpTrapOID.0 prepended to
    /// `varbinds`.
    pub async fn send_trap_v2(
        &self,
        uptime: u32,
        trap_oid: Oid,
        varbinds: Vec<VarBind>,
    ) -> Result<()> {
        let pdu = Pdu::trap_v2(self.next_request_id(), uptime, trap_oid, varbinds);
        self.send_message(&Message::v2c(self.config.community.clone(), pdu))
            .await
    }

    async fn send_message(&self, message: &Message) -> Result<()> {
        let bytes = message.encode()?;
        self.transport.send(&bytes).await?;
        tracing::debug!(
            target: "snmp_trapkit::sender",
            { snmp.target = %self.target(),
            snmp.version = %message.version,
            snmp.pdu_type = %message.pdu.pdu_type(),
            snmp.bytes = bytes.len() },
            "trap sent"
        );
        Ok(())
    }

    /// Send `traps` one after another, pausing `interval` between sends.
    ///
    /// A failed send is logged and counted; the burst carries on.
    pub async fn send_burst<I, T>(&self, traps: I, interval: Duration) -> BurstReport
    where
        I: IntoIterator<Item = T>,
        T: Into<TrapPdu>,
    {
        let mut report = BurstReport::default();
        let mut traps = traps.into_iter().peekable();
        while let Some(trap) = traps.next() {
            match self.send(trap).await {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    tracing::warn!(
                        target: "snmp_trapkit::sender",
                        { snmp.target = %self.target(),
                        index = report.attempted(),
                        error = %e },
                        "burst send failed"
                    );
                    report.failed += 1;
                }
            }
            if traps.peek().is_some() && !interval.is_zero() {
                tokio::time::sleep(interval).await;
            }
        }
        tracing::info!(
            target: "snmp_trapkit::sender",
            { snmp.target = %self.target(),
            sent = report.sent,
            failed = report.failed },
            "burst complete"
        );
        report
    }

    /// Send bytes exactly as given, without validation.
    pub async fn send_raw(&self, bytes: &[u8]) -> Result<()> {
        self.transport.send(bytes).await?;
        tracing::debug!(
            target: "snmp_trapkit::sender",
            { snmp.target = %self.target(),
            snmp.bytes = bytes.len() },
            "raw datagram sent"
        );
        Ok(())
    }
}
