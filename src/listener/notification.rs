//! Received notification types.

use std::net::SocketAddr;
use std::time::SystemTime;

use bytes::Bytes;

use crate::error::{DecodeErrorKind, Error, Result};
use crate::message::{Message, MessagePdu};
use crate::oid::Oid;
use crate::pdu::{PduType, TrapV1Pdu};
use crate::varbind::VarBind;
use crate::version::Version;

/// A decoded notification.
///
/// For v2c traps and informs, `varbinds` holds what follows the
/// sysUpTime.0 / snmpTrapOID.0 header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// SNMPv1 Trap.
    TrapV1 { community: Bytes, trap: TrapV1Pdu },

    /// SNMPv2c Trap (unconfirmed).
    TrapV2c {
        community: Bytes,
        uptime: u32,
        trap_oid: Oid,
        varbinds: Vec<VarBind>,
        request_id: i32,
    },

    /// InformRequest (confirmed); the listener answers it before dispatch.
    InformV2c {
        community: Bytes,
        uptime: u32,
        trap_oid: Oid,
        varbinds: Vec<VarBind>,
        request_id: i32,
    },
}

impl Notification {
    /// Convert a decoded message.
    ///
    /// `Ok(None)` when the message is not a notification. A v2c trap or
    /// inform without TimeTicks and OID in its first two varbinds is a
    /// decode error.
    pub fn from_message(message: Message) -> Result<Option<Self>> {
        let community = message.community;
        let pdu = match message.pdu {
            MessagePdu::TrapV1(trap) => return Ok(Some(Notification::TrapV1 { community, trap })),
            MessagePdu::Pdu(pdu) if pdu.is_notification() => pdu,
            MessagePdu::Pdu(_) => return Ok(None),
        };

        let (uptime, trap_oid) = match pdu.trap_header() {
            Some((uptime, trap_oid)) => (uptime, trap_oid.clone()),
            None => {
                return Err(Error::decode(0, DecodeErrorKind::MissingTrapVarbinds));
            }
        };
        let request_id = pdu.request_id;
        let confirmed = pdu.pdu_type == PduType::InformRequest;
        let varbinds = pdu.varbinds.into_iter().skip(2).collect();

        Ok(Some(if confirmed {
            Notification::InformV2c {
                community,
                uptime,
                trap_oid,
                varbinds,
                request_id,
            }
        } else {
            Notification::TrapV2c {
                community,
                uptime,
                trap_oid,
                varbinds,
                request_id,
            }
        }))
    }

    /// snmpTrapOID; for v1 traps the RFC 3584 translation of
    /// enterprise/generic/specific.
    pub fn trap_oid(&self) -> Oid {
        match self {
            Notification::TrapV1 { trap, .. } => trap.v2_trap_oid(),
            Notification::TrapV2c { trap_oid, .. } | Notification::InformV2c { trap_oid, .. } => {
                trap_oid.clone()
            }
        }
    }

    /// sysUpTime.0, or the v1 time-stamp.
    pub fn uptime(&self) -> u32 {
        match self {
            Notification::TrapV1 { trap, .. } => trap.time_stamp,
            Notification::TrapV2c { uptime, .. } | Notification::InformV2c { uptime, .. } => {
                *uptime
            }
        }
    }

    pub fn varbinds(&self) -> &[VarBind] {
        match self {
            Notification::TrapV1 { trap, .. } => &trap.varbinds,
            Notification::TrapV2c { varbinds, .. } | Notification::InformV2c { varbinds, .. } => {
                varbinds
            }
        }
    }

    pub fn community(&self) -> &[u8] {
        match self {
            Notification::TrapV1 { community, .. }
            | Notification::TrapV2c { community, .. }
            | Notification::InformV2c { community, .. } => community,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Notification::InformV2c { .. })
    }

    pub fn version(&self) -> Version {
        match self {
            Notification::TrapV1 { .. } => Version::V1,
            Notification::TrapV2c { .. } | Notification::InformV2c { .. } => Version::V2c,
        }
    }
}

/// A notification plus where and when it arrived.
#[derive(Debug, Clone)]
pub struct ReceivedTrap {
    pub source: SocketAddr,
    pub received_at: SystemTime,
    pub notification: Notification,
}

impl std::fmt::Display for ReceivedTrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.notification {
            Notification::TrapV1 { .. } => "Trap-v1",
            Notification::TrapV2c { .. } => "SNMPv2-Trap",
            Notification::InformV2c { .. } => "InformRequest",
        };
        write!(
            f,
            "{} from {}: {} uptime={}",
            kind,
            self.source,
            self.notification.trap_oid(),
            self.notification.uptime()
        )?;
        for vb in self.notification.varbinds() {
            write!(f, "\n  {}", vb)?;
        }
        Ok(())
    }
}
