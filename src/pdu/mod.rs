//! SNMP Protocol Data Units.
//!
//! Two shapes exist on the wire. Every v1/v2c operation except the v1 trap
//! uses [`Pdu`] (request-id, error-status, error-index, varbinds). The v1
//! trap ([`TrapV1Pdu`], tag `0xA4`) has its own flat layout.

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{DecodeErrorKind, EncodeErrorKind, Error, ErrorStatus, Result};
use crate::oid::Oid;
use crate::value::Value;
use crate::varbind::{VarBind, decode_varbind_list, encode_varbind_list};

/// Well-known notification OIDs (SNMPv2-MIB).
pub mod oids {
    use crate::{Oid, oid};

    /// sysUpTime.0, first varbind of every v2c notification.
    pub fn sys_uptime() -> Oid {
        oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)
    }

    /// snmpTrapOID.0, second varbind of every v2c notification.
    pub fn snmp_trap_oid() -> Oid {
        oid!(1, 3, 6, 1, 6, 3, 1, 1, 4, 1, 0)
    }

    /// snmpTrapEnterprise.0, carried when a v1 trap is translated to v2c.
    pub fn snmp_trap_enterprise() -> Oid {
        oid!(1, 3, 6, 1, 6, 3, 1, 1, 4, 3, 0)
    }

    /// snmpTraps; the generic traps are `snmpTraps.{1..6}`.
    pub fn snmp_traps() -> Oid {
        oid!(1, 3, 6, 1, 6, 3, 1, 1, 5)
    }

    pub fn cold_start() -> Oid {
        snmp_traps().child(1)
    }

    pub fn warm_start() -> Oid {
        snmp_traps().child(2)
    }

    pub fn link_down() -> Oid {
        snmp_traps().child(3)
    }

    pub fn link_up() -> Oid {
        snmp_traps().child(4)
    }

    pub fn auth_failure() -> Oid {
        snmp_traps().child(5)
    }
}

/// PDU type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum PduType {
    GetRequest = tag::pdu::GET_REQUEST,
    GetNextRequest = tag::pdu::GET_NEXT_REQUEST,
    Response = tag::pdu::RESPONSE,
    SetRequest = tag::pdu::SET_REQUEST,
    TrapV1 = tag::pdu::TRAP_V1,
    GetBulkRequest = tag::pdu::GET_BULK_REQUEST,
    InformRequest = tag::pdu::INFORM_REQUEST,
    TrapV2 = tag::pdu::TRAP_V2,
    Report = tag::pdu::REPORT,
}

impl PduType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        use PduType::*;
        [
            GetRequest,
            GetNextRequest,
            Response,
            SetRequest,
            TrapV1,
            GetBulkRequest,
            InformRequest,
            TrapV2,
            Report,
        ]
        .into_iter()
        .find(|t| t.tag() == tag)
    }

    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Types introduced by SNMPv2 and absent from v1.
    pub fn is_v2_only(self) -> bool {
        matches!(
            self,
            PduType::GetBulkRequest | PduType::InformRequest | PduType::TrapV2 | PduType::Report
        )
    }
}

impl std::fmt::Display for PduType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::GetRequest => "GetRequest",
            Self::GetNextRequest => "GetNextRequest",
            Self::Response => "Response",
            Self::SetRequest => "SetRequest",
            Self::TrapV1 => "Trap",
            Self::GetBulkRequest => "GetBulkRequest",
            Self::InformRequest => "InformRequest",
            Self::TrapV2 => "SNMPv2-Trap",
            Self::Report => "Report",
        };
        f.write_str(name)
    }
}

/// Request/response-shaped PDU.
///
/// For `GetBulkRequest` the `error_status` and `error_index` slots carry
/// non-repeaters and max-repetitions; see [`Pdu::get_bulk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pdu {
    pub pdu_type: PduType,
    pub request_id: i32,
    pub error_status: i32,
    /// 1-based index of the offending varbind; 0 means the whole PDU.
    pub error_index: i32,
    pub varbinds: Vec<VarBind>,
}

impl Pdu {
    fn with_nulls(pdu_type: PduType, request_id: i32, oids: &[Oid]) -> Self {
        Self {
            pdu_type,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds: oids.iter().cloned().map(VarBind::null).collect(),
        }
    }

    pub fn get_request(request_id: i32, oids: &[Oid]) -> Self {
        Self::with_nulls(PduType::GetRequest, request_id, oids)
    }

    pub fn get_next_request(request_id: i32, oids: &[Oid]) -> Self {
        Self::with_nulls(PduType::GetNextRequest, request_id, oids)
    }

    pub fn set_request(request_id: i32, varbinds: Vec<VarBind>) -> Self {
        Self {
            pdu_type: PduType::SetRequest,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds,
        }
    }

    /// GETBULK request.
    pub fn get_bulk(
        request_id: i32,
        non_repeaters: i32,
        max_repetitions: i32,
        oids: &[Oid],
    ) -> Self {
        let mut pdu = Self::with_nulls(PduType::GetBulkRequest, request_id, oids);
        pdu.error_status = non_repeaters;
        pdu.error_index = max_repetitions;
        pdu
    }

    /// SNMPv2-Trap with sysUpTime.0 and snmpTrapOID.0 prepended to `varbinds`.
    ///
    /// ```
    /// use snmp_trapkit::pdu::{Pdu, oids};
    ///
    /// let pdu = Pdu::trap_v2(1, 4200, oids::cold_start(), vec![]);
    /// assert_eq!(pdu.varbinds.len(), 2);
    /// assert_eq!(pdu.trap_header().unwrap(), (4200, &oids::cold_start()));
    /// ```
    pub fn trap_v2(request_id: i32, uptime: u32, trap_oid: Oid, varbinds: Vec<VarBind>) -> Self {
        Self::notification(PduType::TrapV2, request_id, uptime, trap_oid, varbinds)
    }

    /// InformRequest; same layout as [`Pdu::trap_v2`] but acknowledged.
    pub fn inform(request_id: i32, uptime: u32, trap_oid: Oid, varbinds: Vec<VarBind>) -> Self {
        Self::notification(PduType::InformRequest, request_id, uptime, trap_oid, varbinds)
    }

    fn notification(
        pdu_type: PduType,
        request_id: i32,
        uptime: u32,
        trap_oid: Oid,
        varbinds: Vec<VarBind>,
    ) -> Self {
        let mut all = Vec::with_capacity(varbinds.len() + 2);
        all.push(VarBind::new(oids::sys_uptime(), Value::TimeTicks(uptime)));
        all.push(VarBind::new(oids::snmp_trap_oid(), trap_oid));
        all.extend(varbinds);
        Self {
            pdu_type,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds: all,
        }
    }

    pub fn non_repeaters(&self) -> i32 {
        self.error_status
    }

    pub fn max_repetitions(&self) -> i32 {
        self.error_index
    }

    /// Response echoing this PDU's request-id and varbinds.
    pub fn to_response(&self) -> Self {
        Self {
            pdu_type: PduType::Response,
            request_id: self.request_id,
            error_status: 0,
            error_index: 0,
            varbinds: self.varbinds.clone(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.pdu_type == PduType::Response && self.error_status != 0
    }

    pub fn error_status_enum(&self) -> ErrorStatus {
        ErrorStatus::from_i32(self.error_status)
    }

    /// The varbind an error-index points at, if any.
    pub fn error_varbind(&self) -> Option<&VarBind> {
        let index = usize::try_from(self.error_index).ok()?;
        self.varbinds.get(index.checked_sub(1)?)
    }

    /// TrapV2 or InformRequest.
    pub fn is_notification(&self) -> bool {
        matches!(self.pdu_type, PduType::TrapV2 | PduType::InformRequest)
    }

    /// PDUs the receiver must answer.
    pub fn is_confirmed(&self) -> bool {
        matches!(
            self.pdu_type,
            PduType::GetRequest
                | PduType::GetNextRequest
                | PduType::GetBulkRequest
                | PduType::SetRequest
                | PduType::InformRequest
        )
    }

    /// `(sysUpTime, snmpTrapOID)` from the first two varbinds, if both are
    /// present with the right value types.
    pub fn trap_header(&self) -> Option<(u32, &Oid)> {
        match self.varbinds.as_slice() {
            [
                VarBind {
                    value: Value::TimeTicks(uptime),
                    ..
                },
                VarBind {
                    value: Value::ObjectIdentifier(trap_oid),
                    ..
                },
                ..,
            ] => Some((*uptime, trap_oid)),
            _ => None,
        }
    }

    pub fn encode(&self, buf: &mut EncodeBuf) -> Result<()> {
        if self.pdu_type == PduType::TrapV1 {
            return Err(Error::encode(EncodeErrorKind::WrongPduShape(self.pdu_type)));
        }
        if self.pdu_type == PduType::GetBulkRequest {
            for (name, value) in [
                ("non-repeaters", self.error_status),
                ("max-repetitions", self.error_index),
            ] {
                if value < 0 {
                    return Err(Error::encode(EncodeErrorKind::NegativeBulkField {
                        name,
                        value,
                    }));
                }
            }
        }
        buf.push_constructed(self.pdu_type.tag(), |buf| {
            encode_varbind_list(buf, &self.varbinds)?;
            buf.push_integer(self.error_index);
            buf.push_integer(self.error_status);
            buf.push_integer(self.request_id);
            Ok(())
        })
    }

    /// Decode a request/response-shaped PDU, tag included.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let tag_offset = decoder.offset();
        let tag = decoder.read_tag()?;
        let pdu_type = match PduType::from_tag(tag) {
            None => {
                return Err(Error::decode(
                    tag_offset,
                    DecodeErrorKind::UnknownPduType(tag),
                ));
            }
            Some(PduType::TrapV1 | PduType::Report) => {
                return Err(Error::decode(
                    tag_offset,
                    DecodeErrorKind::UnsupportedPduType(tag),
                ));
            }
            Some(t) => t,
        };

        let len = decoder.read_length()?;
        let mut body = decoder.sub_decoder(len)?;
        let request_id = body.read_integer()?;
        let error_status = body.read_integer()?;
        let error_index = body.read_integer()?;
        let varbinds = decode_varbind_list(&mut body)?;
        body.finish()?;

        Ok(Pdu {
            pdu_type,
            request_id,
            error_status,
            error_index,
            varbinds,
        })
    }
}

/// SNMPv1 generic-trap codes (RFC 1157 Section 4.1.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i32)]
pub enum GenericTrap {
    ColdStart = 0,
    WarmStart = 1,
    LinkDown = 2,
    LinkUp = 3,
    AuthenticationFailure = 4,
    EgpNeighborLoss = 5,
    /// Meaning given by the enterprise OID and specific-trap code.
    EnterpriseSpecific = 6,
}

impl GenericTrap {
    pub fn from_i32(v: i32) -> Option<Self> {
        use GenericTrap::*;
        [
            ColdStart,
            WarmStart,
            LinkDown,
            LinkUp,
            AuthenticationFailure,
            EgpNeighborLoss,
            EnterpriseSpecific,
        ]
        .into_iter()
        .find(|g| g.as_i32() == v)
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// SNMPv1 Trap PDU (RFC 1157 Section 4.1.6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrapV1Pdu {
    /// sysObjectID of the sending entity.
    pub enterprise: Oid,
    pub agent_addr: [u8; 4],
    pub generic_trap: GenericTrap,
    /// Only meaningful for [`GenericTrap::EnterpriseSpecific`].
    pub specific_trap: i32,
    /// sysUpTime of the sender, hundredths of a second.
    pub time_stamp: u32,
    pub varbinds: Vec<VarBind>,
}

impl TrapV1Pdu {
    pub fn new(
        enterprise: Oid,
        agent_addr: [u8; 4],
        generic_trap: GenericTrap,
        specific_trap: i32,
        time_stamp: u32,
        varbinds: Vec<VarBind>,
    ) -> Self {
        Self {
            enterprise,
            agent_addr,
            generic_trap,
            specific_trap,
            time_stamp,
            varbinds,
        }
    }

    /// snmpTrapOID equivalent of this trap (RFC 3584 Section 3.1).
    ///
    /// ```
    /// use snmp_trapkit::oid;
    /// use snmp_trapkit::pdu::{GenericTrap, TrapV1Pdu};
    ///
    /// let trap = TrapV1Pdu::new(oid!(1, 3, 6, 1, 4, 1, 9999), [0; 4],
    ///     GenericTrap::EnterpriseSpecific, 1, 0, vec![]);
    /// assert_eq!(trap.v2_trap_oid(), oid!(1, 3, 6, 1, 4, 1, 9999, 0, 1));
    /// ```
    ///
    /// specific-trap is `INTEGER (0..2147483647)`; a negative code is out of
    /// range and maps to arc 0.
    pub fn v2_trap_oid(&self) -> Oid {
        match self.generic_trap {
            GenericTrap::EnterpriseSpecific => {
                let specific = u32::try_from(self.specific_trap).unwrap_or(0);
                self.enterprise.child(0).child(specific)
            }
            generic => oids::snmp_traps().child(generic.as_i32() as u32 + 1),
        }
    }

    pub fn encode(&self, buf: &mut EncodeBuf) -> Result<()> {
        buf.push_constructed(tag::pdu::TRAP_V1, |buf| {
            encode_varbind_list(buf, &self.varbinds)?;
            buf.push_unsigned32(tag::application::TIMETICKS, self.time_stamp);
            buf.push_integer(self.specific_trap);
            buf.push_integer(self.generic_trap.as_i32());
            buf.push_ip_address(self.agent_addr);
            buf.push_oid(&self.enterprise)
        })
    }

    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let mut body = decoder.read_constructed(tag::pdu::TRAP_V1)?;

        let enterprise = body.read_oid()?;
        let agent_addr = body.read_ip_address()?;
        let generic_offset = body.offset();
        let generic = body.read_integer()?;
        let generic_trap = GenericTrap::from_i32(generic).ok_or_else(|| {
            Error::decode(generic_offset, DecodeErrorKind::InvalidGenericTrap(generic))
        })?;
        let specific_trap = body.read_integer()?;
        let time_stamp = body.read_unsigned32(tag::application::TIMETICKS)?;
        let varbinds = decode_varbind_list(&mut body)?;
        body.finish()?;

        Ok(TrapV1Pdu {
            enterprise,
            agent_addr,
            generic_trap,
            specific_trap,
            time_stamp,
            varbinds,
        })
    }
}
