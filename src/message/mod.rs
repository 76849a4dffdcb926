//! Community-based SNMP messages (v1/v2c).
//!
//! `SEQUENCE { version INTEGER, community OCTET STRING, data PDU }`
//!
//! [`Message::encode`] and [`Message::decode`] are the codec entry points
//! used by the client, sender and listener.

use bytes::Bytes;

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{DecodeErrorKind, EncodeErrorKind, Error, Result};
use crate::pdu::{Pdu, PduType, TrapV1Pdu};
use crate::varbind::VarBind;
use crate::version::Version;

/// The PDU carried by a [`Message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagePdu {
    /// Any request/response-shaped PDU, including SNMPv2-Trap and Inform.
    Pdu(Pdu),
    /// SNMPv1 Trap.
    TrapV1(TrapV1Pdu),
}

impl MessagePdu {
    pub fn pdu_type(&self) -> PduType {
        match self {
            MessagePdu::Pdu(pdu) => pdu.pdu_type,
            MessagePdu::TrapV1(_) => PduType::TrapV1,
        }
    }

    pub fn varbinds(&self) -> &[VarBind] {
        match self {
            MessagePdu::Pdu(pdu) => &pdu.varbinds,
            MessagePdu::TrapV1(trap) => &trap.varbinds,
        }
    }

    /// Trap-v1, SNMPv2-Trap or InformRequest.
    pub fn is_notification(&self) -> bool {
        match self {
            MessagePdu::Pdu(pdu) => pdu.is_notification(),
            MessagePdu::TrapV1(_) => true,
        }
    }

    /// Request-id, absent for Trap-v1.
    pub fn request_id(&self) -> Option<i32> {
        match self {
            MessagePdu::Pdu(pdu) => Some(pdu.request_id),
            MessagePdu::TrapV1(_) => None,
        }
    }
}

impl From<Pdu> for MessagePdu {
    fn from(pdu: Pdu) -> Self {
        MessagePdu::Pdu(pdu)
    }
}

impl From<TrapV1Pdu> for MessagePdu {
    fn from(trap: TrapV1Pdu) -> Self {
        MessagePdu::TrapV1(trap)
    }
}

/// SNMPv1/v2c message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub version: Version,
    pub community: Bytes,
    pub pdu: MessagePdu,
}

impl Message {
    pub fn new(version: Version, community: impl Into<Bytes>, pdu: impl Into<MessagePdu>) -> Self {
        Self {
            version,
            community: community.into(),
            pdu: pdu.into(),
        }
    }

    pub fn v1(community: impl Into<Bytes>, pdu: impl Into<MessagePdu>) -> Self {
        Self::new(Version::V1, community, pdu)
    }

    pub fn v2c(community: impl Into<Bytes>, pdu: impl Into<MessagePdu>) -> Self {
        Self::new(Version::V2c, community, pdu)
    }

    /// Check that everything in the message exists in its SNMP version.
    fn check_version(&self) -> Result<()> {
        let version = self.version;
        match (&self.pdu, version) {
            (MessagePdu::TrapV1(_), Version::V2c) => {
                return Err(Error::encode(EncodeErrorKind::TrapV1NotInVersion(version)));
            }
            (MessagePdu::Pdu(pdu), Version::V1) if pdu.pdu_type.is_v2_only() => {
                return Err(Error::encode(EncodeErrorKind::PduNotInVersion {
                    pdu_type: pdu.pdu_type,
                    version,
                }));
            }
            _ => {}
        }
        if version == Version::V1 {
            if let Some(vb) = self.pdu.varbinds().iter().find(|vb| vb.value.is_v2_only()) {
                return Err(Error::encode(EncodeErrorKind::ValueNotInVersion {
                    type_name: vb.value.type_name(),
                    version,
                }));
            }
        }
        Ok(())
    }

    /// Encode to BER.
    ///
    /// ```
    /// use snmp_trapkit::{Message, Pdu, oid};
    ///
    /// let msg = Message::v2c("public", Pdu::get_request(1, &[oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)]));
    /// let bytes = msg.encode().unwrap();
    /// assert_eq!(Message::decode(bytes).unwrap(), msg);
    /// ```
    pub fn encode(&self) -> Result<Bytes> {
        self.check_version()?;

        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            match &self.pdu {
                MessagePdu::Pdu(pdu) => pdu.encode(buf)?,
                MessagePdu::TrapV1(trap) => trap.encode(buf)?,
            }
            buf.push_octet_string(&self.community);
            buf.push_integer(self.version.as_i32());
            Ok(())
        })?;
        Ok(buf.finish())
    }

    /// Decode from BER. Any structural problem, including trailing bytes,
    /// is an [`Error::Decode`].
    pub fn decode(data: Bytes) -> Result<Self> {
        let mut decoder = Decoder::new(data);
        let mut seq = decoder.read_sequence()?;
        decoder.finish()?;

        let version_offset = seq.offset();
        let version_num = seq.read_integer()?;
        let version = match (Version::from_i32(version_num), version_num) {
            (Some(v), _) => v,
            (None, 3) => {
                return Err(Error::decode(version_offset, DecodeErrorKind::V3NotSupported));
            }
            (None, other) => {
                return Err(Error::decode(
                    version_offset,
                    DecodeErrorKind::UnknownVersion(other),
                ));
            }
        };

        let community = seq.read_octet_string()?;

        let pdu_offset = seq.offset();
        let pdu = match seq.peek_tag() {
            Some(tag::pdu::TRAP_V1) => MessagePdu::TrapV1(TrapV1Pdu::decode(&mut seq)?),
            _ => MessagePdu::Pdu(Pdu::decode(&mut seq)?),
        };
        seq.finish()?;

        let pdu_type = pdu.pdu_type();
        let misplaced = match version {
            Version::V1 => pdu_type.is_v2_only(),
            Version::V2c => pdu_type == PduType::TrapV1,
        };
        if misplaced {
            return Err(Error::decode(
                pdu_offset,
                DecodeErrorKind::UnsupportedPduType(pdu_type.tag()),
            ));
        }

        Ok(Message {
            version,
            community,
            pdu,
        })
    }
}
