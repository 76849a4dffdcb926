//! Error types for snmp-trapkit.
//!
//! Every fallible operation in the crate returns [`Result`], whose error is
//! the single [`Error`] enum. Variants map onto the failure classes a caller
//! has to tell apart:
//!
//! - [`Error::Encode`]: the caller built a message the codec cannot express
//! - [`Error::Decode`]: malformed or truncated bytes
//! - [`Error::Transport`]: local socket or address failure
//! - [`Error::Snmp`] / [`Error::WalkAborted`]: the agent misbehaved or refused
//! - [`Error::Timeout`]: no matching response within the retry budget
//!
//! # Example
//!
//! ```no_run
//! use snmp_trapkit::{Client, Error, ErrorStatus, oid};
//!
//! # async fn example() -> snmp_trapkit::Result<()> {
//! let client = Client::builder("192.168.1.1:161").community("public").build()?;
//!
//! match client.get(&oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)).await {
//!     Ok(vb) => println!("{}", vb),
//!     Err(Error::Timeout { elapsed, retries, .. }) => {
//!         println!("no answer after {:?} ({} retries)", elapsed, retries);
//!     }
//!     Err(Error::Snmp { status: ErrorStatus::NoSuchName, .. }) => {
//!         println!("agent has no such object");
//!     }
//!     Err(e) => println!("failed: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use crate::oid::Oid;
use crate::version::Version;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// BER decode error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// Expected different tag.
    UnexpectedTag { expected: u8, actual: u8 },
    /// Data truncated unexpectedly.
    TruncatedData,
    /// A length field claims more bytes than remain.
    InsufficientData { needed: usize, available: usize },
    /// Indefinite length not supported.
    IndefiniteLength,
    /// Length field too long.
    LengthTooLong { octets: usize },
    /// Length exceeds maximum.
    LengthExceedsMax { length: usize, max: usize },
    /// Zero-length integer.
    ZeroLengthInteger,
    /// Integer value overflow.
    IntegerOverflow,
    /// Counter64 longer than 9 bytes.
    Integer64TooLong { length: usize },
    /// NULL with non-zero length.
    InvalidNull,
    /// Invalid IP address length.
    InvalidIpAddressLength { length: usize },
    /// Empty OID content or a subidentifier cut short.
    InvalidOidEncoding,
    /// OID with more arcs than allowed.
    OidTooLong { count: usize, max: usize },
    /// Value tag this codec does not understand.
    UnsupportedTag(u8),
    /// Constructed OCTET STRING not supported.
    ConstructedOctetString,
    /// Unknown SNMP version.
    UnknownVersion(i32),
    /// SNMPv3 message; recognised but not handled.
    V3NotSupported,
    /// Unknown PDU type.
    UnknownPduType(u8),
    /// Recognised PDU type that is not valid for v1/v2c.
    UnsupportedPduType(u8),
    /// Bytes left over after a complete structure.
    TrailingData { remaining: usize },
    /// Notification without the mandatory sysUpTime.0/snmpTrapOID.0 prefix.
    MissingTrapVarbinds,
    /// Generic-trap code outside 0..=6.
    InvalidGenericTrap(i32),
    /// Response carried no varbinds where at least one was required.
    EmptyResponse,
    /// Response version differs from the request's.
    VersionMismatch { expected: Version, actual: Version },
}

impl std::fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedTag { expected, actual } => {
                write!(f, "expected tag 0x{:02X}, got 0x{:02X}", expected, actual)
            }
            Self::TruncatedData => write!(f, "unexpected end of data"),
            Self::InsufficientData { needed, available } => {
                write!(f, "need {} bytes but only {} remaining", needed, available)
            }
            Self::IndefiniteLength => write!(f, "indefinite length encoding not supported"),
            Self::LengthTooLong { octets } => {
                write!(f, "length encoding too long ({} octets)", octets)
            }
            Self::LengthExceedsMax { length, max } => {
                write!(f, "length {} exceeds maximum {}", length, max)
            }
            Self::ZeroLengthInteger => write!(f, "zero-length integer"),
            Self::IntegerOverflow => write!(f, "integer overflow"),
            Self::Integer64TooLong { length } => {
                write!(f, "integer64 too long: {} bytes", length)
            }
            Self::InvalidNull => write!(f, "NULL with non-zero length"),
            Self::InvalidIpAddressLength { length } => {
                write!(f, "IP address must be 4 bytes, got {}", length)
            }
            Self::InvalidOidEncoding => write!(f, "invalid OID encoding"),
            Self::OidTooLong { count, max } => {
                write!(f, "OID has {} arcs, exceeds maximum {}", count, max)
            }
            Self::UnsupportedTag(t) => write!(f, "unsupported value tag: 0x{:02X}", t),
            Self::ConstructedOctetString => {
                write!(f, "constructed OCTET STRING (0x24) not supported")
            }
            Self::UnknownVersion(v) => write!(f, "unknown SNMP version: {}", v),
            Self::V3NotSupported => write!(f, "SNMPv3 messages are not supported"),
            Self::UnknownPduType(t) => write!(f, "unknown PDU type: 0x{:02X}", t),
            Self::UnsupportedPduType(t) => write!(f, "unsupported PDU type: 0x{:02X}", t),
            Self::TrailingData { remaining } => {
                write!(f, "{} trailing bytes after structure", remaining)
            }
            Self::MissingTrapVarbinds => {
                write!(f, "notification lacks sysUpTime.0 and snmpTrapOID.0")
            }
            Self::InvalidGenericTrap(v) => write!(f, "invalid generic-trap code: {}", v),
            Self::EmptyResponse => write!(f, "empty response"),
            Self::VersionMismatch { expected, actual } => {
                write!(f, "expected {} response, got {}", expected, actual)
            }
        }
    }
}

/// BER encode error kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeErrorKind {
    /// OID cannot be represented in BER.
    InvalidOid(OidErrorKind),
    /// IpAddress value that is not exactly 4 bytes.
    InvalidIpAddressLength { length: usize },
    /// Value type that does not exist in the message's SNMP version.
    ValueNotInVersion {
        type_name: &'static str,
        version: Version,
    },
    /// PDU type that does not exist in the message's SNMP version.
    PduNotInVersion {
        pdu_type: crate::pdu::PduType,
        version: Version,
    },
    /// Trap-v1 PDU in a v2c message.
    TrapV1NotInVersion(Version),
    /// GETBULK non-repeaters or max-repetitions below zero.
    NegativeBulkField { name: &'static str, value: i32 },
    /// `Pdu` carrying a type that has its own layout (Trap-v1).
    WrongPduShape(crate::pdu::PduType),
    /// Sender was handed a PDU that is not a notification.
    NotANotification(crate::pdu::PduType),
}

impl std::fmt::Display for EncodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidOid(kind) => write!(f, "invalid OID: {}", kind),
            Self::InvalidIpAddressLength { length } => {
                write!(f, "IP address must be 4 bytes, got {}", length)
            }
            Self::ValueNotInVersion { type_name, version } => {
                write!(f, "{} values cannot be sent in {}", type_name, version)
            }
            Self::PduNotInVersion { pdu_type, version } => {
                write!(f, "{} cannot be sent in {}", pdu_type, version)
            }
            Self::TrapV1NotInVersion(version) => {
                write!(f, "Trap-v1 PDU cannot be sent in {}", version)
            }
            Self::NegativeBulkField { name, value } => {
                write!(f, "{} must not be negative, got {}", name, value)
            }
            Self::WrongPduShape(pdu_type) => {
                write!(f, "{} cannot be encoded as a request/response PDU", pdu_type)
            }
            Self::NotANotification(pdu_type) => {
                write!(f, "{} is not a notification PDU", pdu_type)
            }
        }
    }
}

/// OID validation error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OidErrorKind {
    /// Invalid arc value in dotted notation.
    InvalidArc,
    /// First arc must be 0, 1, or 2.
    InvalidFirstArc(u32),
    /// Second arc too large for first arc value.
    InvalidSecondArc { first: u32, second: u32 },
    /// OID too short (minimum 2 arcs).
    TooShort,
    /// OID has too many arcs (exceeds MAX_OID_LEN).
    TooManyArcs { count: usize, max: usize },
    /// First subidentifier does not fit in 32 bits.
    SubidentifierOverflow,
}

impl std::fmt::Display for OidErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArc => write!(f, "invalid arc value"),
            Self::InvalidFirstArc(v) => write!(f, "first arc must be 0, 1, or 2, got {}", v),
            Self::InvalidSecondArc { first, second } => {
                write!(f, "second arc {} too large for first arc {}", second, first)
            }
            Self::TooShort => write!(f, "OID must have at least 2 arcs"),
            Self::TooManyArcs { count, max } => {
                write!(f, "OID has {} arcs, exceeds maximum {}", count, max)
            }
            Self::SubidentifierOverflow => write!(f, "subidentifier overflow"),
        }
    }
}

/// Why a walk was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkAbortReason {
    /// Agent returned an OID that does not sort after the previous one.
    NonIncreasing,
    /// Response did not carry exactly one varbind.
    WrongVarbindCount(usize),
}

impl std::fmt::Display for WalkAbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonIncreasing => write!(f, "non-increasing OID"),
            Self::WrongVarbindCount(n) => write!(f, "expected 1 varbind, got {}", n),
        }
    }
}

/// SNMP protocol error status codes (RFC 3416).
///
/// Codes 0-5 exist in SNMPv1, 6-18 were added by SNMPv2.
///
/// ```
/// use snmp_trapkit::ErrorStatus;
///
/// let status = ErrorStatus::from_i32(2);
/// assert_eq!(status, ErrorStatus::NoSuchName);
/// assert_eq!(status.to_string(), "noSuchName");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[non_exhaustive]
pub enum ErrorStatus {
    NoError,
    TooBig,
    NoSuchName,
    BadValue,
    ReadOnly,
    GenErr,
    NoAccess,
    WrongType,
    WrongLength,
    WrongEncoding,
    WrongValue,
    NoCreation,
    InconsistentValue,
    ResourceUnavailable,
    CommitFailed,
    UndoFailed,
    AuthorizationError,
    NotWritable,
    InconsistentName,
    /// Code outside the RFC 3416 range.
    Unknown(i32),
}

const STATUS_TABLE: [(ErrorStatus, &str); 19] = [
    (ErrorStatus::NoError, "noError"),
    (ErrorStatus::TooBig, "tooBig"),
    (ErrorStatus::NoSuchName, "noSuchName"),
    (ErrorStatus::BadValue, "badValue"),
    (ErrorStatus::ReadOnly, "readOnly"),
    (ErrorStatus::GenErr, "genErr"),
    (ErrorStatus::NoAccess, "noAccess"),
    (ErrorStatus::WrongType, "wrongType"),
    (ErrorStatus::WrongLength, "wrongLength"),
    (ErrorStatus::WrongEncoding, "wrongEncoding"),
    (ErrorStatus::WrongValue, "wrongValue"),
    (ErrorStatus::NoCreation, "noCreation"),
    (ErrorStatus::InconsistentValue, "inconsistentValue"),
    (ErrorStatus::ResourceUnavailable, "resourceUnavailable"),
    (ErrorStatus::CommitFailed, "commitFailed"),
    (ErrorStatus::UndoFailed, "undoFailed"),
    (ErrorStatus::AuthorizationError, "authorizationError"),
    (ErrorStatus::NotWritable, "notWritable"),
    (ErrorStatus::InconsistentName, "inconsistentName"),
];

impl ErrorStatus {
    /// Create from raw status code.
    pub fn from_i32(value: i32) -> Self {
        usize::try_from(value)
            .ok()
            .and_then(|i| STATUS_TABLE.get(i))
            .map(|(status, _)| *status)
            .unwrap_or(Self::Unknown(value))
    }

    /// Convert to raw status code.
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::Unknown(code) => *code,
            known => STATUS_TABLE
                .iter()
                .position(|(s, _)| s == known)
                .map(|i| i as i32)
                .unwrap_or_default(),
        }
    }
}

impl std::fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "unknown({})", code),
            known => {
                let name = STATUS_TABLE
                    .iter()
                    .find(|(s, _)| s == known)
                    .map(|(_, n)| *n)
                    .unwrap_or("unknown");
                f.write_str(name)
            }
        }
    }
}

/// The main error type for all snmp-trapkit operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Message could not be encoded.
    #[error("encode error: {kind}")]
    Encode { kind: EncodeErrorKind },

    /// BER decoding error.
    #[error("decode error at offset {offset}: {kind}")]
    Decode {
        offset: usize,
        kind: DecodeErrorKind,
    },

    /// Socket-level failure (bind, send, receive, address resolution).
    #[error("transport error{}: {source}", target.map(|t| format!(" communicating with {}", t)).unwrap_or_default())]
    Transport {
        target: Option<SocketAddr>,
        #[source]
        source: std::io::Error,
    },

    /// SNMP protocol error returned by agent.
    #[error("SNMP error{}: {status} at index {index}", target.map(|t| format!(" from {}", t)).unwrap_or_default())]
    Snmp {
        target: Option<SocketAddr>,
        status: ErrorStatus,
        /// 1-based position of the offending varbind, 0 for the whole PDU.
        index: u32,
        oid: Option<Oid>,
    },

    /// Walk stopped because the agent's answers cannot make progress.
    #[error("walk of {target} aborted after {previous}: {reason} ({current})")]
    WalkAborted {
        target: SocketAddr,
        previous: Oid,
        current: Oid,
        reason: WalkAbortReason,
    },

    /// No matching response within timeout x (retries + 1).
    #[error("timeout after {elapsed:?}{} (retries={retries})", target.map(|t| format!(" waiting for {}", t)).unwrap_or_default())]
    Timeout {
        target: Option<SocketAddr>,
        elapsed: Duration,
        retries: u32,
    },

    /// Invalid OID format.
    #[error("invalid OID: {kind}")]
    InvalidOid {
        kind: OidErrorKind,
        input: Option<Box<str>>,
    },

    /// Configuration or usage error.
    #[error("configuration error: {0}")]
    Config(Box<str>),
}

impl Error {
    /// Create a decode error.
    pub fn decode(offset: usize, kind: DecodeErrorKind) -> Self {
        Self::Decode { offset, kind }
    }

    /// Create an encode error.
    pub fn encode(kind: EncodeErrorKind) -> Self {
        Self::Encode { kind }
    }

    /// Create a transport error.
    pub fn transport(target: Option<SocketAddr>, source: std::io::Error) -> Self {
        Self::Transport { target, source }
    }

    /// Create an invalid OID error with the input string that failed.
    pub fn invalid_oid_with_input(kind: OidErrorKind, input: impl Into<Box<str>>) -> Self {
        Self::InvalidOid {
            kind,
            input: Some(input.into()),
        }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<Box<str>>) -> Self {
        Self::Config(msg.into())
    }

    /// `true` when the agent answered but the exchange failed at the SNMP level.
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Self::Snmp { .. } | Self::WalkAborted { .. })
    }

    /// Get the target address if this error has one.
    pub fn target(&self) -> Option<SocketAddr> {
        match self {
            Self::Transport { target, .. } => *target,
            Self::Timeout { target, .. } => *target,
            Self::Snmp { target, .. } => *target,
            Self::WalkAborted { target, .. } => Some(*target),
            _ => None,
        }
    }
}
