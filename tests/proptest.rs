//! Property-based tests for the message codec.
//!
//! Every well-formed message must survive encode/decode unchanged, and no
//! prefix of an encoded message may decode or panic.

use bytes::Bytes;
use proptest::prelude::*;
use snmp_trapkit::oid::Oid;
use snmp_trapkit::pdu::{GenericTrap, Pdu, PduType, TrapV1Pdu};
use snmp_trapkit::value::Value;
use snmp_trapkit::varbind::VarBind;
use snmp_trapkit::{Error, Message, Version, oid};

// =============================================================================
// Arbitrary Implementations
// =============================================================================

/// Strategy for generating OIDs that can round-trip through BER.
///
/// OID constraints per X.690 Section 8.19:
/// - at least two arcs (the first two share one subidentifier)
/// - arc1 must be 0, 1, or 2
/// - arc2 must be <= 39 when arc1 is 0 or 1
fn arb_oid() -> impl Strategy<Value = Oid> {
    (0u32..=2, prop::collection::vec(any::<u32>(), 1..=19)).prop_filter_map(
        "valid OID",
        |(arc1, remaining_arcs)| {
            let arc2 = if arc1 < 2 {
                remaining_arcs[0] % 40
            } else {
                // (arc1 * 40) + arc2 must fit in u32
                remaining_arcs[0] % (u32::MAX - 80)
            };

            let mut arcs = vec![arc1, arc2];
            arcs.extend_from_slice(&remaining_arcs[1..]);

            let oid = Oid::from_slice(&arcs);
            oid.validate().is_ok().then_some(oid)
        },
    )
}

/// Strategy for generating arbitrary byte data (for OctetString, Opaque).
fn arb_bytes() -> impl Strategy<Value = Bytes> {
    prop::collection::vec(any::<u8>(), 0..=256).prop_map(Bytes::from)
}

/// Values legal in SNMPv1.
fn arb_v1_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i32>().prop_map(Value::Integer),
        arb_bytes().prop_map(Value::OctetString),
        Just(Value::Null),
        arb_oid().prop_map(Value::ObjectIdentifier),
        any::<[u8; 4]>().prop_map(Value::IpAddress),
        any::<u32>().prop_map(Value::Counter32),
        any::<u32>().prop_map(Value::Gauge32),
        any::<u32>().prop_map(Value::TimeTicks),
        arb_bytes().prop_map(Value::Opaque),
    ]
}

/// Every value type, including the v2c-only ones.
fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        8 => arb_v1_value(),
        1 => any::<u64>().prop_map(Value::Counter64),
        1 => Just(Value::NoSuchObject),
        1 => Just(Value::NoSuchInstance),
        1 => Just(Value::EndOfMibView),
    ]
}

fn arb_varbinds(value: impl Strategy<Value = Value>) -> impl Strategy<Value = Vec<VarBind>> {
    prop::collection::vec(
        (arb_oid(), value).prop_map(|(oid, value)| VarBind::new(oid, value)),
        0..=10,
    )
}

/// PDU types carried by the request/response shape.
fn arb_pdu_type() -> impl Strategy<Value = PduType> {
    prop_oneof![
        Just(PduType::GetRequest),
        Just(PduType::GetNextRequest),
        Just(PduType::Response),
        Just(PduType::SetRequest),
        Just(PduType::GetBulkRequest),
        Just(PduType::InformRequest),
        Just(PduType::TrapV2),
    ]
}

fn arb_pdu() -> impl Strategy<Value = Pdu> {
    (
        arb_pdu_type(),
        any::<i32>(),
        any::<i32>(),
        any::<i32>(),
        arb_varbinds(arb_value()),
    )
        .prop_map(
            |(pdu_type, request_id, error_status, error_index, varbinds)| Pdu {
                pdu_type,
                request_id,
                error_status,
                error_index,
                varbinds,
            },
        )
}

fn arb_generic_trap() -> impl Strategy<Value = GenericTrap> {
    (0i32..=6).prop_map(|g| GenericTrap::from_i32(g).unwrap())
}

fn arb_trap_v1_pdu() -> impl Strategy<Value = TrapV1Pdu> {
    (
        arb_oid(),
        any::<[u8; 4]>(),
        arb_generic_trap(),
        any::<i32>(),
        any::<u32>(),
        arb_varbinds(arb_v1_value()),
    )
        .prop_map(
            |(enterprise, agent_addr, generic_trap, specific_trap, time_stamp, varbinds)| {
                TrapV1Pdu::new(
                    enterprise,
                    agent_addr,
                    generic_trap,
                    specific_trap,
                    time_stamp,
                    varbinds,
                )
            },
        )
}

fn arb_community() -> impl Strategy<Value = Bytes> {
    prop::collection::vec(any::<u8>(), 0..=32).prop_map(Bytes::from)
}

/// Any message that is legal in its version.
fn arb_message() -> impl Strategy<Value = Message> {
    prop_oneof![
        (arb_community(), arb_pdu()).prop_map(|(c, pdu)| Message::v2c(c, pdu)),
        (arb_community(), arb_trap_v1_pdu()).prop_map(|(c, trap)| Message::v1(c, trap)),
        (
            arb_community(),
            prop_oneof![
                Just(PduType::GetRequest),
                Just(PduType::GetNextRequest),
                Just(PduType::Response),
                Just(PduType::SetRequest),
            ],
            any::<i32>(),
            arb_varbinds(arb_v1_value()),
        )
            .prop_map(|(c, pdu_type, request_id, varbinds)| {
                Message::v1(
                    c,
                    Pdu {
                        pdu_type,
                        request_id,
                        error_status: 0,
                        error_index: 0,
                        varbinds,
                    },
                )
            }),
    ]
}

// =============================================================================
// Codec Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn message_roundtrip(msg in arb_message()) {
        let bytes = msg.encode().expect("encode should succeed");
        let decoded = Message::decode(bytes).expect("decode should succeed");
        prop_assert_eq!(msg, decoded);
    }

    #[test]
    fn every_truncation_fails(msg in arb_message()) {
        let bytes = msg.encode().unwrap();
        for len in 0..bytes.len() {
            let result = Message::decode(bytes.slice(..len));
            prop_assert!(
                matches!(result, Err(Error::Decode { .. })),
                "prefix of {} bytes decoded: {:?}", len, result
            );
        }
    }

    #[test]
    fn arbitrary_bytes_never_panic(data in prop::collection::vec(any::<u8>(), 0..=512)) {
        let _ = Message::decode(Bytes::from(data));
    }

    #[test]
    fn oid_display_parse_roundtrip(oid in arb_oid()) {
        let parsed = Oid::parse(&oid.to_string()).expect("parse should succeed");
        prop_assert_eq!(oid, parsed);
    }
}

// =============================================================================
// Edge Case Tests (deterministic, not property-based)
// =============================================================================

fn roundtrip(msg: Message) {
    let bytes = msg.encode().unwrap();
    assert_eq!(Message::decode(bytes).unwrap(), msg);
}

#[test]
fn two_arc_oid_is_one_subidentifier() {
    let msg = Message::v2c("public", Pdu::get_request(1, &[oid!(1, 3)]));
    let bytes = msg.encode().unwrap();
    // varbind: 30 05 06 01 2b 05 00
    assert!(bytes.ends_with(&[0x06, 0x01, 0x2b, 0x05, 0x00]));
    roundtrip(msg);
}

#[test]
fn single_arc_oid_rejected_at_encode() {
    let msg = Message::v2c("public", Pdu::get_request(1, &[oid!(1)]));
    assert!(matches!(msg.encode(), Err(Error::Encode { .. })));
}

#[test]
fn boundary_values_roundtrip() {
    let base = oid!(1, 3, 6, 1, 4, 1, 99999);
    let varbinds = vec![
        VarBind::new(base.child(1), Value::Integer(i32::MIN)),
        VarBind::new(base.child(2), Value::Integer(i32::MAX)),
        VarBind::new(base.child(3), Value::OctetString(Bytes::new())),
        VarBind::new(base.child(4), Value::IpAddress([255, 255, 255, 255])),
        VarBind::new(base.child(5), Value::Counter32(u32::MAX)),
        VarBind::new(base.child(6), Value::TimeTicks(0)),
        VarBind::new(base.child(7), Value::Counter64(u64::MAX)),
    ];
    roundtrip(Message::v2c("", Pdu::set_request(i32::MAX, varbinds)));
}

#[test]
fn v2_only_value_refused_in_v1() {
    let msg = Message::v1(
        "public",
        Pdu::set_request(1, vec![VarBind::new(oid!(1, 3, 6, 1), Value::Counter64(1))]),
    );
    assert!(matches!(msg.encode(), Err(Error::Encode { .. })));
    assert_eq!(msg.version, Version::V1);
}
