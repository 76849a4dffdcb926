//! BER definite-length octets (X.690 8.1.3).
//!
//! Short form covers 0-127 in one byte; long form is a count byte
//! (`0x80 | n`) followed by `n` big-endian length bytes. The indefinite form
//! (`0x80`) never appears in SNMP and is rejected.

use crate::error::{DecodeErrorKind, Error, Result};

/// Largest content length the decoder accepts.
///
/// A UDP datagram cannot exceed 64 KiB, so anything larger is bogus; the cap
/// is kept generous at 2 MiB.
pub const MAX_LENGTH: usize = 0x20_0000;

/// Encode `len` as length octets, least significant byte first.
///
/// The returned slice length is `buf[..n]`; bytes are reversed so they can be
/// pushed straight onto an [`EncodeBuf`](super::EncodeBuf).
pub fn encode_length(len: usize) -> ([u8; 5], usize) {
    let mut buf = [0u8; 5];
    if len < 0x80 {
        buf[0] = len as u8;
        return (buf, 1);
    }

    let mut rest = len;
    let mut n = 0;
    while rest > 0 && n < 4 {
        buf[n] = rest as u8;
        rest >>= 8;
        n += 1;
    }
    buf[n] = 0x80 | n as u8;
    (buf, n + 1)
}

/// Decode length octets at the start of `data`.
///
/// Returns `(length, octets consumed)`. `base_offset` is only used for
/// error reporting. Non-minimal long forms are accepted.
pub fn decode_length(data: &[u8], base_offset: usize) -> Result<(usize, usize)> {
    let Some(&first) = data.first() else {
        return Err(Error::decode(base_offset, DecodeErrorKind::TruncatedData));
    };

    if first & 0x80 == 0 {
        return Ok((first as usize, 1));
    }

    let count = (first & 0x7F) as usize;
    match count {
        0 => {
            return Err(Error::decode(base_offset, DecodeErrorKind::IndefiniteLength));
        }
        1..=4 => {}
        octets => {
            return Err(Error::decode(
                base_offset,
                DecodeErrorKind::LengthTooLong { octets },
            ));
        }
    }

    let Some(octets) = data.get(1..=count) else {
        return Err(Error::decode(base_offset, DecodeErrorKind::TruncatedData));
    };
    let len = octets.iter().fold(0usize, |acc, &b| (acc << 8) | b as usize);

    if len > MAX_LENGTH {
        return Err(Error::decode(
            base_offset,
            DecodeErrorKind::LengthExceedsMax {
                length: len,
                max: MAX_LENGTH,
            },
        ));
    }

    Ok((len, 1 + count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(len: usize) -> Vec<u8> {
        let (buf, n) = encode_length(len);
        buf[..n].iter().rev().copied().collect()
    }

    #[test]
    fn short_form() {
        assert_eq!(encoded(0), [0x00]);
        assert_eq!(encoded(127), [0x7F]);
        assert_eq!(decode_length(&[0x7F], 0).unwrap(), (127, 1));
    }

    #[test]
    fn long_form_boundaries() {
        assert_eq!(encoded(128), [0x81, 0x80]);
        assert_eq!(encoded(255), [0x81, 0xFF]);
        assert_eq!(encoded(256), [0x82, 0x01, 0x00]);
        assert_eq!(encoded(0x01_0000), [0x83, 0x01, 0x00, 0x00]);

        for len in [128, 255, 256, 65535, 65536, MAX_LENGTH] {
            let bytes = encoded(len);
            assert_eq!(decode_length(&bytes, 0).unwrap(), (len, bytes.len()));
        }
    }

    #[test]
    fn non_minimal_long_form_accepted() {
        assert_eq!(decode_length(&[0x81, 0x01], 0).unwrap(), (1, 2));
        assert_eq!(decode_length(&[0x82, 0x00, 0x05], 0).unwrap(), (5, 3));
        assert_eq!(
            decode_length(&[0x83, 0x00, 0x00, 0x80], 0).unwrap(),
            (128, 4)
        );
    }

    #[test]
    fn indefinite_rejected() {
        let err = decode_length(&[0x80], 7).unwrap_err();
        assert!(matches!(
            err,
            Error::Decode {
                offset: 7,
                kind: DecodeErrorKind::IndefiniteLength
            }
        ));
    }

    #[test]
    fn truncated_long_form_rejected() {
        assert!(decode_length(&[], 0).is_err());
        assert!(decode_length(&[0x82, 0x01], 0).is_err());
        assert!(decode_length(&[0x84, 0x00, 0x00, 0x01], 0).is_err());
    }

    #[test]
    fn too_many_length_octets_rejected() {
        let err = decode_length(&[0x85, 0, 0, 0, 0, 1], 0).unwrap_err();
        assert!(matches!(
            err,
            Error::Decode {
                kind: DecodeErrorKind::LengthTooLong { octets: 5 },
                ..
            }
        ));
    }

    #[test]
    fn max_length_enforced() {
        let over = MAX_LENGTH + 1;
        let bytes = [0x83, (over >> 16) as u8, (over >> 8) as u8, over as u8];
        let err = decode_length(&bytes, 0).unwrap_err();
        assert!(matches!(
            err,
            Error::Decode {
                kind: DecodeErrorKind::LengthExceedsMax { .. },
                ..
            }
        ));
    }
}
