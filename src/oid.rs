//! Object Identifier (OID) type.
//!
//! OIDs are stored as `SmallVec<[u32; 16]>` so typical MIB-2 identifiers
//! never touch the heap.

use std::fmt;

use smallvec::SmallVec;

use crate::error::{DecodeErrorKind, EncodeErrorKind, Error, OidErrorKind, Result};

/// Maximum number of arcs in an OID (RFC 2578 Section 3.5).
pub const MAX_OID_LEN: usize = 128;

/// Object Identifier.
///
/// Ordering is lexicographic over the arcs, which is the order agents
/// answer GETNEXT in.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Oid {
    arcs: SmallVec<[u32; 16]>,
}

impl Oid {
    /// Create an OID from arc values.
    ///
    /// ```
    /// use snmp_trapkit::oid::Oid;
    ///
    /// let oid = Oid::new([1, 3, 6, 1, 2, 1]);
    /// assert_eq!(oid.len(), 6);
    /// ```
    pub fn new(arcs: impl IntoIterator<Item = u32>) -> Self {
        Self {
            arcs: arcs.into_iter().collect(),
        }
    }

    pub fn from_slice(arcs: &[u32]) -> Self {
        Self {
            arcs: SmallVec::from_slice(arcs),
        }
    }

    /// Parse dotted notation such as `"1.3.6.1.2.1.1.1.0"`.
    ///
    /// A single leading dot is tolerated (`".1.3.6"`), as net-snmp tools print
    /// it. Arc constraints are checked at encode time, not here.
    ///
    /// ```
    /// use snmp_trapkit::oid::Oid;
    ///
    /// let oid = Oid::parse("1.3.6.1.4.1.9999").unwrap();
    /// assert_eq!(oid.arcs()[6], 9999);
    /// assert!(Oid::parse("1.3.x").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let body = s.strip_prefix('.').unwrap_or(s);
        if body.is_empty() {
            return Err(Error::invalid_oid_with_input(OidErrorKind::TooShort, s));
        }
        let arcs = body
            .split('.')
            .map(|part| part.parse::<u32>())
            .collect::<std::result::Result<SmallVec<_>, _>>()
            .map_err(|_| Error::invalid_oid_with_input(OidErrorKind::InvalidArc, s))?;
        Ok(Self { arcs })
    }

    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// `true` if `prefix` is an ancestor of (or equal to) `self`.
    pub fn starts_with(&self, prefix: &Oid) -> bool {
        self.arcs.starts_with(&prefix.arcs)
    }

    /// All arcs except the last, `None` for an empty OID.
    pub fn parent(&self) -> Option<Oid> {
        let (_, rest) = self.arcs.split_last()?;
        Some(Oid::from_slice(rest))
    }

    /// Append one arc.
    pub fn child(&self, arc: u32) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.push(arc);
        Oid { arcs }
    }

    /// Check that the OID can be BER-encoded (X.690 Section 8.19.4).
    ///
    /// Two arcs minimum: the first two share one subidentifier, so a lone arc
    /// would decode back as two.
    pub fn validate(&self) -> std::result::Result<(), OidErrorKind> {
        let (first, second) = match self.arcs.as_slice() {
            [first, second, ..] => (*first, *second),
            _ => return Err(OidErrorKind::TooShort),
        };
        if first > 2 {
            return Err(OidErrorKind::InvalidFirstArc(first));
        }
        if first < 2 && second >= 40 {
            return Err(OidErrorKind::InvalidSecondArc { first, second });
        }
        if first == 2 && second > u32::MAX - 80 {
            return Err(OidErrorKind::SubidentifierOverflow);
        }
        if self.arcs.len() > MAX_OID_LEN {
            return Err(OidErrorKind::TooManyArcs {
                count: self.arcs.len(),
                max: MAX_OID_LEN,
            });
        }
        Ok(())
    }

    /// BER content octets, validated first.
    pub fn to_ber_checked(&self) -> Result<SmallVec<[u8; 64]>> {
        self.validate()
            .map_err(|kind| Error::encode(EncodeErrorKind::InvalidOid(kind)))?;

        let mut bytes = SmallVec::new();
        push_subidentifier(&mut bytes, self.arcs[0] * 40 + self.arcs[1]);
        for &arc in &self.arcs[2..] {
            push_subidentifier(&mut bytes, arc);
        }
        Ok(bytes)
    }

    /// Decode BER content octets.
    ///
    /// Error offsets are relative to `data`.
    pub fn from_ber(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::decode(0, DecodeErrorKind::InvalidOidEncoding));
        }

        let mut arcs: SmallVec<[u32; 16]> = SmallVec::new();
        let mut pos = 0;
        while pos < data.len() {
            let (subid, used) = read_subidentifier(&data[pos..], pos)?;
            if arcs.is_empty() {
                let first = (subid / 40).min(2);
                arcs.push(first);
                arcs.push(subid - first * 40);
            } else {
                arcs.push(subid);
            }
            pos += used;

            if arcs.len() > MAX_OID_LEN {
                return Err(Error::decode(
                    pos,
                    DecodeErrorKind::OidTooLong {
                        count: arcs.len(),
                        max: MAX_OID_LEN,
                    },
                ));
            }
        }

        Ok(Self { arcs })
    }
}

/// Base-128, most significant group first, continuation bit on all but the last.
fn push_subidentifier(bytes: &mut SmallVec<[u8; 64]>, value: u32) {
    let groups = (32 - value.leading_zeros()).div_ceil(7).max(1);
    for i in (0..groups).rev() {
        let mut byte = ((value >> (i * 7)) & 0x7F) as u8;
        if i > 0 {
            byte |= 0x80;
        }
        bytes.push(byte);
    }
}

/// Returns `(value, bytes consumed)`. Leading `0x80` padding is tolerated.
fn read_subidentifier(data: &[u8], base: usize) -> Result<(u32, usize)> {
    let mut value: u32 = 0;
    for (i, &byte) in data.iter().enumerate() {
        if value > (u32::MAX >> 7) {
            return Err(Error::decode(base + i, DecodeErrorKind::IntegerOverflow));
        }
        value = (value << 7) | u32::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(Error::decode(
        base + data.len(),
        DecodeErrorKind::InvalidOidEncoding,
    ))
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut arcs = self.arcs.iter();
        if let Some(first) = arcs.next() {
            write!(f, "{}", first)?;
        }
        for arc in arcs {
            write!(f, ".{}", arc)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Oid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<&[u32]> for Oid {
    fn from(arcs: &[u32]) -> Self {
        Self::from_slice(arcs)
    }
}

impl<const N: usize> From<[u32; N]> for Oid {
    fn from(arcs: [u32; N]) -> Self {
        Self::new(arcs)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Oid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Build an [`Oid`] from literal arcs.
///
/// ```
/// use snmp_trapkit::oid;
///
/// let sys_descr = oid!(1, 3, 6, 1, 2, 1, 1, 1, 0);
/// assert_eq!(sys_descr.to_string(), "1.3.6.1.2.1.1.1.0");
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),* $(,)?) => {
        $crate::oid::Oid::from_slice(&[$($arc),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(oid: &Oid) -> Oid {
        Oid::from_ber(&oid.to_ber_checked().unwrap()).unwrap()
    }

    #[test]
    fn parse_and_display() {
        let oid = Oid::parse("1.3.6.1.2.1.1.1.0").unwrap();
        assert_eq!(oid.arcs(), &[1, 3, 6, 1, 2, 1, 1, 1, 0]);
        assert_eq!(oid.to_string(), "1.3.6.1.2.1.1.1.0");
        assert_eq!(Oid::parse(".1.3.6").unwrap(), oid!(1, 3, 6));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Oid::parse("").is_err());
        assert!(Oid::parse("1.3.-6").is_err());
        assert!(Oid::parse("1..3").is_err());
        assert!(Oid::parse("1.3.99999999999").is_err());
    }

    #[test]
    fn ordering_is_lexicographic() {
        let mut oids = vec![
            oid!(1, 3, 6, 1, 2, 1, 2),
            oid!(1, 3, 6, 1, 2, 1, 1, 9),
            oid!(1, 3, 6, 1, 2, 1, 1),
            oid!(1, 3, 6, 1, 2, 1, 10),
        ];
        oids.sort();
        assert_eq!(
            oids,
            vec![
                oid!(1, 3, 6, 1, 2, 1, 1),
                oid!(1, 3, 6, 1, 2, 1, 1, 9),
                oid!(1, 3, 6, 1, 2, 1, 2),
                oid!(1, 3, 6, 1, 2, 1, 10),
            ]
        );
    }

    #[test]
    fn prefix_parent_child() {
        let system = oid!(1, 3, 6, 1, 2, 1, 1);
        let sys_descr = system.child(1).child(0);
        assert!(sys_descr.starts_with(&system));
        assert!(sys_descr.starts_with(&sys_descr));
        assert!(!system.starts_with(&sys_descr));
        assert_eq!(sys_descr.parent().unwrap(), system.child(1));
        assert!(Oid::new([]).parent().is_none());
    }

    #[test]
    fn ber_known_encoding() {
        assert_eq!(
            oid!(1, 3, 6, 1).to_ber_checked().unwrap().as_slice(),
            &[0x2B, 0x06, 0x01]
        );
        // X.690 example: 2.999.3 -> 0x88 0x37 0x03
        assert_eq!(
            oid!(2, 999, 3).to_ber_checked().unwrap().as_slice(),
            &[0x88, 0x37, 0x03]
        );
        assert_eq!(
            oid!(1, 3, 6, 1, 4, 1, 99999).to_ber_checked().unwrap().as_slice(),
            &[0x2B, 0x06, 0x01, 0x04, 0x01, 0x86, 0x8D, 0x1F]
        );
    }

    #[test]
    fn ber_roundtrip_boundaries() {
        for oid in [
            oid!(1, 3),
            oid!(0, 0),
            oid!(0, 39),
            oid!(2, 48),
            oid!(1, 3, 6, 1, 4, 1, u32::MAX),
            Oid::new((0..MAX_OID_LEN as u32).map(|i| if i == 0 { 1 } else { i })),
        ] {
            assert_eq!(roundtrip(&oid), oid);
        }
    }

    #[test]
    fn validate_rejects_unencodable() {
        assert_eq!(oid!(1).validate(), Err(OidErrorKind::TooShort));
        assert_eq!(oid!(3, 0).validate(), Err(OidErrorKind::InvalidFirstArc(3)));
        assert_eq!(
            oid!(1, 40).validate(),
            Err(OidErrorKind::InvalidSecondArc {
                first: 1,
                second: 40
            })
        );
        assert!(oid!(2, 999).validate().is_ok());

        let too_long = Oid::new(std::iter::once(1).chain(std::iter::repeat_n(3, MAX_OID_LEN)));
        assert!(matches!(
            too_long.to_ber_checked(),
            Err(Error::Encode {
                kind: EncodeErrorKind::InvalidOid(OidErrorKind::TooManyArcs { .. })
            })
        ));
    }

    #[test]
    fn from_ber_rejects_bad_content() {
        assert!(Oid::from_ber(&[]).is_err());
        // continuation bit on the final byte
        assert!(Oid::from_ber(&[0x2B, 0x86]).is_err());
        // subidentifier wider than 32 bits
        assert!(Oid::from_ber(&[0x2B, 0x90, 0x80, 0x80, 0x80, 0x80, 0x00]).is_err());

        let mut over = vec![0x2B];
        over.extend(std::iter::repeat_n(0x01, MAX_OID_LEN - 1));
        assert!(Oid::from_ber(&over).is_err());
    }

    #[test]
    fn from_ber_accepts_padded_subidentifier() {
        assert_eq!(Oid::from_ber(&[0x2B, 0x80, 0x01]).unwrap(), oid!(1, 3, 1));
    }
}
