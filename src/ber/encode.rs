//! BER encoding into a back-to-front buffer.
//!
//! A TLV's length is only known once its content is written, so the buffer
//! grows towards the front: callers push the *last* element first, then its
//! length, then its tag. [`EncodeBuf::finish`] flips the bytes into wire
//! order.

use bytes::Bytes;

use super::length::encode_length;
use super::tag;
use crate::error::Result;
use crate::oid::Oid;

/// Reverse-order BER writer.
#[derive(Debug, Default)]
pub struct EncodeBuf {
    // Wire bytes, stored last-to-first.
    rev: Vec<u8>,
}

impl EncodeBuf {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            rev: Vec::with_capacity(256),
        }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.rev.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rev.is_empty()
    }

    /// Prepend a single byte.
    pub fn push_byte(&mut self, byte: u8) {
        self.rev.push(byte);
    }

    /// Prepend `bytes`, keeping their order on the wire.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.rev.extend(bytes.iter().rev());
    }

    pub fn push_tag(&mut self, tag: u8) {
        self.push_byte(tag);
    }

    pub fn push_length(&mut self, len: usize) {
        let (octets, n) = encode_length(len);
        self.rev.extend_from_slice(&octets[..n]);
    }

    /// Prepend a complete primitive TLV.
    fn push_primitive(&mut self, tag: u8, content: &[u8]) {
        self.push_bytes(content);
        self.push_length(content.len());
        self.push_tag(tag);
    }

    /// INTEGER in minimal two's complement.
    pub fn push_integer(&mut self, value: i32) {
        let bytes = value.to_be_bytes();
        // Drop leading bytes that only repeat the sign of the next one.
        let mut start = 0;
        while start < 3 {
            let (b, next) = (bytes[start], bytes[start + 1]);
            let redundant = (b == 0x00 && next & 0x80 == 0) || (b == 0xFF && next & 0x80 != 0);
            if !redundant {
                break;
            }
            start += 1;
        }
        self.push_primitive(tag::universal::INTEGER, &bytes[start..]);
    }

    /// Unsigned 32-bit application type (Counter32, Gauge32, TimeTicks).
    pub fn push_unsigned32(&mut self, tag: u8, value: u32) {
        self.push_unsigned(tag, u64::from(value));
    }

    /// Counter64.
    pub fn push_integer64(&mut self, value: u64) {
        self.push_unsigned(tag::application::COUNTER64, value);
    }

    fn push_unsigned(&mut self, tag: u8, value: u64) {
        // Nine bytes so a set top bit can get a 0x00 prefix.
        let mut bytes = [0u8; 9];
        bytes[1..].copy_from_slice(&value.to_be_bytes());
        let mut start = 0;
        while start < 8 && bytes[start] == 0 && bytes[start + 1] & 0x80 == 0 {
            start += 1;
        }
        self.push_primitive(tag, &bytes[start..]);
    }

    pub fn push_octet_string(&mut self, data: &[u8]) {
        self.push_primitive(tag::universal::OCTET_STRING, data);
    }

    pub fn push_null(&mut self) {
        self.push_primitive(tag::universal::NULL, &[]);
    }

    /// OBJECT IDENTIFIER; fails if the OID cannot be represented in BER.
    pub fn push_oid(&mut self, oid: &Oid) -> Result<()> {
        let content = oid.to_ber_checked()?;
        self.push_primitive(tag::universal::OBJECT_IDENTIFIER, &content);
        Ok(())
    }

    pub fn push_ip_address(&mut self, addr: [u8; 4]) {
        self.push_primitive(tag::application::IP_ADDRESS, &addr);
    }

    /// Prepend a constructed TLV whose content is written by `f`.
    ///
    /// Like everything else here, `f` must push the content back to front.
    pub fn push_constructed<F>(&mut self, tag: u8, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let start = self.len();
        f(self)?;
        let content_len = self.len() - start;
        self.push_length(content_len);
        self.push_tag(tag);
        Ok(())
    }

    /// Prepend a SEQUENCE.
    pub fn push_sequence<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.push_constructed(tag::universal::SEQUENCE, f)
    }

    /// Consume the buffer and return the bytes in wire order.
    pub fn finish(mut self) -> Bytes {
        self.rev.reverse();
        Bytes::from(self.rev)
    }
}
