//! BER encoding.
//!
//! [`EncodeBuf`] is filled back to front: the last field of a structure is
//! pushed first and every constructed type wraps whatever was pushed inside
//! its closure. [`EncodeBuf::finish`] reverses the buffer once.

use super::length::encode_length;
use super::tag;
use crate::oid::Oid;
use bytes::Bytes;

/// Reverse-order BER encode buffer.
#[derive(Debug, Default)]
pub struct EncodeBuf {
    buf: Vec<u8>,
}

impl EncodeBuf {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(256),
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Push a single byte.
    pub fn push_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Push raw bytes (in forward order; they are stored reversed).
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.buf.extend(data.iter().rev());
    }

    /// Push a tag byte.
    pub fn push_tag(&mut self, tag: u8) {
        self.buf.push(tag);
    }

    /// Push a length header.
    pub fn push_length(&mut self, len: usize) {
        let (bytes, n) = encode_length(len);
        self.buf.extend_from_slice(&bytes[..n]);
    }

    /// Wrap everything pushed by `f` in a constructed TLV with `tag`.
    pub fn push_constructed<F: FnOnce(&mut Self)>(&mut self, tag: u8, f: F) {
        let start = self.buf.len();
        f(self);
        let len = self.buf.len() - start;
        self.push_length(len);
        self.push_tag(tag);
    }

    /// Wrap everything pushed by `f` in a SEQUENCE.
    pub fn push_sequence<F: FnOnce(&mut Self)>(&mut self, f: F) {
        self.push_constructed(tag::universal::SEQUENCE, f);
    }

    /// Push a signed INTEGER in minimal two's complement form.
    pub fn push_integer(&mut self, value: i32) {
        let bytes = value.to_be_bytes();
        let mut start = 0;
        while start < 3 {
            let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
                || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
            if !redundant {
                break;
            }
            start += 1;
        }
        self.push_bytes(&bytes[start..]);
        self.push_length(4 - start);
        self.push_tag(tag::universal::INTEGER);
    }

    /// Push an unsigned 32-bit value with an application tag.
    pub fn push_unsigned32(&mut self, tag: u8, value: u32) {
        let len = self.push_unsigned_content(u64::from(value));
        self.push_length(len);
        self.push_tag(tag);
    }

    /// Push a Counter64.
    pub fn push_integer64(&mut self, value: u64) {
        let len = self.push_unsigned_content(value);
        self.push_length(len);
        self.push_tag(tag::application::COUNTER64);
    }

    fn push_unsigned_content(&mut self, value: u64) -> usize {
        let bytes = value.to_be_bytes();
        let first = bytes.iter().position(|&b| b != 0).unwrap_or(7);
        let content = &bytes[first..];
        self.push_bytes(content);
        if content[0] & 0x80 != 0 {
            self.push_byte(0x00);
            content.len() + 1
        } else {
            content.len()
        }
    }

    /// Push an OCTET STRING.
    pub fn push_octet_string(&mut self, data: &[u8]) {
        self.push_bytes(data);
        self.push_length(data.len());
        self.push_tag(tag::universal::OCTET_STRING);
    }

    /// Push a NULL.
    pub fn push_null(&mut self) {
        self.push_length(0);
        self.push_tag(tag::universal::NULL);
    }

    /// Push an OBJECT IDENTIFIER.
    pub fn push_oid(&mut self, oid: &Oid) {
        let ber = oid.to_ber_smallvec();
        self.push_bytes(&ber);
        self.push_length(ber.len());
        self.push_tag(tag::universal::OBJECT_IDENTIFIER);
    }

    /// Push an IpAddress.
    pub fn push_ip_address(&mut self, addr: [u8; 4]) {
        self.push_bytes(&addr);
        self.push_length(4);
        self.push_tag(tag::application::IP_ADDRESS);
    }

    /// Finish encoding and return the bytes in wire order.
    pub fn finish(mut self) -> Bytes {
        self.buf.reverse();
        Bytes::from(self.buf)
    }
}
