//! BER decoding.
//!
//! Zero-copy decoding using `Bytes`. Every failure is logged with its detailed
//! kind and surfaces as [`Error::MalformedResponse`].

use std::net::SocketAddr;

use super::length::decode_length;
use super::tag;
use crate::error::internal::DecodeErrorKind;
use crate::error::{Error, Result, UNKNOWN_TARGET};
use crate::oid::Oid;
use bytes::Bytes;

/// BER decoder that reads from a byte buffer.
pub struct Decoder {
    data: Bytes,
    offset: usize,
    target: Option<SocketAddr>,
}

impl Decoder {
    /// Create a new decoder from bytes.
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            offset: 0,
            target: None,
        }
    }

    /// Create a decoder with a target address for error context.
    pub fn with_target(data: Bytes, target: SocketAddr) -> Self {
        Self {
            data,
            offset: 0,
            target: Some(target),
        }
    }

    /// Create a decoder from a byte slice (copies the data).
    pub fn from_slice(data: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(data))
    }

    fn target(&self) -> SocketAddr {
        self.target.unwrap_or(UNKNOWN_TARGET)
    }

    /// Log `kind` and build the public error for it.
    pub(crate) fn malformed(&self, kind: DecodeErrorKind) -> Box<Error> {
        tracing::debug!(target: "ups_snmp::ber", { snmp.offset = %self.offset, kind = %kind }, "decode error");
        Error::MalformedResponse {
            target: self.target(),
        }
        .boxed()
    }

    /// Current read offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.offset >= self.data.len()
    }

    /// Peek at the next tag without consuming it.
    pub fn peek_tag(&self) -> Option<u8> {
        self.data.get(self.offset).copied()
    }

    /// Read a tag byte.
    pub fn read_tag(&mut self) -> Result<u8> {
        let Some(byte) = self.peek_tag() else {
            return Err(self.malformed(DecodeErrorKind::TruncatedData));
        };
        self.offset += 1;
        Ok(byte)
    }

    /// Read a length header.
    pub fn read_length(&mut self) -> Result<usize> {
        let (len, consumed) =
            decode_length(&self.data[self.offset..], self.offset, self.target)?;
        self.offset += consumed;
        Ok(len)
    }

    /// Read raw bytes without copying.
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        if self.offset.saturating_add(len) > self.data.len() {
            return Err(self.malformed(DecodeErrorKind::TruncatedData));
        }
        let bytes = self.data.slice(self.offset..self.offset + len);
        self.offset += len;
        Ok(bytes)
    }

    /// Read and expect a specific tag, returning the content length.
    pub fn expect_tag(&mut self, expected: u8) -> Result<usize> {
        let actual = self.read_tag()?;
        if actual != expected {
            return Err(self.malformed(DecodeErrorKind::UnexpectedTag { expected, actual }));
        }
        self.read_length()
    }

    /// Read a signed INTEGER.
    pub fn read_integer(&mut self) -> Result<i32> {
        let len = self.expect_tag(tag::universal::INTEGER)?;
        self.read_integer_value(len)
    }

    /// Read integer content of the given length.
    ///
    /// Values longer than four bytes are truncated like net-snmp does.
    pub fn read_integer_value(&mut self, len: usize) -> Result<i32> {
        if len == 0 {
            return Err(self.malformed(DecodeErrorKind::ZeroLengthInteger));
        }
        if len > 4 {
            tracing::warn!(target: "ups_snmp::ber", { snmp.offset = %self.offset, length = len }, "integer too long, truncating to 4 bytes");
        }
        let bytes = self.read_bytes(len)?;
        let mut value: i32 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
        for &byte in bytes.iter().take(4) {
            value = (value << 8) | byte as i32;
        }
        Ok(value)
    }

    /// Read unsigned 32-bit content of the given length.
    pub fn read_unsigned32_value(&mut self, len: usize) -> Result<u32> {
        if len == 0 {
            return Err(self.malformed(DecodeErrorKind::ZeroLengthInteger));
        }
        if len > 5 {
            return Err(self.malformed(DecodeErrorKind::IntegerOverflow));
        }
        let bytes = self.read_bytes(len)?;
        let value = bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64);
        u32::try_from(value).map_err(|_| self.malformed(DecodeErrorKind::IntegerOverflow))
    }

    /// Read Counter64 content of the given length.
    pub fn read_integer64_value(&mut self, len: usize) -> Result<u64> {
        if len == 0 {
            return Err(self.malformed(DecodeErrorKind::ZeroLengthInteger));
        }
        if len > 9 {
            return Err(self.malformed(DecodeErrorKind::Integer64TooLong { length: len }));
        }
        let bytes = self.read_bytes(len)?;
        Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
    }

    /// Read an OCTET STRING.
    pub fn read_octet_string(&mut self) -> Result<Bytes> {
        let len = self.expect_tag(tag::universal::OCTET_STRING)?;
        self.read_bytes(len)
    }

    /// Read an OBJECT IDENTIFIER.
    pub fn read_oid(&mut self) -> Result<Oid> {
        let len = self.expect_tag(tag::universal::OBJECT_IDENTIFIER)?;
        self.read_oid_value(len)
    }

    /// Read OID content of the given length.
    pub fn read_oid_value(&mut self, len: usize) -> Result<Oid> {
        let bytes = self.read_bytes(len)?;
        Oid::from_ber(&bytes).map_err(|kind| self.malformed(kind))
    }

    /// Read a SEQUENCE, returning a decoder for its contents.
    pub fn read_sequence(&mut self) -> Result<Decoder> {
        self.read_constructed(tag::universal::SEQUENCE)
    }

    /// Read a constructed type with a specific tag, returning a decoder for its contents.
    pub fn read_constructed(&mut self, expected_tag: u8) -> Result<Decoder> {
        let len = self.expect_tag(expected_tag)?;
        let content = self.read_bytes(len)?;
        Ok(Decoder {
            data: content,
            offset: 0,
            target: self.target,
        })
    }

    /// Skip one TLV without parsing it.
    pub fn skip_tlv(&mut self) -> Result<()> {
        let _tag = self.read_tag()?;
        let len = self.read_length()?;
        let end = self.offset.saturating_add(len);
        if end > self.data.len() {
            return Err(self.malformed(DecodeErrorKind::TlvOverflow));
        }
        self.offset = end;
        Ok(())
    }

    /// The whole underlying buffer.
    pub fn as_bytes(&self) -> &Bytes {
        &self.data
    }
}
