//! SNMP value types.
//!
//! The `Value` enum represents every SMIv2 type an agent can return,
//! including the three varbind exceptions.

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::Result;
use crate::error::internal::DecodeErrorKind;
use crate::oid::Oid;
use bytes::Bytes;

/// SNMP value.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Value {
    /// INTEGER (signed 32-bit)
    Integer(i32),
    /// OCTET STRING (arbitrary bytes)
    OctetString(Bytes),
    Null,
    ObjectIdentifier(Oid),
    /// IpAddress (4 bytes, network order)
    IpAddress([u8; 4]),
    Counter32(u32),
    /// Gauge32 / Unsigned32
    Gauge32(u32),
    /// TimeTicks (hundredths of a second)
    TimeTicks(u32),
    Opaque(Bytes),
    Counter64(u64),
    /// The object does not exist at this agent.
    NoSuchObject,
    /// The object exists but this instance does not.
    NoSuchInstance,
    /// Returned by GETNEXT/GETBULK past the end of the agent's view.
    EndOfMibView,
}

impl Value {
    /// Short type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "Integer",
            Value::OctetString(_) => "OctetString",
            Value::Null => "Null",
            Value::ObjectIdentifier(_) => "ObjectIdentifier",
            Value::IpAddress(_) => "IpAddress",
            Value::Counter32(_) => "Counter32",
            Value::Gauge32(_) => "Gauge32",
            Value::TimeTicks(_) => "TimeTicks",
            Value::Opaque(_) => "Opaque",
            Value::Counter64(_) => "Counter64",
            Value::NoSuchObject => "noSuchObject",
            Value::NoSuchInstance => "noSuchInstance",
            Value::EndOfMibView => "endOfMibView",
        }
    }

    /// Whether this is one of the varbind exception values.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView
        )
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        match self {
            Value::Integer(v) => buf.push_integer(*v),
            Value::OctetString(data) => buf.push_octet_string(data),
            Value::Null => buf.push_null(),
            Value::ObjectIdentifier(oid) => buf.push_oid(oid),
            Value::IpAddress(addr) => buf.push_ip_address(*addr),
            Value::Counter32(v) => buf.push_unsigned32(tag::application::COUNTER32, *v),
            Value::Gauge32(v) => buf.push_unsigned32(tag::application::GAUGE32, *v),
            Value::TimeTicks(v) => buf.push_unsigned32(tag::application::TIMETICKS, *v),
            Value::Opaque(data) => {
                buf.push_bytes(data);
                buf.push_length(data.len());
                buf.push_tag(tag::application::OPAQUE);
            }
            Value::Counter64(v) => buf.push_integer64(*v),
            Value::NoSuchObject => push_exception(buf, tag::context::NO_SUCH_OBJECT),
            Value::NoSuchInstance => push_exception(buf, tag::context::NO_SUCH_INSTANCE),
            Value::EndOfMibView => push_exception(buf, tag::context::END_OF_MIB_VIEW),
        }
    }

    /// Decode from BER.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let tag = decoder.read_tag()?;
        let len = decoder.read_length()?;

        let value = match tag {
            tag::universal::INTEGER => Value::Integer(decoder.read_integer_value(len)?),
            tag::universal::OCTET_STRING => Value::OctetString(decoder.read_bytes(len)?),
            tag::universal::NULL => {
                if len != 0 {
                    return Err(decoder.malformed(DecodeErrorKind::InvalidNull));
                }
                Value::Null
            }
            tag::universal::OBJECT_IDENTIFIER => {
                Value::ObjectIdentifier(decoder.read_oid_value(len)?)
            }
            tag::application::IP_ADDRESS => {
                if len != 4 {
                    return Err(decoder
                        .malformed(DecodeErrorKind::InvalidIpAddressLength { length: len }));
                }
                let data = decoder.read_bytes(4)?;
                Value::IpAddress([data[0], data[1], data[2], data[3]])
            }
            tag::application::COUNTER32 => Value::Counter32(decoder.read_unsigned32_value(len)?),
            tag::application::GAUGE32 => Value::Gauge32(decoder.read_unsigned32_value(len)?),
            tag::application::TIMETICKS => Value::TimeTicks(decoder.read_unsigned32_value(len)?),
            tag::application::OPAQUE => Value::Opaque(decoder.read_bytes(len)?),
            tag::application::COUNTER64 => Value::Counter64(decoder.read_integer64_value(len)?),
            tag::context::NO_SUCH_OBJECT
            | tag::context::NO_SUCH_INSTANCE
            | tag::context::END_OF_MIB_VIEW => {
                let _ = decoder.read_bytes(len)?;
                match tag {
                    tag::context::NO_SUCH_OBJECT => Value::NoSuchObject,
                    tag::context::NO_SUCH_INSTANCE => Value::NoSuchInstance,
                    _ => Value::EndOfMibView,
                }
            }
            other => {
                return Err(decoder.malformed(DecodeErrorKind::UnexpectedTag {
                    expected: tag::universal::NULL,
                    actual: other,
                }));
            }
        };
        Ok(value)
    }
}

fn push_exception(buf: &mut EncodeBuf, tag: u8) {
    buf.push_length(0);
    buf.push_tag(tag);
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::OctetString(data) | Value::Opaque(data) => match std::str::from_utf8(data) {
                Ok(s) => f.write_str(s),
                Err(_) => write!(f, "{:02x?}", &data[..]),
            },
            Value::Null => f.write_str("NULL"),
            Value::ObjectIdentifier(oid) => write!(f, "{}", oid),
            Value::IpAddress(a) => write!(f, "{}.{}.{}.{}", a[0], a[1], a[2], a[3]),
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => write!(f, "{}", v),
            Value::Counter64(v) => write!(f, "{}", v),
            Value::NoSuchObject => f.write_str("noSuchObject"),
            Value::NoSuchInstance => f.write_str("noSuchInstance"),
            Value::EndOfMibView => f.write_str("endOfMibView"),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::OctetString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::OctetString(Bytes::from(s))
    }
}

impl From<Oid> for Value {
    fn from(oid: Oid) -> Self {
        Value::ObjectIdentifier(oid)
    }
}
