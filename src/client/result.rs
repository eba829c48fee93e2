//! Decoded readings.

use std::fmt;

use bytes::Bytes;

use crate::util::HexBytes;
use crate::value::Value;
use crate::varbind::VarBind;

/// One scalar read from the agent.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadResult {
    /// Dotted OID with a leading dot, e.g. `.1.3.6.1.2.1.33.1.1.1.0`
    pub oid: String,
    pub value: ReadValue,
}

/// Value of a reading, reduced to the shapes the read handlers understand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadValue {
    Integer(i64),
    String(String),
    Bytes(Bytes),
    Null,
}

impl ReadValue {
    /// Type name reported in mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "int64",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Null => "null",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ReadValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::String(s) => f.write_str(s),
            Self::Bytes(b) => write!(f, "0x{}", HexBytes(b)),
            Self::Null => f.write_str("null"),
        }
    }
}

/// Printable ASCII (0x20..=0x7E) octet strings become text; anything else
/// stays raw. The protocol does not distinguish the two.
fn octets_to_value(data: Bytes) -> ReadValue {
    if data.iter().all(|b| (0x20..=0x7e).contains(b)) {
        String::from_utf8(data.to_vec()).map_or_else(|_| ReadValue::Bytes(data), ReadValue::String)
    } else {
        ReadValue::Bytes(data)
    }
}

impl From<Value> for ReadValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Integer(v) => Self::Integer(v.into()),
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => {
                Self::Integer(v.into())
            }
            Value::Counter64(v) => match i64::try_from(v) {
                Ok(v) => Self::Integer(v),
                Err(_) => Self::Bytes(Bytes::copy_from_slice(&v.to_be_bytes())),
            },
            Value::OctetString(data) => octets_to_value(data),
            Value::Opaque(data) => Self::Bytes(data),
            Value::ObjectIdentifier(oid) => Self::String(oid.to_dotted()),
            Value::IpAddress([a, b, c, d]) => Self::String(format!("{}.{}.{}.{}", a, b, c, d)),
            _ => Self::Null,
        }
    }
}

impl From<VarBind> for ReadResult {
    fn from(vb: VarBind) -> Self {
        Self {
            oid: vb.oid.to_dotted(),
            value: vb.value.into(),
        }
    }
}
