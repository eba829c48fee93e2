//! Per-quantity read handlers.
//!
//! Each sensor descriptor is read with one GET against the OID in its
//! addressing, and the value is decoded by the handler registered for the
//! descriptor's [`QuantityType`] in [`HANDLERS`].

use std::collections::BTreeMap;

use crate::client::{ReadValue, SnmpClient};
use crate::config::ConnectionConfig;
use crate::enumerator::{QuantityType, SensorDescriptor, keys};
use crate::error::{Error, Result};

/// Decoded reading of one sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    pub kind: QuantityType,
    pub value: String,
}

/// Decoder for one quantity.
#[derive(Debug, Clone, Copy)]
pub struct Handler {
    pub kind: QuantityType,
    /// Type name reported on mismatch
    pub expects: &'static str,
    decode: fn(&ReadValue) -> Option<String>,
}

impl Handler {
    /// Decode a value, or fail with [`Error::TypeMismatch`].
    pub fn decode(&self, value: &ReadValue) -> Result<String> {
        (self.decode)(value).ok_or_else(|| {
            tracing::debug!(
                target: "ups_snmp::devices",
                { quantity = %self.kind, actual_type = value.type_name() },
                "unexpected reading type"
            );
            Error::TypeMismatch {
                quantity: self.kind.as_str().into(),
                expected: self.expects,
                actual_type: value.type_name(),
                value: value.to_string().into(),
            }
            .boxed()
        })
    }

    /// Read and decode the sensor at `addressing`.
    pub async fn read(&self, addressing: &BTreeMap<String, String>) -> Result<Reading> {
        let config = ConnectionConfig::from_params(addressing)?;
        let oid = device_identifier(addressing)
            .ok_or_else(|| Error::config("oid is not in addressing"))?;

        let result = SnmpClient::new(config).get(oid).await?;
        let value = self.decode(&result.value)?;
        tracing::trace!(target: "ups_snmp::devices", { quantity = %self.kind, snmp.oid = oid, value = %value }, "read");
        Ok(Reading {
            kind: self.kind,
            value,
        })
    }
}

/// Integer tenths rendered with one decimal, e.g. 2345 → "234.5".
fn tenths(value: &ReadValue) -> Option<String> {
    value.as_i64().map(|v| format!("{:.1}", v as f64 / 10.0))
}

fn integer(value: &ReadValue) -> Option<String> {
    value.as_i64().map(|v| v.to_string())
}

fn text(value: &ReadValue) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn status(value: &ReadValue) -> Option<String> {
    match value {
        ReadValue::String(s) => Some(s.clone()),
        ReadValue::Integer(v) => Some(v.to_string()),
        ReadValue::Null => Some(String::new()),
        ReadValue::Bytes(_) => None,
    }
}

/// Handler for every quantity type.
pub static HANDLERS: [Handler; 7] = [
    Handler {
        kind: QuantityType::Current,
        expects: "int64",
        decode: tenths,
    },
    Handler {
        kind: QuantityType::Voltage,
        expects: "int64",
        decode: tenths,
    },
    Handler {
        kind: QuantityType::Frequency,
        expects: "int64",
        decode: tenths,
    },
    Handler {
        kind: QuantityType::Power,
        expects: "int64",
        decode: integer,
    },
    Handler {
        kind: QuantityType::Temperature,
        expects: "int64",
        decode: integer,
    },
    Handler {
        kind: QuantityType::Status,
        expects: "string, int64 or null",
        decode: status,
    },
    Handler {
        kind: QuantityType::Identity,
        expects: "string",
        decode: text,
    },
];

/// Look up the handler for a quantity.
pub fn handler(kind: QuantityType) -> &'static Handler {
    // HANDLERS covers every variant, in declaration order
    &HANDLERS[kind as usize]
}

/// Read one quantity at `addressing`.
pub async fn read(kind: QuantityType, addressing: &BTreeMap<String, String>) -> Result<Reading> {
    handler(kind).read(addressing).await
}

/// Read the sensor a descriptor describes.
pub async fn read_descriptor(descriptor: &SensorDescriptor) -> Result<Reading> {
    read(descriptor.kind, &descriptor.addressing).await
}

/// Identifier of a device: the OID it reads.
pub fn device_identifier(addressing: &BTreeMap<String, String>) -> Option<&str> {
    addressing.get(keys::OID).map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_handlers_cover_every_quantity() {
        for kind in QuantityType::ALL {
            assert_eq!(handler(kind).kind, kind);
        }
    }

    #[test]
    fn test_tenths() {
        for kind in [QuantityType::Current, QuantityType::Voltage, QuantityType::Frequency] {
            assert_eq!(handler(kind).decode(&ReadValue::Integer(2345)).unwrap(), "234.5");
            assert_eq!(handler(kind).decode(&ReadValue::Integer(600)).unwrap(), "60.0");
        }
    }

    #[test]
    fn test_plain_integers() {
        for kind in [QuantityType::Power, QuantityType::Temperature] {
            assert_eq!(handler(kind).decode(&ReadValue::Integer(150)).unwrap(), "150");
        }
    }

    #[test]
    fn test_status() {
        let h = handler(QuantityType::Status);
        assert_eq!(h.decode(&ReadValue::Null).unwrap(), "");
        assert_eq!(h.decode(&ReadValue::String("online".into())).unwrap(), "online");
        assert_eq!(h.decode(&ReadValue::Integer(42)).unwrap(), "42");

        let err = h.decode(&ReadValue::Bytes(Bytes::from_static(&[0x01]))).unwrap_err();
        match *err {
            Error::TypeMismatch {
                ref quantity,
                actual_type,
                ref value,
                ..
            } => {
                assert_eq!(&**quantity, "status");
                assert_eq!(actual_type, "bytes");
                assert_eq!(&**value, "0x01");
            }
            ref other => panic!("expected TypeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_mismatches() {
        let err = handler(QuantityType::Voltage)
            .decode(&ReadValue::String("230".into()))
            .unwrap_err();
        assert!(matches!(*err, Error::TypeMismatch { actual_type: "string", .. }));

        let err = handler(QuantityType::Identity)
            .decode(&ReadValue::Integer(1))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected string identity reading, got type: int64, value: 1"
        );

        let err = handler(QuantityType::Power).decode(&ReadValue::Null).unwrap_err();
        assert!(matches!(*err, Error::TypeMismatch { actual_type: "null", .. }));
    }

    #[test]
    fn test_device_identifier() {
        let addressing = BTreeMap::from([(keys::OID.to_string(), ".1.3.6.1.2.1.33.1.2.5.0".to_string())]);
        assert_eq!(device_identifier(&addressing), Some(".1.3.6.1.2.1.33.1.2.5.0"));
        assert_eq!(device_identifier(&BTreeMap::new()), None);
    }

    #[tokio::test]
    async fn test_read_rejects_bad_addressing() {
        let err = read(QuantityType::Voltage, &BTreeMap::new()).await.unwrap_err();
        assert!(matches!(*err, Error::Config(_)));
    }
}
