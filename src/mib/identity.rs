//! UPS identity cache and battery status names.

use std::fmt;

use crate::client::ReadValue;
use crate::enumerator::ModelProvider;
use crate::table::Row;

/// Identity strings from the `upsIdent` group.
///
/// Every field defaults to an empty string when the agent does not return it
/// or returns something other than text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsIdentity {
    pub manufacturer: String,
    pub model: String,
    pub ups_software_version: String,
    pub agent_software_version: String,
    pub name: String,
    pub attached_devices: String,
}

impl UpsIdentity {
    /// Decode from the identity table's single row.
    pub fn from_row(row: Option<&Row>) -> Self {
        let Some(row) = row else {
            tracing::debug!(target: "ups_snmp::mib", "identity table has no row");
            return Self::default();
        };

        let text = |column: u32| -> String {
            match row.cell(column).map(|c| &c.value) {
                Some(ReadValue::String(s)) => s.clone(),
                Some(other) => {
                    tracing::debug!(
                        target: "ups_snmp::mib",
                        { column, actual_type = other.type_name() },
                        "identity column is not a string"
                    );
                    String::new()
                }
                None => String::new(),
            }
        };

        Self {
            manufacturer: text(1),
            model: text(2),
            ups_software_version: text(3),
            agent_software_version: text(4),
            name: text(5),
            attached_devices: text(6),
        }
    }
}

impl ModelProvider for UpsIdentity {
    fn model(&self) -> String {
        self.model.clone()
    }
}

/// `upsBatteryStatus` values, numbered as in RFC 1628:
/// unknown(1), batteryNormal(2), batteryLow(3), batteryDepleted(4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BatteryStatus {
    Unknown,
    Normal,
    Low,
    Depleted,
    Undefined,
}

impl BatteryStatus {
    pub fn from_reading(reading: Option<i64>) -> Self {
        match reading {
            Some(1) => Self::Unknown,
            Some(2) => Self::Normal,
            Some(3) => Self::Low,
            Some(4) => Self::Depleted,
            _ => Self::Undefined,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Normal => "normal",
            Self::Low => "low",
            Self::Depleted => "depleted",
            Self::Undefined => "undefined",
        }
    }
}

impl fmt::Display for BatteryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
