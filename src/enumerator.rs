//! Device enumeration: turning table cells into sensor descriptors.
//!
//! A [`Table`] owns one [`DeviceEnumerator`]. Most UPS-MIB tables expose no
//! sensors and keep the default [`NoopEnumerator`]; the ones that do use a
//! [`ColumnEnumerator`] declaring which columns carry which quantity.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::config::merge_params;
use crate::error::{Error, Result};
use crate::table::{Row, Table};

/// Addressing keys a descriptor carries on top of the connection parameters.
pub mod keys {
    pub const TABLE_NAME: &str = "table_name";
    pub const BASE_OID: &str = "base_oid";
    pub const ROW: &str = "row";
    pub const COLUMN: &str = "column";
    pub const OID: &str = "oid";
    pub const ID: &str = "id";
    pub const INFO: &str = "info";
}

/// Physical quantity a sensor reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum QuantityType {
    Current,
    Voltage,
    Frequency,
    Power,
    Temperature,
    Status,
    Identity,
}

impl QuantityType {
    pub const ALL: [QuantityType; 7] = [
        Self::Current,
        Self::Voltage,
        Self::Frequency,
        Self::Power,
        Self::Temperature,
        Self::Status,
        Self::Identity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Voltage => "voltage",
            Self::Frequency => "frequency",
            Self::Power => "power",
            Self::Temperature => "temperature",
            Self::Status => "status",
            Self::Identity => "identity",
        }
    }
}

impl fmt::Display for QuantityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuantityType {
    type Err = Box<Error>;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|q| q.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::config(format!("unknown quantity type: {}", s)))
    }
}

/// Where a device physically lives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub rack: String,
    pub board: String,
}

/// Rack and board the enumerated devices are attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationContext {
    pub rack: String,
    pub board: String,
}

impl EnumerationContext {
    pub fn new(rack: impl Into<String>, board: impl Into<String>) -> Self {
        Self {
            rack: rack.into(),
            board: board.into(),
        }
    }

    /// Build from a `{"rack", "board"}` bag.
    pub fn from_params(params: &BTreeMap<String, String>) -> Result<Self> {
        let rack = params
            .get("rack")
            .ok_or_else(|| Error::config("rack is not in data"))?;
        let board = params
            .get("board")
            .ok_or_else(|| Error::config("board is not in data"))?;
        Ok(Self::new(rack.as_str(), board.as_str()))
    }

    pub fn location(&self) -> Location {
        Location {
            rack: self.rack.clone(),
            board: self.board.clone(),
        }
    }
}

/// One addressable sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorDescriptor {
    pub kind: QuantityType,
    pub model: String,
    pub location: Location,
    pub info: String,
    /// Table/row/column addressing merged with the connection parameters
    pub addressing: BTreeMap<String, String>,
}

impl SensorDescriptor {
    /// The OID a read of this sensor targets.
    pub fn oid(&self) -> Option<&str> {
        self.addressing.get(keys::OID).map(String::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.addressing.get(keys::ID).map(String::as_str)
    }
}

/// Supplies the device model string for descriptors.
pub trait ModelProvider: Send + Sync {
    fn model(&self) -> String;
}

/// Strategy turning a decoded table into descriptors.
pub trait DeviceEnumerator: Send + Sync {
    fn enumerate(&self, table: &Table, ctx: &EnumerationContext) -> Result<Vec<SensorDescriptor>>;
}

/// Enumerates nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEnumerator;

impl DeviceEnumerator for NoopEnumerator {
    fn enumerate(&self, _table: &Table, _ctx: &EnumerationContext) -> Result<Vec<SensorDescriptor>> {
        Ok(Vec::new())
    }
}

/// One descriptor per declared (row, column) pair.
///
/// Columns are 1-based, matching the MIB column arcs. The descriptor's
/// `info` is the column name; indexed tables append the row number.
#[derive(Debug, Clone)]
pub struct ColumnEnumerator {
    columns: Vec<(u32, QuantityType)>,
}

impl ColumnEnumerator {
    pub fn new(columns: impl IntoIterator<Item = (u32, QuantityType)>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
        }
    }

    pub fn columns(&self) -> &[(u32, QuantityType)] {
        &self.columns
    }
}

impl DeviceEnumerator for ColumnEnumerator {
    fn enumerate(&self, table: &Table, ctx: &EnumerationContext) -> Result<Vec<SensorDescriptor>> {
        let connection = table.context().config().to_params();
        let model = table.model();
        let mut out = Vec::new();

        for (row_index, row) in table.rows().iter().enumerate() {
            for &(column, kind) in &self.columns {
                let info = column_info(table, row_index, column)?;
                let addressing = row_addressing(table, row, row_index, column, out.len(), &info);
                let addressing = merge_params(&connection, &addressing)
                    .map_err(|message| enumeration_error(table, message))?;

                out.push(SensorDescriptor {
                    kind,
                    model: model.clone(),
                    location: ctx.location(),
                    info,
                    addressing,
                });
            }
        }

        tracing::debug!(
            target: "ups_snmp::devices",
            { table = table.name(), count = out.len() },
            "enumerated devices"
        );
        Ok(out)
    }
}

/// Column name, suffixed with the row number for indexed tables.
fn column_info(table: &Table, row_index: usize, column: u32) -> Result<String> {
    let name = (column as usize)
        .checked_sub(1)
        .and_then(|i| table.column_names().get(i))
        .ok_or_else(|| enumeration_error(table, format!("no column {}", column)))?;
    Ok(if table.is_flattened() {
        name.clone()
    } else {
        format!("{}{}", name, row_index)
    })
}

fn row_addressing(
    table: &Table,
    row: &Row,
    row_index: usize,
    column: u32,
    id: usize,
    info: &str,
) -> BTreeMap<String, String> {
    BTreeMap::from([
        (keys::TABLE_NAME.to_string(), table.name().to_string()),
        (keys::BASE_OID.to_string(), row.base_oid().to_string()),
        (keys::ROW.to_string(), row_index.to_string()),
        (keys::COLUMN.to_string(), column.to_string()),
        (keys::OID.to_string(), row.oid_for(column)),
        (keys::ID.to_string(), id.to_string()),
        (keys::INFO.to_string(), info.to_string()),
    ])
}

fn enumeration_error(table: &Table, message: impl Into<Box<str>>) -> Box<Error> {
    Error::Enumeration {
        table: table.name().into(),
        message: message.into(),
    }
    .boxed()
}
