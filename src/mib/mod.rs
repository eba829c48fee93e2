//! UPS-MIB composition.
//!
//! [`UpsMib`] walks all 19 UPS-MIB tables against one agent, decodes the
//! identity group into an [`UpsIdentity`] cache, and aggregates each table's
//! device enumeration into one descriptor list.

mod identity;
pub mod tables;

pub use identity::{BatteryStatus, UpsIdentity};

use std::sync::Arc;

use crate::client::SnmpClient;
use crate::enumerator::{EnumerationContext, SensorDescriptor, keys};
use crate::error::Result;
use crate::table::Table;

/// The decoded UPS-MIB of one agent.
#[derive(Debug)]
pub struct UpsMib {
    context: Arc<SnmpClient>,
    tables: Vec<Table>,
    identity: Arc<UpsIdentity>,
}

impl UpsMib {
    /// Walk and decode every table, identity first.
    ///
    /// Any walk failure fails construction. Identity decoding never does; a
    /// missing or mistyped field is left empty.
    pub async fn new(context: Arc<SnmpClient>) -> Result<Self> {
        let declaration = tables::identity();
        let mut identity_table = Table::new(
            declaration.spec,
            context.clone(),
            Arc::new(UpsIdentity::default()),
        )
        .await?;

        let identity = Arc::new(UpsIdentity::from_row(identity_table.rows().first()));
        tracing::debug!(
            target: "ups_snmp::mib",
            { manufacturer = %identity.manufacturer, model = %identity.model },
            "decoded UPS identity"
        );
        identity_table.set_model(identity.clone());
        if let Some(devices) = declaration.devices {
            identity_table.set_enumerator(Box::new(devices));
        }

        let mut all = vec![identity_table];
        for declaration in tables::remaining() {
            let mut table = Table::new(declaration.spec, context.clone(), identity.clone()).await?;
            if let Some(devices) = declaration.devices {
                table.set_enumerator(Box::new(devices));
            }
            all.push(table);
        }

        tracing::debug!(target: "ups_snmp::mib", { tables = all.len() }, "UPS-MIB built");
        Ok(Self {
            context,
            tables: all,
            identity,
        })
    }

    pub fn context(&self) -> &Arc<SnmpClient> {
        &self.context
    }

    /// Tables in build order.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name() == name)
    }

    /// Mutable access, e.g. to swap a table's enumerator.
    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.name() == name)
    }

    pub fn identity(&self) -> &UpsIdentity {
        &self.identity
    }

    /// Battery status from the battery table's first column.
    pub fn battery_status(&self) -> BatteryStatus {
        let reading = self
            .table(tables::BATTERY)
            .and_then(|t| t.rows().first())
            .and_then(|row| row.cell(1))
            .and_then(|cell| cell.value.as_i64());
        BatteryStatus::from_reading(reading)
    }

    /// Enumerate every table in order.
    ///
    /// The first failing table aborts the whole call. Descriptor ids are
    /// renumbered over the aggregate list.
    pub fn enumerate_devices(&self, ctx: &EnumerationContext) -> Result<Vec<SensorDescriptor>> {
        let mut devices = Vec::new();
        for table in &self.tables {
            devices.extend(table.enumerate_devices(ctx)?);
        }
        for (id, device) in devices.iter_mut().enumerate() {
            device.addressing.insert(keys::ID.to_string(), id.to_string());
        }
        tracing::debug!(target: "ups_snmp::mib", { devices = devices.len() }, "enumerated UPS-MIB");
        Ok(devices)
    }

    /// Log every table at debug level.
    pub fn dump(&self) {
        tracing::debug!(target: "ups_snmp::mib", { identity = ?self.identity }, "UPS-MIB");
        for table in &self.tables {
            table.dump();
        }
    }
}
