//! One UPS behind one SNMPv3 agent.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::client::SnmpClient;
use crate::config::ConnectionConfig;
use crate::enumerator::{EnumerationContext, SensorDescriptor};
use crate::error::Result;
use crate::mib::UpsMib;

/// A UPS: its decoded MIB and the devices enumerated from it.
#[derive(Debug)]
pub struct UpsServer {
    mib: UpsMib,
    devices: Vec<SensorDescriptor>,
}

impl UpsServer {
    /// Build from a connection parameter bag and a `{"rack", "board"}` bag.
    pub async fn from_params(
        connection: &BTreeMap<String, String>,
        location: &BTreeMap<String, String>,
    ) -> Result<Self> {
        let config = ConnectionConfig::from_params(connection)?;
        let ctx = EnumerationContext::from_params(location)?;
        Self::new(config, &ctx).await
    }

    pub async fn new(config: ConnectionConfig, ctx: &EnumerationContext) -> Result<Self> {
        tracing::debug!(
            target: "ups_snmp::mib",
            { endpoint = config.endpoint(), port = config.port(), rack = %ctx.rack, board = %ctx.board },
            "building UPS server"
        );
        let mib = UpsMib::new(Arc::new(SnmpClient::new(config))).await?;
        let devices = mib.enumerate_devices(ctx)?;
        Ok(Self { mib, devices })
    }

    pub fn mib(&self) -> &UpsMib {
        &self.mib
    }

    pub fn devices(&self) -> &[SensorDescriptor] {
        &self.devices
    }
}
