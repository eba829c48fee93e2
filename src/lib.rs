//! # ups-snmp
//!
//! UPS telemetry over SNMPv3.
//!
//! The crate walks the UPS-MIB (RFC 1628) of an SNMPv3 agent, decodes its
//! tables into rows, turns the rows into addressable sensor descriptors, and
//! reads each sensor on demand with a typed decoder.
//!
//! - [`config`]: credentials and connection settings, plus the flat
//!   parameter bag conversion used by descriptors.
//! - [`client`]: authPriv USM sessions, one per `get` or `walk`.
//! - [`table`]: walk results decoded into rows, flattened or indexed.
//! - [`enumerator`]: strategies turning rows into [`SensorDescriptor`]s.
//! - [`mib`]: the 19 UPS-MIB tables and the identity cache.
//! - [`devices`]: per-quantity read handlers.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ups_snmp::{ConnectionConfig, EnumerationContext, SecurityParameters, SnmpClient, UpsMib};
//! use ups_snmp::v3::{AuthProtocol, PrivProtocol};
//!
//! #[tokio::main]
//! async fn main() -> ups_snmp::Result<()> {
//!     let security = SecurityParameters::new(
//!         "simulator",
//!         Some(AuthProtocol::Sha1),
//!         "auctoritas",
//!         Some(PrivProtocol::Aes128),
//!         "privatus",
//!     )?;
//!     let config = ConnectionConfig::new("v3", "192.168.1.20", 161, Some(security), "")?;
//!
//!     let mib = UpsMib::new(Arc::new(SnmpClient::new(config))).await?;
//!     let devices = mib.enumerate_devices(&EnumerationContext::new("rack-1", "ups"))?;
//!     for device in &devices {
//!         let reading = ups_snmp::devices::read_descriptor(device).await?;
//!         println!("{} {} = {}", device.kind, device.info, reading.value);
//!     }
//!     Ok(())
//! }
//! ```

pub mod ber;
pub mod client;
pub mod config;
pub mod devices;
pub mod enumerator;
pub mod error;
pub mod message;
pub mod mib;
pub mod oid;
pub mod pdu;
pub mod server;
pub mod table;
pub mod transport;
pub mod v3;
pub mod value;
pub mod varbind;

pub(crate) mod util;

pub use client::{BulkWalk, Client, ReadResult, ReadValue, SnmpClient, run_scoped};
pub use config::{ConnectionConfig, SecurityParameters};
pub use devices::{HANDLERS, Handler, Reading};
pub use enumerator::{
    ColumnEnumerator, DeviceEnumerator, EnumerationContext, Location, ModelProvider,
    NoopEnumerator, QuantityType, SensorDescriptor,
};
pub use error::{Error, ErrorStatus, Result, WalkAbortReason};
pub use mib::{BatteryStatus, UpsIdentity, UpsMib};
pub use oid::Oid;
pub use server::UpsServer;
pub use table::{Row, Table, TableSpec};
pub use transport::{Transport, UdpTransport};
pub use v3::{AuthProtocol, PrivProtocol};
pub use value::Value;
pub use varbind::VarBind;
