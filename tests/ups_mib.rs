//! End-to-end UPS-MIB tests: walk, decode, enumerate.

mod common;

use common::{DEVICE_COUNT, TestAgent, fixtures, location};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use ups_snmp::mib::tables;
use ups_snmp::{
    BatteryStatus, DeviceEnumerator, EnumerationContext, Error, QuantityType, ReadValue,
    SensorDescriptor, SnmpClient, Table, UpsMib, UpsServer,
};

async fn build(agent: &TestAgent) -> UpsMib {
    UpsMib::new(Arc::new(SnmpClient::new(agent.config())))
        .await
        .unwrap()
}

fn ctx() -> EnumerationContext {
    EnumerationContext::new("test_rack", "test_board")
}

#[tokio::test]
async fn builds_nineteen_tables_identity_first() {
    let agent = TestAgent::new().await;
    let mib = build(&agent).await;

    assert_eq!(mib.tables().len(), 19);
    assert_eq!(mib.tables()[0].name(), tables::IDENTITY);
    assert_eq!(mib.tables()[1].name(), tables::BATTERY);
}

#[tokio::test]
async fn decodes_identity() {
    let agent = TestAgent::new().await;
    let mib = build(&agent).await;

    let identity = mib.identity();
    assert_eq!(identity.manufacturer, fixtures::MANUFACTURER);
    assert_eq!(identity.model, fixtures::MODEL);
    assert_eq!(identity.ups_software_version, fixtures::UPS_SOFTWARE_VERSION);
    assert_eq!(identity.agent_software_version, fixtures::AGENT_SOFTWARE_VERSION);
    assert_eq!(identity.name, fixtures::NAME);
    assert_eq!(identity.attached_devices, fixtures::ATTACHED_DEVICES);
    assert_eq!(mib.battery_status(), BatteryStatus::Normal);
}

/// upsBatteryStatus follows RFC 1628: batteryLow(3), batteryDepleted(4).
#[tokio::test]
async fn battery_status_uses_mib_numbering() {
    let agent = TestAgent::new().await;
    agent.set(common::ups(&[1, 2, 1, 0]), ups_snmp::Value::Integer(3));
    assert_eq!(build(&agent).await.battery_status(), BatteryStatus::Low);

    agent.set(common::ups(&[1, 2, 1, 0]), ups_snmp::Value::Integer(4));
    assert_eq!(build(&agent).await.battery_status(), BatteryStatus::Depleted);
}

/// Identity is best effort: a mistyped or missing field is left empty.
#[tokio::test]
async fn identity_tolerates_bad_fields() {
    let agent = TestAgent::new().await;
    agent.set(common::ups(&[1, 1, 2, 0]), ups_snmp::Value::Integer(93));
    agent.remove(&common::ups(&[1, 1, 6, 0]));

    let mib = build(&agent).await;
    assert_eq!(mib.identity().manufacturer, fixtures::MANUFACTURER);
    assert_eq!(mib.identity().model, "");
}

#[tokio::test]
async fn indexed_tables_have_one_row_per_line() {
    let agent = TestAgent::new().await;
    let mib = build(&agent).await;

    let input = mib.table(tables::INPUT).unwrap();
    assert_eq!(input.rows().len(), fixtures::INPUT_LINES as usize);
    assert_eq!(input.rows()[0].base_oid(), ".1.3.6.1.2.1.33.1.3.3.1.%d.1");
    assert_eq!(input.rows()[2].cell(3).unwrap().value, ReadValue::Integer(2303));

    assert_eq!(mib.table(tables::OUTPUT).unwrap().rows().len(), 3);
    assert!(mib.table(tables::BYPASS).unwrap().rows().is_empty());

    // flattened tables always decode to one row, even when empty
    let alarms = mib.table(tables::WELL_KNOWN_ALARMS).unwrap();
    assert_eq!(alarms.rows().len(), 1);
    assert_eq!(alarms.rows()[0].cells().len(), 24);
    assert!(alarms.rows()[0].cells().iter().all(|c| c.value.is_null()));
}

#[tokio::test]
async fn enumerates_forty_devices_stably() {
    let agent = TestAgent::new().await;
    let mib = build(&agent).await;

    let first = mib.enumerate_devices(&ctx()).unwrap();
    let second = mib.enumerate_devices(&ctx()).unwrap();

    assert_eq!(first.len(), DEVICE_COUNT);
    assert_eq!(first.len(), 40);
    assert_eq!(first, second);

    for (i, device) in first.iter().enumerate() {
        assert_eq!(device.id(), Some(i.to_string().as_str()));
        assert_eq!(device.model, fixtures::MODEL);
        assert_eq!(device.location.rack, "test_rack");
        assert_eq!(device.location.board, "test_board");
    }

    let count = |kind| first.iter().filter(|d| d.kind == kind).count();
    assert_eq!(count(QuantityType::Identity), 6);
    assert_eq!(count(QuantityType::Voltage), 1 + 3 + 3);
    assert_eq!(count(QuantityType::Current), 1 + 3 + 3);
    assert_eq!(count(QuantityType::Power), 3 + 3);
    assert_eq!(count(QuantityType::Frequency), 3 + 1);
    assert_eq!(count(QuantityType::Temperature), 1);
    assert_eq!(count(QuantityType::Status), 4 + 2 + 3);
}

#[tokio::test]
async fn descriptor_addressing() {
    let agent = TestAgent::new().await;
    let mib = build(&agent).await;
    let devices = mib.enumerate_devices(&ctx()).unwrap();

    let voltage = devices
        .iter()
        .find(|d| d.info == "upsInputVoltage0")
        .unwrap();
    assert_eq!(voltage.kind, QuantityType::Voltage);
    let addressing = &voltage.addressing;
    assert_eq!(addressing["table_name"], tables::INPUT);
    assert_eq!(addressing["base_oid"], ".1.3.6.1.2.1.33.1.3.3.1.%d.1");
    assert_eq!(addressing["row"], "0");
    assert_eq!(addressing["column"], "3");
    assert_eq!(addressing["oid"], ".1.3.6.1.2.1.33.1.3.3.1.3.1");
    assert_eq!(addressing["info"], "upsInputVoltage0");

    // connection parameters travel with the descriptor
    for (key, value) in agent.params() {
        assert_eq!(addressing.get(&key), Some(&value), "{}", key);
    }

    let manufacturer = &devices[0];
    assert_eq!(manufacturer.kind, QuantityType::Identity);
    assert_eq!(manufacturer.info, "upsIdentManufacturer");
    assert_eq!(manufacturer.oid(), Some(".1.3.6.1.2.1.33.1.1.1.0"));
}

struct FailingEnumerator;

impl DeviceEnumerator for FailingEnumerator {
    fn enumerate(&self, table: &Table, _ctx: &EnumerationContext) -> ups_snmp::Result<Vec<SensorDescriptor>> {
        Err(Error::Enumeration {
            table: table.name().into(),
            message: "boom".into(),
        }
        .boxed())
    }
}

/// One failing table fails the whole enumeration; no partial list.
#[tokio::test]
async fn failing_enumerator_aborts_enumeration() {
    let agent = TestAgent::new().await;
    let mut mib = build(&agent).await;
    mib.table_mut(tables::OUTPUT)
        .unwrap()
        .set_enumerator(Box::new(FailingEnumerator));

    let result = mib.enumerate_devices(&ctx());
    match result {
        Err(err) => match *err {
            Error::Enumeration { ref table, ref message } => {
                assert_eq!(&**table, tables::OUTPUT);
                assert_eq!(&**message, "boom");
            }
            ref other => panic!("expected Enumeration, got {:?}", other),
        },
        Ok(devices) => panic!("expected error, got {} devices", devices.len()),
    }
}

#[tokio::test]
async fn walk_failure_fails_construction() {
    let agent = TestAgent::new().await;
    let config = agent.config().with_timeout(Duration::from_millis(100));
    agent.stop();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let err = UpsMib::new(Arc::new(SnmpClient::new(config)))
        .await
        .unwrap_err();
    assert!(err.is_transport(), "got {:?}", err);
}

#[tokio::test]
async fn server_from_params() {
    let agent = TestAgent::new().await;
    let server = UpsServer::from_params(&agent.params(), &location())
        .await
        .unwrap();

    assert_eq!(server.devices().len(), 40);
    assert_eq!(server.mib().identity().model, fixtures::MODEL);
    server.mib().dump();
}

#[tokio::test]
async fn server_requires_rack_and_board() {
    let agent = TestAgent::new().await;
    let mut bag: BTreeMap<String, String> = location();
    bag.remove("board");

    let err = UpsServer::from_params(&agent.params(), &bag)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "board is not in data");
    // validation fails before any traffic
    assert_eq!(agent.request_count(), 0);
}
