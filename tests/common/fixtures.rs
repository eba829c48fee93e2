//! UPS-MIB fixture data for the test agent.
//!
//! Models an Eaton 93PM behind a PXGMS card: three input lines, three output
//! lines and no bypass lines.

use std::collections::BTreeMap;
use ups_snmp::{Oid, Value, oid};

pub const MANUFACTURER: &str = "Eaton Corporation";
pub const MODEL: &str = "PXGMS UPS + EATON 93PM";
pub const UPS_SOFTWARE_VERSION: &str = "INV: 1.44.0000";
pub const AGENT_SOFTWARE_VERSION: &str = "2.3.7";
pub const NAME: &str = "ID: EM111UXX06, Msg: 9PL15N0000E40R2";
pub const ATTACHED_DEVICES: &str = "Attached Devices not set";

pub const INPUT_LINES: u32 = 3;
pub const OUTPUT_LINES: u32 = 3;

/// Descriptors the fixture enumerates to: identity 6, battery 7, input 4 per
/// line, output headers 3, output 4 per line.
pub const DEVICE_COUNT: usize = 6 + 7 + 4 * INPUT_LINES as usize + 3 + 4 * OUTPUT_LINES as usize;

/// `upsMIB` = 1.3.6.1.2.1.33
pub fn ups(arcs: &[u32]) -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 33).join(arcs)
}

fn text(s: &'static str) -> Value {
    Value::OctetString(s.into())
}

/// The full UPS-MIB fixture.
pub fn ups_mib() -> BTreeMap<Oid, Value> {
    let mut data = BTreeMap::new();

    // upsIdent
    for (column, value) in [
        MANUFACTURER,
        MODEL,
        UPS_SOFTWARE_VERSION,
        AGENT_SOFTWARE_VERSION,
        NAME,
        ATTACHED_DEVICES,
    ]
    .into_iter()
    .enumerate()
    {
        data.insert(ups(&[1, 1, column as u32 + 1, 0]), text(value));
    }

    // upsBattery
    let battery = [
        Value::Integer(2),  // normal
        Value::Integer(0),  // seconds on battery
        Value::Integer(42), // minutes remaining
        Value::Integer(100),
        Value::Integer(2170), // 0.1 V DC
        Value::Integer(0),
        Value::Integer(25),
    ];
    for (column, value) in battery.into_iter().enumerate() {
        data.insert(ups(&[1, 2, column as u32 + 1, 0]), value);
    }

    // upsInput
    data.insert(ups(&[1, 3, 1, 0]), Value::Counter32(0));
    data.insert(ups(&[1, 3, 2, 0]), Value::Integer(INPUT_LINES as i32));
    for line in 1..=INPUT_LINES {
        let row = |column: u32| ups(&[1, 3, 3, 1, column, line]);
        let line = line as i32;
        data.insert(row(1), Value::Integer(line));
        data.insert(row(2), Value::Integer(600));
        data.insert(row(3), Value::Integer(2300 + line));
        data.insert(row(4), Value::Integer(120 + line));
        data.insert(row(5), Value::Integer(2750 + line));
    }

    // upsOutput
    data.insert(ups(&[1, 4, 1, 0]), Value::Integer(3)); // normal
    data.insert(ups(&[1, 4, 2, 0]), Value::Integer(600));
    data.insert(ups(&[1, 4, 3, 0]), Value::Integer(OUTPUT_LINES as i32));
    for line in 1..=OUTPUT_LINES {
        let row = |column: u32| ups(&[1, 4, 4, 1, column, line]);
        let line = line as i32;
        data.insert(row(1), Value::Integer(line));
        data.insert(row(2), Value::Integer(2290 + line));
        data.insert(row(3), Value::Integer(95 + line));
        data.insert(row(4), Value::Integer(2150 + line));
        data.insert(row(5), Value::Integer(30 + line));
    }

    // upsBypass, no lines
    data.insert(ups(&[1, 5, 1, 0]), Value::Integer(600));
    data.insert(ups(&[1, 5, 2, 0]), Value::Integer(0));

    // upsAlarm
    data.insert(ups(&[1, 6, 1, 0]), Value::Gauge32(0));

    // upsTest
    data.insert(
        ups(&[1, 7, 1, 0]),
        Value::ObjectIdentifier(ups(&[1, 7, 7, 1])),
    );
    data.insert(ups(&[1, 7, 2, 0]), Value::Integer(1));
    data.insert(ups(&[1, 7, 3, 0]), Value::Integer(6)); // noTestsInitiated
    data.insert(ups(&[1, 7, 4, 0]), text(""));
    data.insert(ups(&[1, 7, 5, 0]), Value::TimeTicks(0));
    data.insert(ups(&[1, 7, 6, 0]), Value::TimeTicks(0));

    // upsControl
    for (column, value) in [2, -1, -1, 0, 1].into_iter().enumerate() {
        data.insert(ups(&[1, 8, column as u32 + 1, 0]), Value::Integer(value));
    }

    // upsConfig
    for (column, value) in [230, 500, 230, 500, 3000, 2700, 2, 2, 176, 276]
        .into_iter()
        .enumerate()
    {
        data.insert(ups(&[1, 9, column as u32 + 1, 0]), Value::Integer(value));
    }

    data
}

/// Vendor subtree whose leaves only sort correctly numerically.
pub const ORDERING_ROOT: &str = ".1.3.6.1.4.1.534.2";

pub fn ordering_leaves() -> BTreeMap<Oid, Value> {
    [1, 2, 10, 100]
        .into_iter()
        .map(|arc| (oid!(1, 3, 6, 1, 4, 1, 534, 2, arc), Value::Integer(arc as i32)))
        .collect()
}

/// The UPS-MIB fixture plus the ordering leaves.
pub fn combined() -> BTreeMap<Oid, Value> {
    let mut data = ups_mib();
    data.extend(ordering_leaves());
    data
}
