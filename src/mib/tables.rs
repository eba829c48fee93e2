//! UPS-MIB (RFC 1628) table declarations.

use crate::enumerator::{ColumnEnumerator, QuantityType};
use crate::oid::Oid;
use crate::table::TableSpec;

use QuantityType::*;

pub const IDENTITY: &str = "UPS-MIB-UPS-Identity-Table";
pub const BATTERY: &str = "UPS-MIB-UPS-Battery-Table";
pub const INPUT_HEADERS: &str = "UPS-MIB-UPS-Input-Headers-Table";
pub const INPUT: &str = "UPS-MIB-UPS-Input-Table";
pub const OUTPUT_HEADERS: &str = "UPS-MIB-UPS-Output-Headers-Table";
pub const OUTPUT: &str = "UPS-MIB-UPS-Output-Table";
pub const BYPASS_HEADERS: &str = "UPS-MIB-UPS-Bypass-Headers-Table";
pub const BYPASS: &str = "UPS-MIB-UPS-Bypass-Table";
pub const ALARMS_HEADERS: &str = "UPS-MIB-UPS-Alarms-Headers-Table";
pub const ALARMS: &str = "UPS-MIB-UPS-Alarms-Table";
pub const WELL_KNOWN_ALARMS: &str = "UPS-MIB-UPS-Well-Known-Alarms-Table";
pub const TEST: &str = "UPS-MIB-UPS-Test-Table";
pub const WELL_KNOWN_TESTS: &str = "UPS-MIB-UPS-Well-Known-Tests-Table";
pub const CONTROL: &str = "UPS-MIB-UPS-Control-Table";
pub const CONFIG: &str = "UPS-MIB-UPS-Config-Table";
pub const COMPLIANCES: &str = "UPS-MIB-UPS-Compliances-Table";
pub const SUBSET_GROUPS: &str = "UPS-MIB-UPS-Subset-Groups-Table";
pub const BASIC_GROUPS: &str = "UPS-MIB-UPS-Basic-Groups-Table";
pub const FULL_GROUPS: &str = "UPS-MIB-UPS-Full-Groups-Table";

/// `upsMIB` = 1.3.6.1.2.1.33
fn ups(arcs: &[u32]) -> Oid {
    crate::oid!(1, 3, 6, 1, 2, 1, 33).join(arcs)
}

/// A table declaration and the quantities its columns carry.
pub(crate) struct Declaration {
    pub spec: TableSpec,
    pub devices: Option<ColumnEnumerator>,
}

impl Declaration {
    fn plain(spec: TableSpec) -> Self {
        Self { spec, devices: None }
    }

    fn with_devices(spec: TableSpec, columns: &[(u32, QuantityType)]) -> Self {
        Self {
            spec,
            devices: Some(ColumnEnumerator::new(columns.iter().copied())),
        }
    }
}

pub(crate) fn identity() -> Declaration {
    Declaration::with_devices(
        TableSpec::flattened(
            IDENTITY,
            ups(&[1, 1]),
            [
                "upsIdentManufacturer",
                "upsIdentModel",
                "upsIdentUPSSoftwareVersion",
                "upsIdentAgentSoftwareVersion",
                "upsIdentName",
                "upsIdentAttachedDevices",
            ],
        ),
        &[
            (1, Identity),
            (2, Identity),
            (3, Identity),
            (4, Identity),
            (5, Identity),
            (6, Identity),
        ],
    )
}

/// Every table after the identity table, in build order.
pub(crate) fn remaining() -> Vec<Declaration> {
    vec![
        Declaration::with_devices(
            TableSpec::flattened(
                BATTERY,
                ups(&[1, 2]),
                [
                    "upsBatteryStatus",
                    "upsSecondsOnBattery",
                    "upsEstimatedMinutesRemaining",
                    "upsEstimatedChargeRemaining",
                    "upsBatteryVoltage",
                    "upsBatteryCurrent",
                    "upsBatteryTemperature",
                ],
            ),
            &[
                (1, Status),
                (2, Status),
                (3, Status),
                (4, Status),
                (5, Voltage),
                (6, Current),
                (7, Temperature),
            ],
        ),
        Declaration::plain(TableSpec::flattened(
            INPUT_HEADERS,
            ups(&[1, 3]),
            ["upsInputLineBads", "upsInputNumLines"],
        )),
        Declaration::with_devices(
            TableSpec::indexed(
                INPUT,
                ups(&[1, 3, 3]),
                [
                    "upsInputLineIndex",
                    "upsInputFrequency",
                    "upsInputVoltage",
                    "upsInputCurrent",
                    "upsInputTruePower",
                ],
                1,
                1,
                2,
            ),
            &[(2, Frequency), (3, Voltage), (4, Current), (5, Power)],
        ),
        Declaration::with_devices(
            TableSpec::flattened(
                OUTPUT_HEADERS,
                ups(&[1, 4]),
                ["upsOutputSource", "upsOutputFrequency", "upsOutputNumLines"],
            ),
            &[(1, Status), (2, Frequency), (3, Status)],
        ),
        Declaration::with_devices(
            TableSpec::indexed(
                OUTPUT,
                ups(&[1, 4, 4]),
                [
                    "upsOutputLineIndex",
                    "upsOutputVoltage",
                    "upsOutputCurrent",
                    "upsOutputPower",
                    "upsOutputPercentLoad",
                ],
                1,
                1,
                2,
            ),
            &[(2, Voltage), (3, Current), (4, Power), (5, Status)],
        ),
        Declaration::plain(TableSpec::flattened(
            BYPASS_HEADERS,
            ups(&[1, 5]),
            ["upsBypassFrequency", "upsBypassNumLines"],
        )),
        Declaration::with_devices(
            TableSpec::indexed(
                BYPASS,
                ups(&[1, 5, 3]),
                [
                    "upsBypassLineIndex",
                    "upsBypassVoltage",
                    "upsBypassCurrent",
                    "upsBypassPower",
                ],
                1,
                1,
                2,
            ),
            &[(2, Voltage), (3, Current), (4, Power)],
        ),
        Declaration::plain(TableSpec::flattened(
            ALARMS_HEADERS,
            ups(&[1, 6]),
            ["upsAlarmsPresent"],
        )),
        Declaration::plain(TableSpec::indexed(
            ALARMS,
            ups(&[1, 6, 2]),
            ["upsAlarmId", "upsAlarmDescr", "upsAlarmTime"],
            1,
            1,
            2,
        )),
        Declaration::plain(TableSpec::flattened(
            WELL_KNOWN_ALARMS,
            ups(&[1, 6, 3]),
            [
                "upsAlarmBatteryBad",
                "upsAlarmOnBattery",
                "upsAlarmLowBattery",
                "upsAlarmDepletedBattery",
                "upsAlarmTempBad",
                "upsAlarmInputBad",
                "upsAlarmOutputBad",
                "upsAlarmOutputOverload",
                "upsAlarmOnBypass",
                "upsAlarmBypassBad",
                "upsAlarmOutputOffAsRequested",
                "upsAlarmUpsOffAsRequested",
                "upsAlarmChargerFailed",
                "upsAlarmUpsOutputOff",
                "upsAlarmUpsSystemOff",
                "upsAlarmFanFailure",
                "upsAlarmFuseFailure",
                "upsAlarmGeneralFault",
                "upsAlarmDiagnosticTestFailed",
                "upsAlarmCommunicationsLost",
                "upsAlarmAwaitingPower",
                "upsAlarmShutdownPending",
                "upsAlarmShutdownImminent",
                "upsAlarmTestInProgress",
            ],
        )),
        Declaration::plain(TableSpec::flattened(
            TEST,
            ups(&[1, 7]),
            [
                "upsTestId",
                "upsTestSpinLock",
                "upsTestResultsSummary",
                "upsTestResultsDetail",
                "upsTestStartTime",
                "upsTestElapsedTime",
            ],
        )),
        Declaration::plain(TableSpec::flattened(
            WELL_KNOWN_TESTS,
            ups(&[1, 7, 7]),
            [
                "upsTestNoTestsInitiated",
                "upsTestAbortTestInProgress",
                "upsTestGeneralSystemsTest",
                "upsTestQuickBatteryTest",
                "upsTestDeepBatteryCalibration",
            ],
        )),
        Declaration::plain(TableSpec::flattened(
            CONTROL,
            ups(&[1, 8]),
            [
                "upsShutdownType",
                "upsShutdownAfterDelay",
                "upsStartupAfterDelay",
                "upsRebootWithDuration",
                "upsAutoRestart",
            ],
        )),
        Declaration::plain(TableSpec::flattened(
            CONFIG,
            ups(&[1, 9]),
            [
                "upsConfigInputVoltage",
                "upsConfigInputFreq",
                "upsConfigOutputVoltage",
                "upsConfigOutputFreq",
                "upsConfigOutputVA",
                "upsConfigOutputPower",
                "upsConfigLowBattTime",
                "upsConfigAudibleStatus",
                "upsConfigLowVoltageTransferPoint",
                "upsConfigHighVoltageTransferPoint",
            ],
        )),
        Declaration::plain(TableSpec::flattened(
            COMPLIANCES,
            ups(&[3, 1]),
            [
                "upsSubsetCompliance",
                "upsBasicCompliance",
                "upsFullCompliance",
            ],
        )),
        Declaration::plain(TableSpec::flattened(
            SUBSET_GROUPS,
            ups(&[3, 2, 1]),
            [
                "upsSubsetIdentGroup",
                "upsSubsetBatteryGroup",
                "upsSubsetInputGroup",
                "upsSubsetOutputGroup",
                "upsSubsetAlarmGroup",
                "upsSubsetControlGroup",
                "upsSubsetConfigGroup",
            ],
        )),
        Declaration::plain(TableSpec::flattened(
            BASIC_GROUPS,
            ups(&[3, 2, 2]),
            [
                "upsBasicIdentGroup",
                "upsBasicBatteryGroup",
                "upsBasicInputGroup",
                "upsBasicOutputGroup",
                "upsBasicBypassGroup",
                "upsBasicAlarmGroup",
                "upsBasicTestGroup",
                "upsBasicControlGroup",
                "upsBasicConfigGroup",
            ],
        )),
        Declaration::plain(TableSpec::flattened(
            FULL_GROUPS,
            ups(&[3, 2, 3]),
            [
                "upsFullIdentGroup",
                "upsFullBatteryGroup",
                "upsFullInputGroup",
                "upsFullOutputGroup",
                "upsFullBypassGroup",
                "upsFullAlarmGroup",
                "upsFullTestGroup",
                "upsFullControlGroup",
                "upsFullConfigGroup",
            ],
        )),
    ]
}
