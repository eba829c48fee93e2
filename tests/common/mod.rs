//! Shared test infrastructure for ups-snmp.
//!
//! Provides TestAgent (in-process SNMPv3 agent) and the UPS-MIB fixture.

// Not every test file uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod agent;
pub mod fixtures;

pub use agent::{AUTH_PASSWORD, ENGINE_ID, PRIV_PASSWORD, TestAgent, USER, V3User};
pub use fixtures::{DEVICE_COUNT, ORDERING_ROOT, combined, ordering_leaves, ups, ups_mib};

/// A `{"rack", "board"}` enumeration bag.
pub fn location() -> std::collections::BTreeMap<String, String> {
    [("rack", "test_rack"), ("board", "test_board")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
