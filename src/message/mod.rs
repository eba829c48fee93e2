//! SNMP message wrappers.
//!
//! Only SNMPv3 messages with USM security are spoken; the UPS agents this
//! crate talks to are always configured for v3.

mod v3;

pub use v3::{
    MsgFlags, MsgGlobalData, ScopedPdu, SecurityLevel, SecurityModel, V3Message, V3MessageData,
};
