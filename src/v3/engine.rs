//! Engine discovery and time synchronization (RFC 3414 Section 4).
//!
//! Before an authenticated request can be sent the client must learn the
//! agent's engine ID, boots counter and engine time:
//!
//! 1. Client sends a discovery request (noAuthNoPriv, empty engine ID)
//! 2. Agent answers with a Report carrying usmStatsUnknownEngineIDs
//! 3. The Report's USM parameters hold engine ID, boots and time
//!
//! Afterwards the client tracks the agent clock locally and resynchronizes
//! from every authenticated response (RFC 3414 Section 2.3).

use std::time::Instant;

use bytes::Bytes;

use crate::error::{Error, Result, UNKNOWN_TARGET};
use crate::pdu::{Pdu, PduType};
use crate::v3::UsmSecurityParams;

/// Time window in seconds (RFC 3414 Section 2.2.3).
pub const TIME_WINDOW: u32 = 150;

/// Maximum snmpEngineTime value (RFC 3414 Section 2.2.1).
pub const MAX_ENGINE_TIME: u32 = 2147483647;

/// msgMaxSize advertised over UDP (65535 - 20 IPv4 - 8 UDP).
pub const DEFAULT_MSG_MAX_SIZE: u32 = 65507;

/// USM statistics OIDs used in Report PDUs.
pub mod report_oids {
    use crate::oid;
    use crate::oid::Oid;

    /// usmStatsUnsupportedSecLevels.0
    pub fn unsupported_sec_levels() -> Oid {
        oid!(1, 3, 6, 1, 6, 3, 15, 1, 1, 1, 0)
    }

    /// usmStatsNotInTimeWindows.0
    pub fn not_in_time_windows() -> Oid {
        oid!(1, 3, 6, 1, 6, 3, 15, 1, 1, 2, 0)
    }

    /// usmStatsUnknownUserNames.0
    pub fn unknown_user_names() -> Oid {
        oid!(1, 3, 6, 1, 6, 3, 15, 1, 1, 3, 0)
    }

    /// usmStatsUnknownEngineIDs.0
    pub fn unknown_engine_ids() -> Oid {
        oid!(1, 3, 6, 1, 6, 3, 15, 1, 1, 4, 0)
    }

    /// usmStatsWrongDigests.0
    pub fn wrong_digests() -> Oid {
        oid!(1, 3, 6, 1, 6, 3, 15, 1, 1, 5, 0)
    }

    /// usmStatsDecryptionErrors.0
    pub fn decryption_errors() -> Oid {
        oid!(1, 3, 6, 1, 6, 3, 15, 1, 1, 6, 0)
    }
}

/// Discovered engine state.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub engine_id: Bytes,
    pub engine_boots: u32,
    /// Engine time at last sync
    pub engine_time: u32,
    /// Local instant `engine_time` was received
    pub synced_at: Instant,
    /// Highest engine time seen in this boot cycle (anti-replay)
    pub latest_received_engine_time: u32,
}

impl EngineState {
    pub fn new(engine_id: Bytes, engine_boots: u32, engine_time: u32) -> Self {
        Self {
            engine_id,
            engine_boots,
            engine_time,
            synced_at: Instant::now(),
            latest_received_engine_time: engine_time,
        }
    }

    /// Synced engine time plus local elapsed time, capped at [`MAX_ENGINE_TIME`].
    pub fn estimated_time(&self) -> u32 {
        let elapsed = self.synced_at.elapsed().as_secs() as u32;
        self.engine_time
            .saturating_add(elapsed)
            .min(MAX_ENGINE_TIME)
    }

    /// Resynchronize from a response.
    ///
    /// RFC 3414 Section 3.2 Step 7b: accept a newer boot cycle, or a later
    /// time within the current one. Returns whether anything changed.
    pub fn update_time(&mut self, response_boots: u32, response_time: u32) -> bool {
        let newer = response_boots > self.engine_boots
            || (response_boots == self.engine_boots
                && response_time > self.latest_received_engine_time);
        if newer {
            self.engine_boots = response_boots;
            self.engine_time = response_time;
            self.synced_at = Instant::now();
            self.latest_received_engine_time = response_time;
        }
        newer
    }

    /// Whether a message's boots/time fall inside the 150 second window.
    pub fn is_in_time_window(&self, msg_boots: u32, msg_time: u32) -> bool {
        if self.engine_boots == MAX_ENGINE_TIME || msg_boots != self.engine_boots {
            return false;
        }
        msg_time.abs_diff(self.estimated_time()) <= TIME_WINDOW
    }
}

/// Engine state from the USM parameters of a discovery response.
pub fn parse_discovery_response(security_params: &Bytes) -> Result<EngineState> {
    let usm = UsmSecurityParams::decode(security_params.clone())?;

    if usm.engine_id.is_empty() {
        tracing::debug!(target: "ups_snmp::v3", "discovery response contained empty engine ID");
        return Err(Error::MalformedResponse {
            target: UNKNOWN_TARGET,
        }
        .boxed());
    }

    Ok(EngineState::new(
        usm.engine_id,
        usm.engine_boots,
        usm.engine_time,
    ))
}

fn is_report_for(pdu: &Pdu, counter: crate::oid::Oid) -> bool {
    pdu.pdu_type == PduType::Report && pdu.varbinds.iter().any(|vb| vb.oid == counter)
}

/// Report carrying usmStatsUnknownEngineIDs.
pub fn is_unknown_engine_id_report(pdu: &Pdu) -> bool {
    is_report_for(pdu, report_oids::unknown_engine_ids())
}

/// Report carrying usmStatsNotInTimeWindows.
pub fn is_not_in_time_window_report(pdu: &Pdu) -> bool {
    is_report_for(pdu, report_oids::not_in_time_windows())
}

/// Report carrying usmStatsWrongDigests.
pub fn is_wrong_digest_report(pdu: &Pdu) -> bool {
    is_report_for(pdu, report_oids::wrong_digests())
}

/// Report carrying usmStatsUnknownUserNames.
pub fn is_unknown_user_name_report(pdu: &Pdu) -> bool {
    is_report_for(pdu, report_oids::unknown_user_names())
}

/// Report carrying usmStatsUnsupportedSecLevels.
pub fn is_unsupported_sec_level_report(pdu: &Pdu) -> bool {
    is_report_for(pdu, report_oids::unsupported_sec_levels())
}

/// Report carrying usmStatsDecryptionErrors.
pub fn is_decryption_error_report(pdu: &Pdu) -> bool {
    is_report_for(pdu, report_oids::decryption_errors())
}
