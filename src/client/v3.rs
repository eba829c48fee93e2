//! SNMPv3 session handling: engine discovery, key localization, message
//! protection and Report processing.

use crate::ber::Decoder;
use crate::error::internal::{AuthErrorKind, DecodeErrorKind};
use crate::error::{Error, ErrorStatus, Result};
use crate::message::{MsgFlags, MsgGlobalData, ScopedPdu, SecurityLevel, V3Message, V3MessageData};
use crate::pdu::{Pdu, PduType};
use crate::transport::Transport;
use crate::util::HexBytes;
use crate::v3::{
    DEFAULT_MSG_MAX_SIZE, EngineState, LocalizedKey, PrivKey, UsmSecurityParams,
    auth::{authenticate_message, verify_message},
    is_decryption_error_report, is_not_in_time_window_report, is_unknown_engine_id_report,
    is_unknown_user_name_report, is_unsupported_sec_level_report, is_wrong_digest_report,
    parse_discovery_response,
};
use bytes::Bytes;
use std::time::Instant;
use tracing::{Span, instrument};

use super::{Client, SessionState};

/// Outcome of processing one authenticated exchange.
enum Exchange {
    Response(Pdu),
    /// The agent reported notInTimeWindow; the clock has been resynced
    Resynced,
}

impl<T: Transport> Client<T> {
    fn auth_error(&self, kind: AuthErrorKind) -> Box<Error> {
        tracing::debug!(target: "ups_snmp::client", { snmp.target = %self.peer_addr(), kind = %kind }, "authentication failed");
        Error::Auth {
            target: self.peer_addr(),
        }
        .boxed()
    }

    fn malformed(&self, kind: DecodeErrorKind) -> Box<Error> {
        tracing::debug!(target: "ups_snmp::client", { snmp.target = %self.peer_addr(), kind = %kind }, "malformed response");
        Error::MalformedResponse {
            target: self.peer_addr(),
        }
        .boxed()
    }

    /// Discover the agent's engine and localize keys, once per session.
    #[instrument(level = "debug", skip(self), fields(snmp.target = %self.peer_addr()))]
    pub(super) async fn ensure_engine_discovered(&self) -> Result<()> {
        if self.session().is_some() {
            return Ok(());
        }

        tracing::debug!(target: "ups_snmp::client", "performing engine discovery");
        let msg_id = self.next_request_id();
        let request = V3Message::discovery_request(msg_id).encode();

        self.inner.transport.send(&request).await?;
        let (data, _source) = self.inner.transport.recv(self.inner.config.timeout()).await?;

        let response = V3Message::decode_from(data, self.peer_addr())?;
        if response.msg_id() != msg_id {
            return Err(self.malformed(DecodeErrorKind::ResponseIdMismatch {
                expected: msg_id,
                actual: response.msg_id(),
            }));
        }

        let engine = parse_discovery_response(&response.security_params)
            .map_err(|e| self.retarget(e))?;
        tracing::debug!(
            target: "ups_snmp::client",
            { snmp.engine_id = %HexBytes(&engine.engine_id), snmp.engine_boots = engine.engine_boots, snmp.engine_time = engine.engine_time },
            "discovered engine"
        );

        let security = self.inner.config.security();
        let auth_key = LocalizedKey::from_password(
            security.auth_protocol(),
            security.auth_passphrase().as_bytes(),
            &engine.engine_id,
        );
        let priv_key = PrivKey::from_password(
            security.auth_protocol(),
            security.priv_protocol(),
            security.priv_passphrase().as_bytes(),
            &engine.engine_id,
        );
        tracing::trace!(target: "ups_snmp::client", "key localization complete");

        *self.session() = Some(SessionState {
            engine,
            auth_key,
            priv_key,
        });
        Ok(())
    }

    /// Encode an authPriv request: encrypt the scoped PDU, then sign the
    /// whole message in place.
    pub(super) fn build_v3_message(&self, pdu: &Pdu) -> Result<Bytes> {
        let guard = self.session();
        let Some(session) = guard.as_ref() else {
            // ensure_engine_discovered always runs first
            return Err(self.auth_error(AuthErrorKind::NotAuthenticated));
        };

        let engine_id = session.engine.engine_id.clone();
        let engine_boots = session.engine.engine_boots;
        let engine_time = session.engine.estimated_time();

        let scoped_pdu = ScopedPdu::new(
            engine_id.clone(),
            Bytes::copy_from_slice(self.inner.config.context_name().as_bytes()),
            pdu.clone(),
        );
        let (ciphertext, salt) = session
            .priv_key
            .encrypt(
                &scoped_pdu.encode_to_bytes(),
                engine_boots,
                engine_time,
                &self.inner.salt_counter,
            )
            .map_err(|e| self.retarget(e))?;

        let usm_params = UsmSecurityParams::new(
            engine_id,
            engine_boots,
            engine_time,
            Bytes::copy_from_slice(self.inner.config.security().user_name().as_bytes()),
        )
        .with_auth_placeholder(session.auth_key.mac_len())
        .with_priv_params(salt);

        let global_data = MsgGlobalData::new(
            pdu.request_id,
            DEFAULT_MSG_MAX_SIZE as i32,
            MsgFlags::new(SecurityLevel::AuthPriv, true),
        );

        let mut encoded =
            V3Message::new_encrypted(global_data, usm_params.encode(), ciphertext)
                .encode()
                .to_vec();

        let (offset, len) = UsmSecurityParams::find_auth_params_offset(&encoded)
            .ok_or_else(|| self.auth_error(AuthErrorKind::AuthParamsNotFound))?;
        authenticate_message(&session.auth_key, &mut encoded, offset, len);

        Ok(Bytes::from(encoded))
    }

    /// Send an authPriv request and wait for its response.
    ///
    /// A notInTimeWindow Report resynchronizes the engine clock and the
    /// request is sent once more. Other Reports map to errors.
    #[instrument(
        level = "debug",
        skip(self, pdu),
        fields(
            snmp.target = %self.peer_addr(),
            snmp.request_id = pdu.request_id,
            snmp.elapsed_ms = tracing::field::Empty,
        )
    )]
    pub(super) async fn send_v3_and_recv(&self, pdu: Pdu) -> Result<Pdu> {
        let start = Instant::now();
        self.ensure_engine_discovered().await?;

        let mut resynced = false;
        let result = loop {
            let data = self.build_v3_message(&pdu)?;
            tracing::debug!(
                target: "ups_snmp::client",
                { snmp.pdu_type = ?pdu.pdu_type, snmp.varbind_count = pdu.varbinds.len(), snmp.bytes = data.len() },
                "sending V3 {} request",
                pdu.pdu_type
            );

            self.inner.transport.send(&data).await?;
            let (response, _source) =
                match self.inner.transport.recv(self.inner.config.timeout()).await {
                    Ok(received) => received,
                    Err(e) => break Err(e),
                };

            match self.process_v3_response(response, pdu.request_id) {
                Ok(Exchange::Response(response_pdu)) => break Ok(response_pdu),
                Ok(Exchange::Resynced) if !resynced => {
                    tracing::debug!(target: "ups_snmp::client", "not in time window, resending after resync");
                    resynced = true;
                }
                Ok(Exchange::Resynced) => {
                    break Err(Error::NotInTimeWindow {
                        target: self.peer_addr(),
                    }
                    .boxed());
                }
                Err(e) => break Err(e),
            }
        };

        Span::current().record("snmp.elapsed_ms", start.elapsed().as_millis() as u64);
        result
    }

    fn process_v3_response(&self, data: Bytes, request_id: i32) -> Result<Exchange> {
        let response = V3Message::decode_from(data.clone(), self.peer_addr())?;
        if response.msg_id() != request_id {
            return Err(self.malformed(DecodeErrorKind::ResponseIdMismatch {
                expected: request_id,
                actual: response.msg_id(),
            }));
        }

        let usm_params = UsmSecurityParams::decode(response.security_params.clone())
            .map_err(|e| self.retarget(e))?;
        let level = response.security_level();

        let mut guard = self.session();
        let Some(session) = guard.as_mut() else {
            return Err(self.auth_error(AuthErrorKind::NotAuthenticated));
        };

        if level.requires_auth() {
            let (offset, len) = UsmSecurityParams::find_auth_params_offset(&data)
                .ok_or_else(|| self.auth_error(AuthErrorKind::AuthParamsNotFound))?;
            let expected = session.auth_key.mac_len();
            if len != expected {
                return Err(self.auth_error(AuthErrorKind::WrongMacLength {
                    expected,
                    actual: len,
                }));
            }
            if !verify_message(&session.auth_key, &data, offset, len) {
                return Err(self.auth_error(AuthErrorKind::HmacMismatch));
            }
            tracing::trace!(target: "ups_snmp::client", "HMAC verification successful");
        }

        let scoped_pdu = match response.data {
            V3MessageData::Plaintext(scoped_pdu) => scoped_pdu,
            V3MessageData::Encrypted(ciphertext) => {
                let plaintext = session
                    .priv_key
                    .decrypt(
                        &ciphertext,
                        usm_params.engine_boots,
                        usm_params.engine_time,
                        &usm_params.priv_params,
                    )
                    .map_err(|e| self.retarget(e))?;
                ScopedPdu::decode(&mut Decoder::with_target(plaintext, self.peer_addr()))?
            }
        };
        let pdu = scoped_pdu.pdu;

        if pdu.pdu_type == PduType::Report {
            return self.handle_report(&pdu, &usm_params, level, &mut session.engine);
        }

        // Only Reports may arrive with less protection than the request.
        if level != SecurityLevel::AuthPriv {
            return Err(self.auth_error(AuthErrorKind::NotAuthenticated));
        }

        if pdu.request_id != request_id {
            return Err(self.malformed(DecodeErrorKind::ResponseIdMismatch {
                expected: request_id,
                actual: pdu.request_id,
            }));
        }

        tracing::debug!(
            target: "ups_snmp::client",
            {
                snmp.pdu_type = ?pdu.pdu_type,
                snmp.varbind_count = pdu.varbinds.len(),
                snmp.error_status = pdu.error_status,
                snmp.error_index = pdu.error_index
            },
            "received V3 {} response",
            pdu.pdu_type
        );

        session
            .engine
            .update_time(usm_params.engine_boots, usm_params.engine_time);

        if pdu.is_error() {
            // error_index is 1-based; 0 means the error applies to the whole PDU
            let oid = (pdu.error_index as usize)
                .checked_sub(1)
                .and_then(|idx| pdu.varbinds.get(idx))
                .map(|vb| vb.oid.clone());
            return Err(Error::Snmp {
                target: self.peer_addr(),
                status: pdu.error_status_enum(),
                index: pdu.error_index.max(0) as u32,
                oid,
            }
            .boxed());
        }

        Ok(Exchange::Response(pdu))
    }

    fn handle_report(
        &self,
        pdu: &Pdu,
        usm_params: &UsmSecurityParams,
        level: SecurityLevel,
        engine: &mut EngineState,
    ) -> Result<Exchange> {
        if is_not_in_time_window_report(pdu) {
            if level.requires_auth() {
                // Authenticated report: the agent's clock is authoritative.
                *engine = EngineState::new(
                    engine.engine_id.clone(),
                    usm_params.engine_boots,
                    usm_params.engine_time,
                );
            } else {
                engine.update_time(usm_params.engine_boots, usm_params.engine_time);
            }
            return Ok(Exchange::Resynced);
        }

        if is_unknown_engine_id_report(pdu) {
            return Err(Error::UnknownEngineId {
                target: self.peer_addr(),
            }
            .boxed());
        }

        if is_wrong_digest_report(pdu) {
            return Err(self.auth_error(AuthErrorKind::RejectedByAgent("usmStatsWrongDigests")));
        }

        if is_unknown_user_name_report(pdu) {
            return Err(
                self.auth_error(AuthErrorKind::RejectedByAgent("usmStatsUnknownUserNames"))
            );
        }

        if is_unsupported_sec_level_report(pdu) {
            return Err(self.auth_error(AuthErrorKind::RejectedByAgent(
                "usmStatsUnsupportedSecLevels",
            )));
        }

        if is_decryption_error_report(pdu) {
            tracing::debug!(target: "ups_snmp::client", { snmp.target = %self.peer_addr() }, "agent reported usmStatsDecryptionErrors");
            return Err(Error::Crypto {
                target: self.peer_addr(),
            }
            .boxed());
        }

        tracing::debug!(
            target: "ups_snmp::client",
            { snmp.target = %self.peer_addr(), snmp.oid = ?pdu.varbinds.first().map(|vb| &vb.oid) },
            "unexpected report"
        );
        Err(Error::Snmp {
            target: self.peer_addr(),
            status: ErrorStatus::GenErr,
            index: 0,
            oid: pdu.varbinds.first().map(|vb| vb.oid.clone()),
        }
        .boxed())
    }
}
