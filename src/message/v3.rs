//! SNMPv3 message format (RFC 3412).
//!
//! ```text
//! SEQUENCE {
//!     INTEGER version (3)
//!     SEQUENCE msgGlobalData {
//!         INTEGER msgID
//!         INTEGER msgMaxSize
//!         OCTET STRING msgFlags (1 byte)
//!         INTEGER msgSecurityModel
//!     }
//!     OCTET STRING msgSecurityParameters (USM-encoded)
//!     msgData (ScopedPDU, or encrypted OCTET STRING for authPriv)
//! }
//! ```

use bytes::Bytes;

use crate::ber::{Decoder, EncodeBuf};
use crate::error::Result;
use crate::error::internal::DecodeErrorKind;
use crate::pdu::Pdu;
use crate::v3::{DEFAULT_MSG_MAX_SIZE, UsmSecurityParams};

/// SNMPv3 security model identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum SecurityModel {
    /// User-based Security Model (RFC 3414)
    Usm = 3,
}

impl SecurityModel {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            3 => Some(Self::Usm),
            _ => None,
        }
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// SNMPv3 security level, ordered from least to most secure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SecurityLevel {
    NoAuthNoPriv,
    AuthNoPriv,
    AuthPriv,
}

impl SecurityLevel {
    /// Decode from the msgFlags byte. Privacy without authentication is invalid.
    pub fn from_flags(flags: u8) -> Option<Self> {
        match (flags & 0x01 != 0, flags & 0x02 != 0) {
            (false, false) => Some(Self::NoAuthNoPriv),
            (true, false) => Some(Self::AuthNoPriv),
            (true, true) => Some(Self::AuthPriv),
            (false, true) => None,
        }
    }

    /// Encode to msgFlags bits (without the reportable flag).
    pub fn to_flags(self) -> u8 {
        match self {
            Self::NoAuthNoPriv => 0x00,
            Self::AuthNoPriv => 0x01,
            Self::AuthPriv => 0x03,
        }
    }

    pub fn requires_auth(self) -> bool {
        matches!(self, Self::AuthNoPriv | Self::AuthPriv)
    }

    pub fn requires_priv(self) -> bool {
        matches!(self, Self::AuthPriv)
    }
}

/// Message flags (RFC 3412 Section 6.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsgFlags {
    pub security_level: SecurityLevel,
    /// Whether the receiver may answer with a Report PDU
    pub reportable: bool,
}

impl MsgFlags {
    pub fn new(security_level: SecurityLevel, reportable: bool) -> Self {
        Self {
            security_level,
            reportable,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(Self {
            security_level: SecurityLevel::from_flags(byte)?,
            reportable: byte & 0x04 != 0,
        })
    }

    pub fn to_byte(self) -> u8 {
        let mut flags = self.security_level.to_flags();
        if self.reportable {
            flags |= 0x04;
        }
        flags
    }
}

/// Message header (msgGlobalData).
#[derive(Debug, Clone)]
pub struct MsgGlobalData {
    /// Correlates a request with its response
    pub msg_id: i32,
    /// Largest message the sender can accept
    pub msg_max_size: i32,
    pub msg_flags: MsgFlags,
    pub msg_security_model: SecurityModel,
}

impl MsgGlobalData {
    pub fn new(msg_id: i32, msg_max_size: i32, msg_flags: MsgFlags) -> Self {
        Self {
            msg_id,
            msg_max_size,
            msg_flags,
            msg_security_model: SecurityModel::Usm,
        }
    }

    pub fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_sequence(|buf| {
            buf.push_integer(self.msg_security_model.as_i32());
            buf.push_octet_string(&[self.msg_flags.to_byte()]);
            buf.push_integer(self.msg_max_size);
            buf.push_integer(self.msg_id);
        });
    }

    /// Decode and validate the header.
    ///
    /// Rejects a negative msgID, a msgMaxSize below 484, a msgFlags octet
    /// string that is not exactly one byte, and any security model but USM.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        const MSG_MAX_SIZE_MINIMUM: i32 = 484;

        let mut seq = decoder.read_sequence()?;

        let msg_id = seq.read_integer()?;
        if msg_id < 0 {
            return Err(seq.malformed(DecodeErrorKind::InvalidMsgId(msg_id)));
        }

        let msg_max_size = seq.read_integer()?;
        if msg_max_size < MSG_MAX_SIZE_MINIMUM {
            return Err(seq.malformed(DecodeErrorKind::MsgMaxSizeOutOfRange(msg_max_size)));
        }

        let flags_bytes = seq.read_octet_string()?;
        let msg_flags = match flags_bytes.as_ref() {
            [byte] => MsgFlags::from_byte(*byte),
            _ => None,
        }
        .ok_or_else(|| seq.malformed(DecodeErrorKind::InvalidMsgFlags))?;

        let model = seq.read_integer()?;
        let msg_security_model = SecurityModel::from_i32(model)
            .ok_or_else(|| seq.malformed(DecodeErrorKind::UnknownSecurityModel(model)))?;

        Ok(Self {
            msg_id,
            msg_max_size,
            msg_flags,
            msg_security_model,
        })
    }
}

/// Scoped PDU (contextEngineID + contextName + PDU).
#[derive(Debug, Clone)]
pub struct ScopedPdu {
    pub context_engine_id: Bytes,
    pub context_name: Bytes,
    pub pdu: Pdu,
}

impl ScopedPdu {
    pub fn new(
        context_engine_id: impl Into<Bytes>,
        context_name: impl Into<Bytes>,
        pdu: Pdu,
    ) -> Self {
        Self {
            context_engine_id: context_engine_id.into(),
            context_name: context_name.into(),
            pdu,
        }
    }

    pub fn with_empty_context(pdu: Pdu) -> Self {
        Self::new(Bytes::new(), Bytes::new(), pdu)
    }

    pub fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_sequence(|buf| {
            self.pdu.encode(buf);
            buf.push_octet_string(&self.context_name);
            buf.push_octet_string(&self.context_engine_id);
        });
    }

    pub fn encode_to_bytes(&self) -> Bytes {
        let mut buf = EncodeBuf::new();
        self.encode(&mut buf);
        buf.finish()
    }

    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let mut seq = decoder.read_sequence()?;

        let context_engine_id = seq.read_octet_string()?;
        let context_name = seq.read_octet_string()?;
        let pdu = Pdu::decode(&mut seq)?;

        Ok(Self {
            context_engine_id,
            context_name,
            pdu,
        })
    }
}

/// SNMPv3 message.
#[derive(Debug, Clone)]
pub struct V3Message {
    pub global_data: MsgGlobalData,
    /// USM-encoded security parameters
    pub security_params: Bytes,
    pub data: V3MessageData,
}

/// Message payload.
#[derive(Debug, Clone)]
pub enum V3MessageData {
    /// noAuthNoPriv or authNoPriv
    Plaintext(ScopedPdu),
    /// authPriv ciphertext
    Encrypted(Bytes),
}

impl V3Message {
    pub fn new(global_data: MsgGlobalData, security_params: Bytes, scoped_pdu: ScopedPdu) -> Self {
        Self {
            global_data,
            security_params,
            data: V3MessageData::Plaintext(scoped_pdu),
        }
    }

    pub fn new_encrypted(
        global_data: MsgGlobalData,
        security_params: Bytes,
        encrypted: Bytes,
    ) -> Self {
        Self {
            global_data,
            security_params,
            data: V3MessageData::Encrypted(encrypted),
        }
    }

    /// The scoped PDU, if the payload is plaintext.
    pub fn scoped_pdu(&self) -> Option<&ScopedPdu> {
        match &self.data {
            V3MessageData::Plaintext(pdu) => Some(pdu),
            V3MessageData::Encrypted(_) => None,
        }
    }

    pub fn pdu(&self) -> Option<&Pdu> {
        self.scoped_pdu().map(|s| &s.pdu)
    }

    pub fn msg_id(&self) -> i32 {
        self.global_data.msg_id
    }

    pub fn security_level(&self) -> SecurityLevel {
        self.global_data.msg_flags.security_level
    }

    /// Encode to BER.
    ///
    /// Authenticated messages are encoded with zeroed auth params first; the
    /// caller then computes the HMAC and writes it in place.
    pub fn encode(&self) -> Bytes {
        let mut buf = EncodeBuf::new();

        buf.push_sequence(|buf| {
            match &self.data {
                V3MessageData::Plaintext(scoped_pdu) => scoped_pdu.encode(buf),
                V3MessageData::Encrypted(ciphertext) => buf.push_octet_string(ciphertext),
            }
            buf.push_octet_string(&self.security_params);
            self.global_data.encode(buf);
            buf.push_integer(3);
        });

        buf.finish()
    }

    /// Decode from BER.
    ///
    /// Encrypted payloads come back as [`V3MessageData::Encrypted`]; the
    /// caller decrypts them with the session's privacy key.
    pub fn decode(data: Bytes) -> Result<Self> {
        Self::decode_with(Decoder::new(data))
    }

    /// Like [`decode`](Self::decode), tagging failures with the peer address.
    pub fn decode_from(data: Bytes, target: std::net::SocketAddr) -> Result<Self> {
        Self::decode_with(Decoder::with_target(data, target))
    }

    fn decode_with(mut decoder: Decoder) -> Result<Self> {
        let mut seq = decoder.read_sequence()?;

        let version = seq.read_integer()?;
        if version != 3 {
            return Err(seq.malformed(DecodeErrorKind::UnknownVersion(version)));
        }

        let global_data = MsgGlobalData::decode(&mut seq)?;
        let security_params = seq.read_octet_string()?;

        let data = if global_data.msg_flags.security_level.requires_priv() {
            V3MessageData::Encrypted(seq.read_octet_string()?)
        } else {
            V3MessageData::Plaintext(ScopedPdu::decode(&mut seq)?)
        };

        Ok(Self {
            global_data,
            security_params,
            data,
        })
    }

    /// Engine discovery request: noAuthNoPriv, reportable, empty USM
    /// parameters and an empty GET.
    pub fn discovery_request(msg_id: i32) -> Self {
        let global_data = MsgGlobalData::new(
            msg_id,
            DEFAULT_MSG_MAX_SIZE as i32,
            MsgFlags::new(SecurityLevel::NoAuthNoPriv, true),
        );
        let security_params = UsmSecurityParams::empty().encode();
        let scoped_pdu = ScopedPdu::with_empty_context(Pdu::get_request(0, &[]));

        Self::new(global_data, security_params, scoped_pdu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    fn encoded_global_data(msg_id: i32, max_size: i32, flags: &[u8], model: i32) -> Bytes {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            buf.push_integer(model);
            buf.push_octet_string(flags);
            buf.push_integer(max_size);
            buf.push_integer(msg_id);
        });
        buf.finish()
    }

    #[test]
    fn test_security_level_flags() {
        assert_eq!(SecurityLevel::AuthPriv.to_flags(), 0x03);
        assert_eq!(SecurityLevel::from_flags(0x01), Some(SecurityLevel::AuthNoPriv));
        assert_eq!(SecurityLevel::from_flags(0x02), None);
        assert!(SecurityLevel::AuthPriv > SecurityLevel::AuthNoPriv);
    }

    #[test]
    fn test_msg_flags_byte() {
        let flags = MsgFlags::new(SecurityLevel::AuthPriv, true);
        assert_eq!(flags.to_byte(), 0x07);
        assert_eq!(MsgFlags::from_byte(0x07), Some(flags));
        assert_eq!(MsgFlags::from_byte(0x06), None);
    }

    #[test]
    fn test_msg_global_data_validation() {
        let ok = encoded_global_data(0, 484, &[0x03], 3);
        let decoded = MsgGlobalData::decode(&mut Decoder::new(ok)).unwrap();
        assert_eq!(decoded.msg_flags.security_level, SecurityLevel::AuthPriv);
        assert_eq!(decoded.msg_security_model, SecurityModel::Usm);

        for bad in [
            encoded_global_data(-1, 65507, &[0x03], 3),
            encoded_global_data(1, 483, &[0x03], 3),
            encoded_global_data(1, 65507, &[0x03, 0x00], 3),
            encoded_global_data(1, 65507, &[0x03], 2),
        ] {
            assert!(MsgGlobalData::decode(&mut Decoder::new(bad)).is_err());
        }
    }

    #[test]
    fn test_plaintext_message() {
        let pdu = Pdu::get_request(42, &[oid!(1, 3, 6, 1, 2, 1, 33, 1, 1, 1, 0)]);
        let msg = V3Message::new(
            MsgGlobalData::new(7, 65507, MsgFlags::new(SecurityLevel::AuthNoPriv, true)),
            UsmSecurityParams::empty().encode(),
            ScopedPdu::new(&b"engine"[..], &b"ups"[..], pdu),
        );

        let decoded = V3Message::decode(msg.encode()).unwrap();
        assert_eq!(decoded.msg_id(), 7);
        let scoped = decoded.scoped_pdu().unwrap();
        assert_eq!(&scoped.context_name[..], b"ups");
        assert_eq!(scoped.pdu.request_id, 42);
    }

    #[test]
    fn test_encrypted_message_keeps_ciphertext() {
        let msg = V3Message::new_encrypted(
            MsgGlobalData::new(8, 65507, MsgFlags::new(SecurityLevel::AuthPriv, true)),
            UsmSecurityParams::empty().encode(),
            Bytes::from_static(&[0xDE, 0xAD, 0xBE, 0xEF]),
        );
        let decoded = V3Message::decode(msg.encode()).unwrap();
        assert!(decoded.pdu().is_none());
        assert!(matches!(decoded.data, V3MessageData::Encrypted(ref c) if &c[..] == [0xDE, 0xAD, 0xBE, 0xEF]));
    }

    #[test]
    fn test_rejects_other_versions() {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            buf.push_octet_string(b"public");
            buf.push_integer(1);
        });
        assert!(V3Message::decode(buf.finish()).is_err());
    }

    #[test]
    fn test_discovery_request_shape() {
        let msg = V3Message::discovery_request(5);
        assert_eq!(msg.security_level(), SecurityLevel::NoAuthNoPriv);
        assert!(msg.global_data.msg_flags.reportable);
        let usm = UsmSecurityParams::decode(msg.security_params.clone()).unwrap();
        assert!(usm.engine_id.is_empty());
        assert!(msg.pdu().unwrap().varbinds.is_empty());
    }
}
