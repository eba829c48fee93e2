//! SNMP Protocol Data Units (PDUs).
//!
//! Only the read side of the protocol is modelled: GET and GETBULK requests,
//! their Response, and the Report PDU USM uses for discovery and errors.

use crate::ber::{Decoder, EncodeBuf};
use crate::error::internal::DecodeErrorKind;
use crate::error::{ErrorStatus, Result};
use crate::oid::Oid;
use crate::varbind::{VarBind, decode_varbind_list, encode_varbind_list};

/// PDU type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PduType {
    GetRequest = 0xA0,
    GetNextRequest = 0xA1,
    Response = 0xA2,
    GetBulkRequest = 0xA5,
    Report = 0xA8,
}

impl PduType {
    /// Create from tag byte.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0xA0 => Some(Self::GetRequest),
            0xA1 => Some(Self::GetNextRequest),
            0xA2 => Some(Self::Response),
            0xA5 => Some(Self::GetBulkRequest),
            0xA8 => Some(Self::Report),
            _ => None,
        }
    }

    /// The context-class constructed tag for this PDU.
    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for PduType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GetRequest => write!(f, "GetRequest"),
            Self::GetNextRequest => write!(f, "GetNextRequest"),
            Self::Response => write!(f, "Response"),
            Self::GetBulkRequest => write!(f, "GetBulkRequest"),
            Self::Report => write!(f, "Report"),
        }
    }
}

/// Generic PDU structure for request/response operations.
#[derive(Debug, Clone)]
pub struct Pdu {
    pub pdu_type: PduType,
    /// Request ID for correlating requests and responses
    pub request_id: i32,
    /// Error status; non-repeaters for GETBULK
    pub error_status: i32,
    /// 1-based index of the failing varbind; max-repetitions for GETBULK
    pub error_index: i32,
    pub varbinds: Vec<VarBind>,
}

impl Pdu {
    /// Create a GET request PDU.
    pub fn get_request(request_id: i32, oids: &[Oid]) -> Self {
        Self {
            pdu_type: PduType::GetRequest,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds: oids.iter().map(|oid| VarBind::null(oid.clone())).collect(),
        }
    }

    /// Create a GETBULK request PDU.
    pub fn get_bulk(
        request_id: i32,
        non_repeaters: i32,
        max_repetitions: i32,
        oids: &[Oid],
    ) -> Self {
        Self {
            pdu_type: PduType::GetBulkRequest,
            request_id,
            error_status: non_repeaters,
            error_index: max_repetitions,
            varbinds: oids.iter().map(|oid| VarBind::null(oid.clone())).collect(),
        }
    }

    /// Create a successful Response PDU.
    pub fn response(request_id: i32, varbinds: Vec<VarBind>) -> Self {
        Self {
            pdu_type: PduType::Response,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds,
        }
    }

    /// Create a Report PDU carrying USM counters.
    pub fn report(request_id: i32, varbinds: Vec<VarBind>) -> Self {
        Self {
            pdu_type: PduType::Report,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds,
        }
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_constructed(self.pdu_type.tag(), |buf| {
            encode_varbind_list(buf, &self.varbinds);
            buf.push_integer(self.error_index);
            buf.push_integer(self.error_status);
            buf.push_integer(self.request_id);
        });
    }

    /// Decode from BER.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let tag = decoder.peek_tag().unwrap_or_default();
        let Some(pdu_type) = PduType::from_tag(tag) else {
            return Err(decoder.malformed(DecodeErrorKind::UnknownPduType(tag)));
        };

        let mut pdu = decoder.read_constructed(tag)?;
        let request_id = pdu.read_integer()?;
        let error_status = pdu.read_integer()?;
        let error_index = pdu.read_integer()?;
        let varbinds = decode_varbind_list(&mut pdu)?;

        Ok(Pdu {
            pdu_type,
            request_id,
            error_status,
            error_index,
            varbinds,
        })
    }

    /// Check if this is an error response.
    pub fn is_error(&self) -> bool {
        self.error_status != 0
    }

    /// Get the error status as an enum.
    pub fn error_status_enum(&self) -> ErrorStatus {
        ErrorStatus::from_i32(self.error_status)
    }
}
