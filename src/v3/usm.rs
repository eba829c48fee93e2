//! User-based Security Model (USM) parameters (RFC 3414).
//!
//! USM security parameters travel as an OCTET STRING wrapping:
//!
//! ```text
//! UsmSecurityParameters ::= SEQUENCE {
//!     msgAuthoritativeEngineID     OCTET STRING,
//!     msgAuthoritativeEngineBoots  INTEGER (0..2147483647),
//!     msgAuthoritativeEngineTime   INTEGER (0..2147483647),
//!     msgUserName                  OCTET STRING (SIZE(0..32)),
//!     msgAuthenticationParameters  OCTET STRING,
//!     msgPrivacyParameters         OCTET STRING
//! }
//! ```

use bytes::Bytes;

use crate::ber::{Decoder, EncodeBuf, decode_length, tag};
use crate::error::Result;
use crate::error::internal::DecodeErrorKind;

/// USM security parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct UsmSecurityParams {
    pub engine_id: Bytes,
    pub engine_boots: u32,
    /// Seconds since the engine's last boot
    pub engine_time: u32,
    pub username: Bytes,
    /// Truncated HMAC, or empty
    pub auth_params: Bytes,
    /// Salt, or empty
    pub priv_params: Bytes,
}

impl UsmSecurityParams {
    pub fn new(
        engine_id: impl Into<Bytes>,
        engine_boots: u32,
        engine_time: u32,
        username: impl Into<Bytes>,
    ) -> Self {
        Self {
            engine_id: engine_id.into(),
            engine_boots,
            engine_time,
            username: username.into(),
            auth_params: Bytes::new(),
            priv_params: Bytes::new(),
        }
    }

    /// Empty parameters, as sent in a discovery request.
    pub fn empty() -> Self {
        Self::new(Bytes::new(), 0, 0, Bytes::new())
    }

    pub fn with_auth_params(mut self, auth_params: impl Into<Bytes>) -> Self {
        self.auth_params = auth_params.into();
        self
    }

    pub fn with_priv_params(mut self, priv_params: impl Into<Bytes>) -> Self {
        self.priv_params = priv_params.into();
        self
    }

    /// Zeroed authentication parameters of `mac_len` bytes.
    ///
    /// The HMAC is computed over the message with these zeros in place and
    /// then written over them.
    pub fn with_auth_placeholder(mut self, mac_len: usize) -> Self {
        self.auth_params = Bytes::from(vec![0u8; mac_len]);
        self
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            buf.push_octet_string(&self.priv_params);
            buf.push_octet_string(&self.auth_params);
            buf.push_octet_string(&self.username);
            buf.push_unsigned32(tag::universal::INTEGER, self.engine_time);
            buf.push_unsigned32(tag::universal::INTEGER, self.engine_boots);
            buf.push_octet_string(&self.engine_id);
        });
        buf.finish()
    }

    pub fn decode(data: Bytes) -> Result<Self> {
        let mut decoder = Decoder::new(data);
        let mut seq = decoder.read_sequence()?;

        let engine_id = seq.read_octet_string()?;
        let engine_boots = read_engine_value(&mut seq, "msgAuthoritativeEngineBoots")?;
        let engine_time = read_engine_value(&mut seq, "msgAuthoritativeEngineTime")?;
        let username = seq.read_octet_string()?;
        let auth_params = seq.read_octet_string()?;
        let priv_params = seq.read_octet_string()?;

        Ok(Self {
            engine_id,
            engine_boots,
            engine_time,
            username,
            auth_params,
            priv_params,
        })
    }

    /// Locate msgAuthenticationParameters inside an encoded v3 message.
    ///
    /// Returns `(content_offset, content_len)`, or `None` if the message does
    /// not have the expected shape.
    pub fn find_auth_params_offset(encoded_msg: &[u8]) -> Option<(usize, usize)> {
        let mut cur = Cursor {
            data: encoded_msg,
            pos: 0,
        };

        cur.enter(tag::universal::SEQUENCE)?;
        cur.skip()?; // msgVersion
        cur.skip()?; // msgGlobalData
        cur.enter(tag::universal::OCTET_STRING)?;
        cur.enter(tag::universal::SEQUENCE)?;
        for _ in 0..4 {
            // engineID, boots, time, userName
            cur.skip()?;
        }
        let len = cur.enter(tag::universal::OCTET_STRING)?;
        (cur.pos + len <= encoded_msg.len()).then_some((cur.pos, len))
    }
}

fn read_engine_value(seq: &mut Decoder, field: &'static str) -> Result<u32> {
    let value = seq.read_integer()?;
    if value < 0 {
        return Err(seq.malformed(DecodeErrorKind::NegativeEngineValue { field, value }));
    }
    Ok(value as u32)
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    /// Step over a tag and length, leaving `pos` at the content.
    fn enter(&mut self, expected: u8) -> Option<usize> {
        if *self.data.get(self.pos)? != expected {
            return None;
        }
        let (len, consumed) = decode_length(self.data.get(self.pos + 1..)?, self.pos + 1, None).ok()?;
        self.pos += 1 + consumed;
        Some(len)
    }

    fn skip(&mut self) -> Option<()> {
        let tag = *self.data.get(self.pos)?;
        let len = self.enter(tag)?;
        self.pos += len;
        (self.pos <= self.data.len()).then_some(())
    }
}
