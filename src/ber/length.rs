//! BER length encoding and decoding.
//!
//! Short form for lengths up to 127, long form with up to four length octets
//! otherwise. Indefinite lengths never appear in SNMP and are rejected.

use std::net::SocketAddr;

use crate::error::internal::DecodeErrorKind;
use crate::error::{Error, Result, UNKNOWN_TARGET};

/// Largest content length accepted while decoding.
pub const MAX_LENGTH: usize = 0x200000;

/// Encode a length, returning the bytes in reverse order for prepending.
pub fn encode_length(len: usize) -> ([u8; 5], usize) {
    let mut buf = [0u8; 5];

    if len <= 127 {
        buf[0] = len as u8;
        return (buf, 1);
    }

    let mut n = 0;
    let mut rest = len;
    while rest > 0 {
        buf[n] = rest as u8;
        rest >>= 8;
        n += 1;
    }
    buf[n] = 0x80 | n as u8;
    (buf, n + 1)
}

fn malformed(offset: usize, kind: DecodeErrorKind, target: Option<SocketAddr>) -> Box<Error> {
    tracing::debug!(target: "ups_snmp::ber", { snmp.offset = %offset, kind = %kind }, "length decode error");
    Error::MalformedResponse {
        target: target.unwrap_or(UNKNOWN_TARGET),
    }
    .boxed()
}

/// Decode a length, returning `(length, bytes_consumed)`.
///
/// `base_offset` is only used to report where in the message the failure was.
pub fn decode_length(
    data: &[u8],
    base_offset: usize,
    target: Option<SocketAddr>,
) -> Result<(usize, usize)> {
    let Some(&first) = data.first() else {
        return Err(malformed(base_offset, DecodeErrorKind::TruncatedData, target));
    };

    if first == 0x80 {
        return Err(malformed(base_offset, DecodeErrorKind::IndefiniteLength, target));
    }

    if first & 0x80 == 0 {
        return Ok((first as usize, 1));
    }

    let num_octets = (first & 0x7F) as usize;
    if num_octets == 0 {
        return Err(malformed(base_offset, DecodeErrorKind::InvalidLength, target));
    }
    if num_octets > 4 {
        return Err(malformed(
            base_offset,
            DecodeErrorKind::LengthTooLong { octets: num_octets },
            target,
        ));
    }
    let Some(octets) = data.get(1..1 + num_octets) else {
        return Err(malformed(base_offset, DecodeErrorKind::TruncatedData, target));
    };

    let len = octets.iter().fold(0usize, |acc, &b| (acc << 8) | b as usize);
    if len > MAX_LENGTH {
        return Err(malformed(
            base_offset,
            DecodeErrorKind::LengthExceedsMax {
                length: len,
                max: MAX_LENGTH,
            },
            target,
        ));
    }

    Ok((len, 1 + num_octets))
}
