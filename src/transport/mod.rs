//! Transport layer abstraction.
//!
//! Every `get`/`walk` opens its own transport and closes it when done, so
//! transports are short-lived and owned by exactly one session.

mod udp;

#[cfg(any(test, feature = "testing"))]
mod mock;

pub use udp::UdpTransport;

#[cfg(any(test, feature = "testing"))]
pub use mock::{MockResponse, MockTransport, RecordedRequest};

use crate::error::Result;
use bytes::Bytes;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

/// Client-side transport abstraction.
///
/// `Clone` is required because walk streams own a clone of the client (and
/// thus the transport). Implementations share state behind an `Arc`.
pub trait Transport: Send + Sync + Clone {
    /// Send one request datagram to the peer.
    fn send(&self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Wait up to `timeout` for one response datagram.
    ///
    /// Returns `(response_data, source_address)`.
    fn recv(&self, timeout: Duration) -> impl Future<Output = Result<(Bytes, SocketAddr)>> + Send;

    /// The remote address this transport talks to.
    fn peer_addr(&self) -> SocketAddr;

    /// Release the underlying socket. Later sends fail; closing twice is a no-op.
    fn close(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Extract msgID from an encoded SNMPv3 message without a full decode.
///
/// Used for log correlation and by the mock transport to record requests.
pub(crate) fn extract_msg_id(data: &[u8]) -> Option<i32> {
    use crate::ber::{Decoder, tag};

    let mut decoder = Decoder::from_slice(data);
    let mut seq = decoder.read_sequence().ok()?;
    if seq.read_integer().ok()? != 3 || seq.peek_tag()? != tag::universal::SEQUENCE {
        return None;
    }
    let mut global = seq.read_sequence().ok()?;
    global.read_integer().ok()
}
