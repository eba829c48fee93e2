//! Mock transport for testing.
//!
//! A programmable transport that replays queued responses and records what
//! was sent, without a network.

use super::{Transport, extract_msg_id};
use crate::error::{Error, Result};
use bytes::Bytes;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// A scripted outcome for one `recv` call.
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Return this datagram as-is
    Data(Bytes),
    /// Simulate a timeout
    Timeout,
    /// Simulate a socket error
    IoError(String),
}

/// A request sent through the mock transport.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub data: Bytes,
    /// msgID, if the datagram is a well-formed v3 message
    pub msg_id: Option<i32>,
}

struct MockTransportInner {
    target: SocketAddr,
    responses: VecDeque<MockResponse>,
    requests: Vec<RecordedRequest>,
    close_error: Option<String>,
    close_calls: usize,
    closed: bool,
}

/// Mock transport for testing session handling.
///
/// ```rust
/// use ups_snmp::transport::MockTransport;
///
/// let mock = MockTransport::new("127.0.0.1:161".parse().unwrap());
/// mock.queue_timeout();
/// mock.fail_close("socket already gone");
/// assert!(!mock.is_closed());
/// ```
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

impl MockTransport {
    pub fn new(target: SocketAddr) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockTransportInner {
                target,
                responses: VecDeque::new(),
                requests: Vec::new(),
                close_error: None,
                close_calls: 0,
                closed: false,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockTransportInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn queue_response(&self, data: impl Into<Bytes>) {
        self.lock().responses.push_back(MockResponse::Data(data.into()));
    }

    pub fn queue_timeout(&self) {
        self.lock().responses.push_back(MockResponse::Timeout);
    }

    pub fn queue_io_error(&self, msg: impl Into<String>) {
        self.lock().responses.push_back(MockResponse::IoError(msg.into()));
    }

    /// Make `close` fail with an I/O error carrying `msg`.
    pub fn fail_close(&self, msg: impl Into<String>) {
        self.lock().close_error = Some(msg.into());
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of times `close` was called, successful or not.
    pub fn close_calls(&self) -> usize {
        self.lock().close_calls
    }
}

impl Transport for MockTransport {
    async fn send(&self, data: &[u8]) -> Result<()> {
        let mut inner = self.lock();
        if inner.closed {
            return Err(Error::Network {
                target: inner.target,
                source: std::io::Error::new(std::io::ErrorKind::NotConnected, "transport closed"),
            }
            .boxed());
        }
        inner.requests.push(RecordedRequest {
            data: Bytes::copy_from_slice(data),
            msg_id: extract_msg_id(data),
        });
        Ok(())
    }

    async fn recv(&self, timeout: Duration) -> Result<(Bytes, SocketAddr)> {
        let (response, target) = {
            let mut inner = self.lock();
            (inner.responses.pop_front(), inner.target)
        };

        match response {
            Some(MockResponse::Data(data)) => Ok((data, target)),
            Some(MockResponse::IoError(msg)) => Err(Error::Network {
                target,
                source: std::io::Error::other(msg),
            }
            .boxed()),
            Some(MockResponse::Timeout) | None => Err(Error::Timeout {
                target,
                elapsed: timeout,
            }
            .boxed()),
        }
    }

    fn peer_addr(&self) -> SocketAddr {
        self.lock().target
    }

    async fn close(&self) -> Result<()> {
        let mut inner = self.lock();
        inner.close_calls += 1;
        inner.closed = true;
        match inner.close_error.clone() {
            Some(msg) => Err(Error::Network {
                target: inner.target,
                source: std::io::Error::other(msg),
            }
            .boxed()),
            None => Ok(()),
        }
    }
}
