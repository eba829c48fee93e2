//! UDP transport implementation.

use super::Transport;
use crate::error::{Error, Result};
use crate::util::bind_ephemeral_udp_socket;
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;

/// UDP transport for a single target.
///
/// Owns a connected UDP socket. The socket is released by [`Transport::close`]
/// or when the last clone is dropped, whichever comes first.
#[derive(Clone)]
pub struct UdpTransport {
    inner: Arc<UdpTransportInner>,
}

struct UdpTransportInner {
    socket: Mutex<Option<Arc<UdpSocket>>>,
    target: SocketAddr,
    local_addr: SocketAddr,
}

impl UdpTransport {
    /// Bind an ephemeral socket of the target's address family and connect it.
    pub async fn connect(target: SocketAddr) -> Result<Self> {
        tracing::debug!(target: "ups_snmp::transport", { snmp.target = %target }, "connecting UDP transport");

        let network = |source| Error::Network { target, source }.boxed();

        let socket = bind_ephemeral_udp_socket(target).await.map_err(network)?;
        socket.connect(target).await.map_err(network)?;
        let local_addr = socket.local_addr().map_err(network)?;

        tracing::debug!(
            target: "ups_snmp::transport",
            { snmp.target = %target, snmp.local_addr = %local_addr },
            "UDP transport connected"
        );

        Ok(Self {
            inner: Arc::new(UdpTransportInner {
                socket: Mutex::new(Some(Arc::new(socket))),
                target,
                local_addr,
            }),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.inner.local_addr
    }

    fn socket(&self) -> Result<Arc<UdpSocket>> {
        let guard = self.inner.socket.lock().unwrap_or_else(|e| e.into_inner());
        guard.clone().ok_or_else(|| {
            Error::Network {
                target: self.inner.target,
                source: std::io::Error::new(std::io::ErrorKind::NotConnected, "transport closed"),
            }
            .boxed()
        })
    }
}

impl Transport for UdpTransport {
    async fn send(&self, data: &[u8]) -> Result<()> {
        tracing::trace!(
            target: "ups_snmp::transport",
            { snmp.target = %self.inner.target, snmp.bytes = data.len() },
            "UDP send"
        );
        let socket = self.socket()?;
        socket.send(data).await.map_err(|source| {
            Error::Network {
                target: self.inner.target,
                source,
            }
            .boxed()
        })?;
        Ok(())
    }

    async fn recv(&self, recv_timeout: Duration) -> Result<(Bytes, SocketAddr)> {
        let socket = self.socket()?;
        let mut buf = vec![0u8; 65535];

        match timeout(recv_timeout, socket.recv(&mut buf)).await {
            Ok(Ok(len)) => {
                buf.truncate(len);
                tracing::trace!(
                    target: "ups_snmp::transport",
                    { snmp.target = %self.inner.target, snmp.bytes = len },
                    "UDP recv complete"
                );
                Ok((Bytes::from(buf), self.inner.target))
            }
            Ok(Err(source)) => Err(Error::Network {
                target: self.inner.target,
                source,
            }
            .boxed()),
            Err(_) => {
                tracing::trace!(
                    target: "ups_snmp::transport",
                    { snmp.target = %self.inner.target, snmp.timeout_ms = recv_timeout.as_millis() as u64 },
                    "UDP recv timeout"
                );
                Err(Error::Timeout {
                    target: self.inner.target,
                    elapsed: recv_timeout,
                }
                .boxed())
            }
        }
    }

    fn peer_addr(&self) -> SocketAddr {
        self.inner.target
    }

    async fn close(&self) -> Result<()> {
        let socket = self
            .inner
            .socket
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if socket.is_some() {
            tracing::trace!(target: "ups_snmp::transport", { snmp.target = %self.inner.target }, "UDP transport closed");
        }
        Ok(())
    }
}
