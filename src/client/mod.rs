//! SNMPv3 client.
//!
//! [`Client`] is one authPriv session over a single [`Transport`]: it
//! discovers the agent's engine, localizes keys, and issues GET and GETBULK
//! requests. [`SnmpClient`] sits on top and opens a fresh session for every
//! `get` or `walk`, closing it again on every path.

mod result;
mod session;
mod v3;
mod walk;

pub use result::{ReadResult, ReadValue};
pub use session::{SnmpClient, run_scoped};
pub use walk::BulkWalk;

use crate::config::ConnectionConfig;
use crate::error::internal::DecodeErrorKind;
use crate::error::{Error, Result, UNKNOWN_TARGET};
use crate::oid::Oid;
use crate::pdu::Pdu;
use crate::transport::Transport;
use crate::v3::{EngineState, LocalizedKey, PrivKey, SaltCounter};
use crate::varbind::VarBind;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::instrument;

/// Process-wide request ID source; IDs are positive and never zero.
static NEXT_REQUEST_ID: AtomicI32 = AtomicI32::new(1);

/// SNMPv3 session over one transport.
///
/// Cheap to clone; clones share the transport and the discovered engine.
#[derive(Clone)]
pub struct Client<T: Transport> {
    inner: Arc<ClientInner<T>>,
}

struct ClientInner<T: Transport> {
    transport: T,
    config: ConnectionConfig,
    /// Engine state and localized keys, filled in by discovery
    session: Mutex<Option<SessionState>>,
    salt_counter: SaltCounter,
}

struct SessionState {
    engine: EngineState,
    auth_key: LocalizedKey,
    priv_key: PrivKey,
}

impl<T: Transport> Client<T> {
    /// Create a client. No traffic is sent until the first request.
    pub fn new(transport: T, config: ConnectionConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport,
                config,
                session: Mutex::new(None),
                salt_counter: SaltCounter::new(),
            }),
        }
    }

    /// The remote address this client sends requests to.
    pub fn peer_addr(&self) -> SocketAddr {
        self.inner.transport.peer_addr()
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.inner.config
    }

    /// Engine state learned by discovery, if any.
    pub fn engine_state(&self) -> Option<EngineState> {
        self.session().as_ref().map(|s| s.engine.clone())
    }

    fn session(&self) -> MutexGuard<'_, Option<SessionState>> {
        self.inner.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next_request_id(&self) -> i32 {
        loop {
            let id = NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed) & i32::MAX;
            if id != 0 {
                return id;
            }
        }
    }

    /// Replace the placeholder target on errors raised below the client.
    fn retarget(&self, error: Box<Error>) -> Box<Error> {
        let target = self.peer_addr();
        let error = *error;
        match error {
            Error::Crypto { target: t } if t == UNKNOWN_TARGET => Error::Crypto { target },
            Error::MalformedResponse { target: t } if t == UNKNOWN_TARGET => {
                Error::MalformedResponse { target }
            }
            other => other,
        }
        .boxed()
    }

    /// GET a single OID.
    #[instrument(skip(self), err, fields(snmp.target = %self.peer_addr(), snmp.oid = %oid))]
    pub async fn get(&self, oid: &Oid) -> Result<VarBind> {
        let request_id = self.next_request_id();
        let pdu = Pdu::get_request(request_id, std::slice::from_ref(oid));
        let response = self.send_v3_and_recv(pdu).await?;

        response.varbinds.into_iter().next().ok_or_else(|| {
            tracing::debug!(target: "ups_snmp::client", { snmp.target = %self.peer_addr(), kind = %DecodeErrorKind::EmptyResponse }, "empty GET response");
            Error::MalformedResponse {
                target: self.peer_addr(),
            }
            .boxed()
        })
    }

    /// Send one GETBULK request.
    #[instrument(skip(self, oids), err, fields(
        snmp.target = %self.peer_addr(),
        snmp.oid_count = oids.len(),
        snmp.non_repeaters = non_repeaters,
        snmp.max_repetitions = max_repetitions
    ))]
    pub async fn get_bulk(
        &self,
        oids: &[Oid],
        non_repeaters: i32,
        max_repetitions: i32,
    ) -> Result<Vec<VarBind>> {
        let request_id = self.next_request_id();
        let pdu = Pdu::get_bulk(request_id, non_repeaters, max_repetitions, oids);
        let response = self.send_v3_and_recv(pdu).await?;
        Ok(response.varbinds)
    }

    /// Walk a subtree with repeated GETBULK requests.
    ///
    /// The stream ends at `endOfMibView`, at the first OID outside the
    /// subtree, or on an empty response. An agent that returns a
    /// non-increasing OID aborts the walk with [`Error::WalkAborted`].
    pub fn bulk_walk(&self, oid: Oid) -> BulkWalk<T> {
        let max_repetitions = self.inner.config.max_repetitions().min(i32::MAX as u32) as i32;
        BulkWalk::new(self.clone(), oid, max_repetitions)
    }

    /// Release the transport. Requests after this fail.
    pub async fn close(&self) -> Result<()> {
        tracing::trace!(target: "ups_snmp::client", { snmp.target = %self.peer_addr() }, "closing session");
        self.inner.transport.close().await
    }
}
