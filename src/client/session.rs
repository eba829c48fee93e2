//! Short-lived sessions: one transport per `get` or `walk`.

use std::future::Future;
use std::io;

use tokio::net::lookup_host;

use crate::config::ConnectionConfig;
use crate::error::{Error, Result, UNKNOWN_TARGET};
use crate::oid::Oid;
use crate::transport::{Transport, UdpTransport};

use super::{Client, ReadResult};

/// Run `op` against `client`, then close it on every path.
///
/// When both the operation and the close fail, the operation's error is
/// returned and the close error is only logged.
pub async fn run_scoped<T, F, Fut, R>(client: Client<T>, op: F) -> Result<R>
where
    T: Transport,
    F: FnOnce(Client<T>) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    let result = op(client.clone()).await;
    let closed = client.close().await;

    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            tracing::debug!(target: "ups_snmp::client", { error = %close_err }, "close failed after operation error");
            Err(e)
        }
    }
}

/// Connection context shared by every table of a MIB.
///
/// Holds only configuration. Each call opens its own UDP session, so no
/// socket outlives the call that created it.
#[derive(Debug, Clone)]
pub struct SnmpClient {
    config: ConnectionConfig,
}

impl SnmpClient {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    async fn open(&self) -> Result<Client<UdpTransport>> {
        let endpoint = self.config.endpoint();
        let port = self.config.port();

        let target = lookup_host((endpoint, port))
            .await
            .and_then(|mut addrs| {
                addrs.next().ok_or_else(|| {
                    io::Error::new(io::ErrorKind::NotFound, "no addresses for endpoint")
                })
            })
            .map_err(|source| {
                tracing::debug!(target: "ups_snmp::client", { endpoint = endpoint, port = port, error = %source }, "could not resolve endpoint");
                Error::Network {
                    target: UNKNOWN_TARGET,
                    source,
                }
                .boxed()
            })?;

        let transport = UdpTransport::connect(target).await?;
        Ok(Client::new(transport, self.config.clone()))
    }

    /// Read one scalar.
    ///
    /// Exception values (noSuchObject, noSuchInstance, endOfMibView) come
    /// back as [`ReadValue::Null`](super::ReadValue::Null).
    pub async fn get(&self, oid: &str) -> Result<ReadResult> {
        let oid = Oid::parse(oid)?;
        let client = self.open().await?;
        let vb = run_scoped(client, |c| async move { c.get(&oid).await }).await?;
        Ok(vb.into())
    }

    /// Walk a subtree, returning readings in numeric OID order.
    pub async fn walk(&self, root: &str) -> Result<Vec<ReadResult>> {
        let root = Oid::parse(root)?;
        let client = self.open().await?;
        let mut varbinds =
            run_scoped(client, |c| async move { c.bulk_walk(root).collect().await }).await?;

        varbinds.sort_by(|a, b| a.oid.cmp(&b.oid));
        tracing::debug!(target: "ups_snmp::client", { snmp.count = varbinds.len() }, "walk complete");
        Ok(varbinds.into_iter().map(ReadResult::from).collect())
    }
}
