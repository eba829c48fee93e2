//! GETBULK walk stream.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::error::{Error, Result, WalkAbortReason};
use crate::oid::Oid;
use crate::transport::Transport;
use crate::value::Value;
use crate::varbind::VarBind;

use super::Client;

type PendingBulk = Pin<Box<dyn Future<Output = Result<Vec<VarBind>>> + Send>>;

/// Stream of varbinds under one subtree, fetched with GETBULK.
///
/// Agents must return strictly increasing OIDs; the first violation ends
/// the stream with [`Error::WalkAborted`] rather than looping forever.
pub struct BulkWalk<T: Transport> {
    client: Client<T>,
    base_oid: Oid,
    current_oid: Oid,
    max_repetitions: i32,
    /// Last OID yielded, for the ordering check
    last_oid: Option<Oid>,
    done: bool,
    /// Buffered results from the last GETBULK response
    buffer: std::vec::IntoIter<VarBind>,
    pending: Option<PendingBulk>,
}

impl<T: Transport> BulkWalk<T> {
    pub(crate) fn new(client: Client<T>, oid: Oid, max_repetitions: i32) -> Self {
        Self {
            client,
            base_oid: oid.clone(),
            current_oid: oid,
            max_repetitions,
            last_oid: None,
            done: false,
            buffer: Vec::new().into_iter(),
            pending: None,
        }
    }

    fn check_increasing(&mut self, oid: &Oid) -> Result<()> {
        if let Some(last) = &self.last_oid
            && oid <= last
        {
            tracing::debug!(
                target: "ups_snmp::client",
                { snmp.target = %self.client.peer_addr(), previous = %last, current = %oid },
                "non-increasing OID, aborting walk"
            );
            return Err(Error::WalkAborted {
                target: self.client.peer_addr(),
                reason: WalkAbortReason::NonIncreasing,
            }
            .boxed());
        }
        self.last_oid = Some(oid.clone());
        Ok(())
    }
}

impl<T: Transport + 'static> BulkWalk<T> {
    /// Get the next varbind, or None when complete.
    pub async fn next(&mut self) -> Option<Result<VarBind>> {
        std::future::poll_fn(|cx| Pin::new(&mut *self).poll_next(cx)).await
    }

    /// Collect all remaining varbinds.
    pub async fn collect(mut self) -> Result<Vec<VarBind>> {
        let mut results = Vec::new();
        while let Some(result) = self.next().await {
            results.push(result?);
        }
        Ok(results)
    }
}

impl<T: Transport + 'static> Stream for BulkWalk<T> {
    type Item = Result<VarBind>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if self.done {
                return Poll::Ready(None);
            }

            if let Some(vb) = self.buffer.next() {
                if matches!(vb.value, Value::EndOfMibView) || !vb.oid.starts_with(&self.base_oid)
                {
                    self.done = true;
                    return Poll::Ready(None);
                }

                if let Err(e) = self.check_increasing(&vb.oid) {
                    self.done = true;
                    return Poll::Ready(Some(Err(e)));
                }

                self.current_oid = vb.oid.clone();
                return Poll::Ready(Some(Ok(vb)));
            }

            // Buffer exhausted, fetch the next batch
            if self.pending.is_none() {
                let client = self.client.clone();
                let oid = self.current_oid.clone();
                let max_repetitions = self.max_repetitions;
                self.pending = Some(Box::pin(async move {
                    client.get_bulk(&[oid], 0, max_repetitions).await
                }));
            }
            let Some(pending) = self.pending.as_mut() else {
                return Poll::Ready(None);
            };

            match pending.as_mut().poll(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(result) => {
                    self.pending = None;
                    match result {
                        Ok(varbinds) if varbinds.is_empty() => {
                            self.done = true;
                            return Poll::Ready(None);
                        }
                        Ok(varbinds) => self.buffer = varbinds.into_iter(),
                        Err(e) => {
                            self.done = true;
                            return Poll::Ready(Some(Err(e)));
                        }
                    }
                }
            }
        }
    }
}
