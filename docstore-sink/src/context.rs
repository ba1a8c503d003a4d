use std::sync::Arc;

use tracing::{debug, warn};

use crate::client::BulkClient;
use crate::error::{Error, Result};
use crate::functions::{BulkRequestFn, OptionsFn};
use crate::request::{BulkRequest, DocWriteRequest};
use crate::sink::WorkerContext;

/// Per-worker state of the sink: one connected client and the bulk being accumulated.
///
/// Requests are only buffered by [BulkContext::add]; the store is contacted on
/// [BulkContext::flush] and on [BulkContext::close]. A failed flush keeps every pending
/// request, so the next flush resends them together with anything added in between.
/// Writes are therefore at-least-once, including for items the store accepted before a
/// partial failure. A response that acknowledges fewer items than were sent counts as a
/// failure too.
pub struct BulkContext<C> {
    client: C,
    bulk_request_fn: Arc<dyn BulkRequestFn>,
    options_fn: Arc<dyn OptionsFn>,
    bulk_request: BulkRequest,
    worker: WorkerContext,
}

impl<C> BulkContext<C>
where
    C: BulkClient,
{
    pub(crate) fn new(
        client: C,
        bulk_request_fn: Arc<dyn BulkRequestFn>,
        options_fn: Arc<dyn OptionsFn>,
        worker: WorkerContext,
    ) -> Self {
        let bulk_request = bulk_request_fn.bulk_request();
        Self {
            client,
            bulk_request_fn,
            options_fn,
            bulk_request,
            worker,
        }
    }

    /// Append a request to the pending bulk. No I/O.
    pub fn add(&mut self, request: DocWriteRequest) {
        self.bulk_request.add(request);
    }

    /// The bulk that the next flush will send.
    pub fn pending(&self) -> &BulkRequest {
        &self.bulk_request
    }

    pub fn worker(&self) -> &WorkerContext {
        &self.worker
    }

    /// Send the pending requests as one bulk.
    ///
    /// The pending bulk is replaced with a new one only when the store accepted every item.
    pub async fn flush(&mut self) -> Result<()> {
        if self.bulk_request.is_empty() {
            return Ok(());
        }

        let requests = self.bulk_request.len();
        let options = self.options_fn.options(&self.bulk_request);
        let response = match self.client.bulk(&self.bulk_request, &options).await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    worker = self.worker.global_processor_index,
                    requests,
                    error = %e,
                    "Bulk request failed, keeping pending requests"
                );
                return Err(e);
            }
        };

        if response.items.len() != requests {
            warn!(
                worker = self.worker.global_processor_index,
                requests,
                items = response.items.len(),
                "Bulk response does not cover every request, keeping pending requests"
            );
            return Err(Error::BulkWrite(format!(
                "bulk response has {} items for {requests} requests",
                response.items.len()
            )));
        }

        if response.has_failures() {
            warn!(
                worker = self.worker.global_processor_index,
                requests,
                failed = response.failed_count(),
                "Bulk request has failures, keeping pending requests"
            );
            return Err(Error::BulkWrite(response.build_failure_message()));
        }

        debug!(
            worker = self.worker.global_processor_index,
            requests,
            took = ?response.took,
            "Bulk request succeeded"
        );
        self.bulk_request = self.bulk_request_fn.bulk_request();
        Ok(())
    }

    /// Flush whatever is pending and release the client.
    ///
    /// The client is released even when the final flush fails, in which case the flush
    /// error is returned.
    pub async fn close(mut self) -> Result<()> {
        debug!(
            worker = self.worker.global_processor_index,
            pending = self.bulk_request.len(),
            "Closing BulkContext"
        );
        let flushed = self.flush().await;
        let released = self.client.close().await;

        match (flushed, released) {
            (Err(flush_err), Err(close_err)) => {
                warn!(
                    worker = self.worker.global_processor_index,
                    error = %close_err,
                    "Failed to release client after a failed flush"
                );
                Err(flush_err)
            }
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
            (Ok(()), Ok(())) => Ok(()),
        }
    }
}

impl<C> std::fmt::Debug for BulkContext<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkContext")
            .field("worker", &self.worker)
            .field("pending", &self.bulk_request.len())
            .finish_non_exhaustive()
    }
}
