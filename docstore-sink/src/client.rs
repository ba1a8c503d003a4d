//! Boundary with the document store.
//!
//! The store's client library is supplied by the caller. The sink only needs to open a
//! connection ([ClientFn]), execute a bulk on it and release it ([BulkClient]). Retries,
//! pooling, authentication and the wire format all live behind these traits.

use std::future::Future;

use crate::Result;
use crate::request::{BulkRequest, BulkResponse, RequestOptions};

/// A connected client of the document store, owned by exactly one [crate::BulkContext].
#[trait_variant::make(BulkClient: Send)]
pub trait LocalBulkClient {
    /// Execute all requests of `request` as a single bulk.
    ///
    /// Item failures must be reported in the returned [BulkResponse]. An `Err` means the
    /// store could not be reached and should be [crate::Error::Transport].
    async fn bulk(
        &mut self,
        request: &BulkRequest,
        options: &RequestOptions,
    ) -> Result<BulkResponse>;

    /// Release the connection. Called exactly once, after the final flush.
    async fn close(&mut self) -> Result<()>;
}

/// Opens a [BulkClient] for a worker.
///
/// Implementations are plain values shipped to every worker, so they must not capture state
/// that only makes sense on the caller's side.
pub trait ClientFn: Send + Sync + 'static {
    type Client: BulkClient + 'static;

    fn connect(&self) -> impl Future<Output = Result<Self::Client>> + Send;
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::request::{BulkItemResponse, IndexRequest};

    #[derive(Default)]
    struct CountingClient {
        bulks: usize,
        closed: bool,
    }

    impl BulkClient for CountingClient {
        async fn bulk(
            &mut self,
            request: &BulkRequest,
            _options: &RequestOptions,
        ) -> Result<BulkResponse> {
            self.bulks += 1;
            let items = request
                .requests()
                .iter()
                .map(BulkItemResponse::success)
                .collect();
            Ok(BulkResponse::new(items, Duration::ZERO))
        }

        async fn close(&mut self) -> Result<()> {
            self.closed = true;
            Ok(())
        }
    }

    /// Drives a client through the local variant only.
    async fn send_and_close<C: LocalBulkClient>(client: &mut C, request: &BulkRequest) -> usize {
        let response = LocalBulkClient::bulk(client, request, &RequestOptions::default())
            .await
            .unwrap();
        LocalBulkClient::close(client).await.unwrap();
        response.items.len()
    }

    #[tokio::test]
    async fn test_send_client_is_usable_as_local_client() {
        let mut request = BulkRequest::new();
        request.add(IndexRequest::new("docs").id("1"));
        request.add(IndexRequest::new("docs").id("2"));

        let mut client = CountingClient::default();
        assert_eq!(send_and_close(&mut client, &request).await, 2);
        assert_eq!(client.bulks, 1);
        assert!(client.closed);
    }
}
