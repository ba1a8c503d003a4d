use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::Result;
use crate::client::ClientFn;
use crate::context::BulkContext;
use crate::functions::{BulkRequestFn, MapToRequestFn, OptionsFn};

/// Identity of the worker a context is created for, as handed over by the host framework.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerContext {
    /// Index of the worker across all members of the cluster.
    pub global_processor_index: usize,
    /// Index of the worker on this member.
    pub local_processor_index: usize,
    /// Name of the stage the worker belongs to.
    pub vertex_name: String,
}

/// Lifecycle a host framework drives a sink through, once per worker:
/// `create_context`, then any interleaving of `receive` and `flush`, then `destroy`.
///
/// The host must not call these concurrently for the same context.
#[trait_variant::make(SinkStage: Send)]
pub trait LocalSinkStage {
    type Item;
    type Context;

    fn name(&self) -> &str;

    /// How many workers the host should run per member.
    fn local_parallelism(&self) -> usize;

    async fn create_context(&self, worker: &WorkerContext) -> Result<Self::Context>;

    fn receive(&self, context: &mut Self::Context, item: Self::Item);

    async fn flush(&self, context: &mut Self::Context) -> Result<()>;

    async fn destroy(&self, context: Self::Context) -> Result<()>;
}

/// A sink that writes items of type `T` to the document store in bulks.
///
/// Built by [crate::SinkBuilder]. Cloning is cheap; every clone shares the configured
/// functions and can serve any number of workers.
pub struct Sink<T, C> {
    pub(crate) name: String,
    pub(crate) local_parallelism: usize,
    pub(crate) client_fn: Arc<C>,
    pub(crate) map_to_request_fn: Arc<dyn MapToRequestFn<T>>,
    pub(crate) bulk_request_fn: Arc<dyn BulkRequestFn>,
    pub(crate) options_fn: Arc<dyn OptionsFn>,
    pub(crate) _item: PhantomData<fn(T)>,
}

impl<T, C> Clone for Sink<T, C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            local_parallelism: self.local_parallelism,
            client_fn: Arc::clone(&self.client_fn),
            map_to_request_fn: Arc::clone(&self.map_to_request_fn),
            bulk_request_fn: Arc::clone(&self.bulk_request_fn),
            options_fn: Arc::clone(&self.options_fn),
            _item: PhantomData,
        }
    }
}

impl<T, C> std::fmt::Debug for Sink<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sink")
            .field("name", &self.name)
            .field("local_parallelism", &self.local_parallelism)
            .finish_non_exhaustive()
    }
}

impl<T, C> SinkStage for Sink<T, C>
where
    T: Send + 'static,
    C: ClientFn,
{
    type Item = T;
    type Context = BulkContext<C::Client>;

    fn name(&self) -> &str {
        &self.name
    }

    fn local_parallelism(&self) -> usize {
        self.local_parallelism
    }

    async fn create_context(&self, worker: &WorkerContext) -> Result<Self::Context> {
        let client = self.client_fn.connect().await?;
        debug!(
            sink = %self.name,
            worker = worker.global_processor_index,
            local_worker = worker.local_processor_index,
            "Created BulkContext"
        );
        Ok(BulkContext::new(
            client,
            Arc::clone(&self.bulk_request_fn),
            Arc::clone(&self.options_fn),
            worker.clone(),
        ))
    }

    fn receive(&self, context: &mut Self::Context, item: T) {
        context.add(self.map_to_request_fn.map_to_request(item));
    }

    async fn flush(&self, context: &mut Self::Context) -> Result<()> {
        context.flush().await
    }

    async fn destroy(&self, context: Self::Context) -> Result<()> {
        context.close().await
    }
}
