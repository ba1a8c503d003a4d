//! Bulk sink for document stores.
//!
//! Items of a stream are mapped to write requests and buffered per worker in a
//! [BulkContext]. The host framework decides when to flush; each flush sends everything
//! buffered as a single bulk, and the buffer is only reset when the store accepted every
//! request. On failure the requests stay buffered and are resent by the next flush.
//!
//! A [Sink] is assembled with a [SinkBuilder] and driven through [SinkStage]:
//! `create_context` when a worker starts, `receive` per item, `flush` at the host's cadence
//! and `destroy` at shutdown, which flushes one last time and always releases the client.

pub use builder::SinkBuilder;
pub use client::{BulkClient, ClientFn, LocalBulkClient};
pub use config::SinkSettings;
pub use context::BulkContext;
pub use error::{Error, Result};
pub use functions::{
    BulkRequestFn, DefaultOptions, MapToRequestFn, NewBulkRequest, OptionsFn,
};
pub use request::{
    BulkItemFailure, BulkItemResponse, BulkRequest, BulkResponse, DeleteRequest,
    DocWriteRequest, IndexRequest, OpType, RefreshPolicy, RequestOptions, UpdateRequest,
};
pub use sink::{LocalSinkStage, Sink, SinkStage, WorkerContext};

mod builder;
mod client;
mod config;
mod context;
mod error;
mod functions;
mod request;
mod sink;
