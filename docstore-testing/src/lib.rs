//! Document store test utilities.
//!
//! [InMemoryStore] is a [docstore_sink::ClientFn] whose clients apply bulks to an in-memory
//! map of documents, record every bulk they receive, and fail on demand through the
//! [ErrorInjector].
//!
//! # Example
//! ```ignore
//! let store = InMemoryStore::new();
//! let sink = SinkBuilder::new()
//!     .client_fn(store.clone())
//!     .map_to_request_fn(|id: u64| IndexRequest::new("ids").id(id.to_string()).into())
//!     .build()?;
//!
//! store.error_injector().fail_bulks(1);
//! ```

/// Error injector for testing.
mod error_injector;
/// In-memory store and its clients.
mod store;

pub use error_injector::ErrorInjector;
pub use store::{Document, InMemoryClient, InMemoryStore, RecordedBulk};
