//! In-memory document store that records every bulk it receives.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use docstore_sink::{
    BulkClient, BulkItemResponse, BulkRequest, BulkResponse, ClientFn, DeleteRequest,
    DocWriteRequest, Error, IndexRequest, RequestOptions, Result, UpdateRequest,
};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::ErrorInjector;

/// A stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub source: Value,
    pub version: i64,
}

/// A bulk as the store received it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedBulk {
    /// Connection the bulk was sent on.
    pub connection: usize,
    pub requests: Vec<DocWriteRequest>,
    pub options: RequestOptions,
}

#[derive(Debug, Default)]
struct StoreState {
    /// Documents keyed by index, then id.
    indices: HashMap<String, HashMap<String, Document>>,
    bulks: Vec<RecordedBulk>,
    opened: usize,
    closed: usize,
    next_auto_id: u64,
}

/// Shared in-memory store. Clones observe and modify the same state, so a test can keep one
/// clone while the sink opens clients through another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
    error_injector: Arc<ErrorInjector>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error_injector(&self) -> &ErrorInjector {
        &self.error_injector
    }

    /// Every bulk received so far, in arrival order.
    pub fn bulks(&self) -> Vec<RecordedBulk> {
        self.state.read().bulks.clone()
    }

    pub fn bulk_count(&self) -> usize {
        self.state.read().bulks.len()
    }

    pub fn document(&self, index: &str, id: &str) -> Option<Document> {
        self.state
            .read()
            .indices
            .get(index)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    pub fn document_count(&self, index: &str) -> usize {
        self.state
            .read()
            .indices
            .get(index)
            .map_or(0, HashMap::len)
    }

    pub fn opened_connections(&self) -> usize {
        self.state.read().opened
    }

    pub fn closed_connections(&self) -> usize {
        self.state.read().closed
    }
}

impl ClientFn for InMemoryStore {
    type Client = InMemoryClient;

    async fn connect(&self) -> Result<InMemoryClient> {
        if self.error_injector.should_fail_connect() {
            return Err(Error::Connection("injected connect failure".to_string()));
        }
        let connection = {
            let mut state = self.state.write();
            state.opened += 1;
            state.opened
        };
        debug!(connection, "Opened in-memory store connection");
        Ok(InMemoryClient {
            store: self.clone(),
            connection,
            closed: false,
        })
    }
}

/// One connection to an [InMemoryStore].
#[derive(Debug)]
pub struct InMemoryClient {
    store: InMemoryStore,
    connection: usize,
    closed: bool,
}

impl InMemoryClient {
    pub fn connection(&self) -> usize {
        self.connection
    }
}

impl BulkClient for InMemoryClient {
    async fn bulk(
        &mut self,
        request: &BulkRequest,
        options: &RequestOptions,
    ) -> Result<BulkResponse> {
        if self.closed {
            return Err(Error::Transport("connection is closed".to_string()));
        }
        let start = Instant::now();
        self.store.error_injector.apply_bulk_latency().await;
        if self.store.error_injector.should_fail_transport() {
            return Err(Error::Transport("injected transport failure".to_string()));
        }
        let reject_all = self.store.error_injector.should_fail_bulk();

        let mut state = self.store.state.write();
        state.bulks.push(RecordedBulk {
            connection: self.connection,
            requests: request.requests().to_vec(),
            options: options.clone(),
        });

        let items = request
            .requests()
            .iter()
            .map(|req| {
                if reject_all {
                    return BulkItemResponse::failure(req, 429, "rejected execution");
                }
                match state.apply(req) {
                    Ok(()) => BulkItemResponse::success(req),
                    Err((status, reason)) => BulkItemResponse::failure(req, status, reason),
                }
            })
            .collect();

        Ok(BulkResponse::new(items, start.elapsed()))
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Err(Error::Connection("connection already closed".to_string()));
        }
        self.closed = true;
        self.store.state.write().closed += 1;
        debug!(connection = self.connection, "Closed in-memory store connection");

        if self.store.error_injector.should_fail_close() {
            return Err(Error::Connection("injected close failure".to_string()));
        }
        Ok(())
    }
}

type ItemResult = std::result::Result<(), (u16, String)>;

impl StoreState {
    fn apply(&mut self, request: &DocWriteRequest) -> ItemResult {
        match request {
            DocWriteRequest::Index(req) => self.index(req),
            DocWriteRequest::Update(req) => self.update(req),
            DocWriteRequest::Delete(req) => self.delete(req),
        }
    }

    fn index(&mut self, req: &IndexRequest) -> ItemResult {
        let id = match &req.id {
            Some(id) => id.clone(),
            None => {
                self.next_auto_id += 1;
                format!("auto-{}", self.next_auto_id)
            }
        };
        let docs = self.indices.entry(req.index.clone()).or_default();
        let current = docs.get(&id).map(|doc| doc.version);

        let version = match (req.version, current) {
            (Some(requested), Some(current)) if requested <= current => {
                return Err((
                    409,
                    format!(
                        "version conflict, current version [{current}] is higher or equal to the one provided [{requested}]"
                    ),
                ));
            }
            (Some(requested), _) => requested,
            (None, current) => current.unwrap_or(0) + 1,
        };

        docs.insert(
            id,
            Document {
                source: req.source.clone(),
                version,
            },
        );
        Ok(())
    }

    fn update(&mut self, req: &UpdateRequest) -> ItemResult {
        let docs = self.indices.entry(req.index.clone()).or_default();
        match docs.get_mut(&req.id) {
            Some(doc) => {
                merge(&mut doc.source, &req.doc);
                doc.version += 1;
                Ok(())
            }
            None if req.doc_as_upsert => {
                docs.insert(
                    req.id.clone(),
                    Document {
                        source: req.doc.clone(),
                        version: 1,
                    },
                );
                Ok(())
            }
            None => Err((404, format!("[{}]: document missing", req.id))),
        }
    }

    fn delete(&mut self, req: &DeleteRequest) -> ItemResult {
        let docs = self.indices.entry(req.index.clone()).or_default();
        match docs.get(&req.id) {
            Some(doc) if req.version.is_some_and(|v| v != doc.version) => Err((
                409,
                format!(
                    "version conflict, current version [{}] is different than the one provided",
                    doc.version
                ),
            )),
            Some(_) => {
                docs.remove(&req.id);
                Ok(())
            }
            None => Err((404, format!("[{}]: document missing", req.id))),
        }
    }
}

/// Shallow merge of `patch` into `target` when both are objects, replace otherwise.
fn merge(target: &mut Value, patch: &Value) {
    match (target.as_object_mut(), patch.as_object()) {
        (Some(target), Some(patch)) => {
            for (k, v) in patch {
                target.insert(k.clone(), v.clone());
            }
        }
        _ => *target = patch.clone(),
    }
}
