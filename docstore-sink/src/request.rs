//! Write requests, the bulk buffer that accumulates them, and the store's bulk response.
//!
//! A [BulkRequest] is the unit a [crate::BulkContext] flushes. Requests are kept in insertion
//! order, which is also the order in which the store receives them.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

/// The kind of write a [DocWriteRequest] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OpType {
    Index,
    Update,
    Delete,
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpType::Index => write!(f, "index"),
            OpType::Update => write!(f, "update"),
            OpType::Delete => write!(f, "delete"),
        }
    }
}

/// Indexes (inserts or replaces) a whole document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexRequest {
    pub index: String,
    /// Store-assigned when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: Value,
    /// External version, makes the write conditional.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing: Option<String>,
}

impl IndexRequest {
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            id: None,
            source: Value::Null,
            version: None,
            routing: None,
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn source(mut self, source: Value) -> Self {
        self.source = source;
        self
    }

    pub fn version(mut self, version: i64) -> Self {
        self.version = Some(version);
        self
    }

    pub fn routing(mut self, routing: impl Into<String>) -> Self {
        self.routing = Some(routing.into());
        self
    }
}

/// Partially updates an existing document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateRequest {
    pub index: String,
    pub id: String,
    pub doc: Value,
    /// Index `doc` as a new document when `id` does not exist.
    pub doc_as_upsert: bool,
    pub retry_on_conflict: u32,
}

impl UpdateRequest {
    pub fn new(index: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            id: id.into(),
            doc: Value::Null,
            doc_as_upsert: false,
            retry_on_conflict: 0,
        }
    }

    pub fn doc(mut self, doc: Value) -> Self {
        self.doc = doc;
        self
    }

    pub fn doc_as_upsert(mut self, doc_as_upsert: bool) -> Self {
        self.doc_as_upsert = doc_as_upsert;
        self
    }

    pub fn retry_on_conflict(mut self, retries: u32) -> Self {
        self.retry_on_conflict = retries;
        self
    }
}

/// Deletes a document by id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteRequest {
    pub index: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
}

impl DeleteRequest {
    pub fn new(index: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            id: id.into(),
            version: None,
        }
    }

    pub fn version(mut self, version: i64) -> Self {
        self.version = Some(version);
        self
    }
}

/// One write operation against the store, produced by a [crate::MapToRequestFn].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum DocWriteRequest {
    Index(IndexRequest),
    Update(UpdateRequest),
    Delete(DeleteRequest),
}

impl DocWriteRequest {
    pub fn index(&self) -> &str {
        match self {
            DocWriteRequest::Index(r) => &r.index,
            DocWriteRequest::Update(r) => &r.index,
            DocWriteRequest::Delete(r) => &r.index,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            DocWriteRequest::Index(r) => r.id.as_deref(),
            DocWriteRequest::Update(r) => Some(&r.id),
            DocWriteRequest::Delete(r) => Some(&r.id),
        }
    }

    pub fn op_type(&self) -> OpType {
        match self {
            DocWriteRequest::Index(_) => OpType::Index,
            DocWriteRequest::Update(_) => OpType::Update,
            DocWriteRequest::Delete(_) => OpType::Delete,
        }
    }
}

impl From<IndexRequest> for DocWriteRequest {
    fn from(value: IndexRequest) -> Self {
        DocWriteRequest::Index(value)
    }
}

impl From<UpdateRequest> for DocWriteRequest {
    fn from(value: UpdateRequest) -> Self {
        DocWriteRequest::Update(value)
    }
}

impl From<DeleteRequest> for DocWriteRequest {
    fn from(value: DeleteRequest) -> Self {
        DocWriteRequest::Delete(value)
    }
}

/// When the store makes the written documents visible to searches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    #[default]
    None,
    Immediate,
    WaitUntil,
}

/// Pending write requests of one in-flight batch, plus batch-level settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulkRequest {
    requests: Vec<DocWriteRequest>,
    refresh_policy: RefreshPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<Duration>,
}

impl BulkRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_refresh_policy(mut self, refresh_policy: RefreshPolicy) -> Self {
        self.refresh_policy = refresh_policy;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn add(&mut self, request: impl Into<DocWriteRequest>) {
        self.requests.push(request.into());
    }

    pub fn requests(&self) -> &[DocWriteRequest] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn refresh_policy(&self) -> RefreshPolicy {
        self.refresh_policy
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Metadata sent along with a bulk, e.g. authorization headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn add_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Why the store rejected a single item of a bulk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemFailure {
    /// Status code reported by the store, e.g. 409 for a version conflict.
    pub status: u16,
    pub reason: String,
}

/// Outcome of a single request in a bulk, in the same position as the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemResponse {
    pub index: String,
    pub id: Option<String>,
    pub op_type: OpType,
    pub failure: Option<BulkItemFailure>,
}

impl BulkItemResponse {
    pub fn success(request: &DocWriteRequest) -> Self {
        Self {
            index: request.index().to_string(),
            id: request.id().map(str::to_string),
            op_type: request.op_type(),
            failure: None,
        }
    }

    pub fn failure(request: &DocWriteRequest, status: u16, reason: impl Into<String>) -> Self {
        Self {
            failure: Some(BulkItemFailure {
                status,
                reason: reason.into(),
            }),
            ..Self::success(request)
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Response of the store to one bulk call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkResponse {
    pub items: Vec<BulkItemResponse>,
    pub took: Duration,
}

impl BulkResponse {
    pub fn new(items: Vec<BulkItemResponse>, took: Duration) -> Self {
        Self { items, took }
    }

    pub fn has_failures(&self) -> bool {
        self.items.iter().any(BulkItemResponse::is_failed)
    }

    pub fn failed_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_failed()).count()
    }

    /// Aggregated description of every failed item, with its position in the bulk.
    pub fn build_failure_message(&self) -> String {
        let mut message = String::from("failure in bulk execution:");
        for (position, item) in self.items.iter().enumerate() {
            if let Some(failure) = &item.failure {
                message.push_str(&format!(
                    "\n[{position}]: index [{}], type [{}], id [{}], status [{}], message [{}]",
                    item.index,
                    item.op_type,
                    item.id.as_deref().unwrap_or("_auto"),
                    failure.status,
                    failure.reason,
                ));
            }
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_doc_write_request_accessors() {
        let index: DocWriteRequest = IndexRequest::new("users")
            .id("1")
            .source(json!({"name": "ada"}))
            .into();
        assert_eq!(index.index(), "users");
        assert_eq!(index.id(), Some("1"));
        assert_eq!(index.op_type(), OpType::Index);

        let auto_id: DocWriteRequest = IndexRequest::new("users").into();
        assert_eq!(auto_id.id(), None);

        let update: DocWriteRequest = UpdateRequest::new("users", "2")
            .doc(json!({"age": 36}))
            .doc_as_upsert(true)
            .into();
        assert_eq!(update.op_type(), OpType::Update);
        assert_eq!(update.id(), Some("2"));

        let delete: DocWriteRequest = DeleteRequest::new("users", "3").version(7).into();
        assert_eq!(delete.op_type(), OpType::Delete);
        assert_eq!(delete.index(), "users");
    }

    #[test]
    fn test_bulk_request_preserves_insertion_order() {
        let mut bulk = BulkRequest::new();
        assert!(bulk.is_empty());

        bulk.add(IndexRequest::new("a").id("1"));
        bulk.add(DeleteRequest::new("b", "2"));
        bulk.add(UpdateRequest::new("c", "3"));

        assert_eq!(bulk.len(), 3);
        let ids: Vec<_> = bulk.requests().iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec![Some("1"), Some("2"), Some("3")]);
    }

    #[test]
    fn test_bulk_request_settings() {
        let bulk = BulkRequest::new()
            .with_refresh_policy(RefreshPolicy::Immediate)
            .with_timeout(Duration::from_secs(5));
        assert_eq!(bulk.refresh_policy(), RefreshPolicy::Immediate);
        assert_eq!(bulk.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(BulkRequest::new().refresh_policy(), RefreshPolicy::None);
    }

    #[test]
    fn test_request_options_headers() {
        let options = RequestOptions::default().add_header("Authorization", "Bearer abc");
        assert_eq!(options.header("authorization"), Some("Bearer abc"));
        assert_eq!(options.header("X-Missing"), None);
        assert!(RequestOptions::default().headers().is_empty());
    }

    #[test]
    fn test_bulk_response_failure_message() {
        let ok: DocWriteRequest = IndexRequest::new("users").id("1").into();
        let conflict: DocWriteRequest = IndexRequest::new("users").id("2").version(3).into();
        let missing: DocWriteRequest = DeleteRequest::new("users", "9").into();

        let response = BulkResponse::new(
            vec![
                BulkItemResponse::success(&ok),
                BulkItemResponse::failure(&conflict, 409, "version conflict"),
                BulkItemResponse::failure(&missing, 404, "not found"),
            ],
            Duration::from_millis(3),
        );

        assert!(response.has_failures());
        assert_eq!(response.failed_count(), 2);
        assert_eq!(
            response.build_failure_message(),
            "failure in bulk execution:\n\
             [1]: index [users], type [index], id [2], status [409], message [version conflict]\n\
             [2]: index [users], type [delete], id [9], status [404], message [not found]"
        );
    }

    #[test]
    fn test_bulk_response_without_failures() {
        let request: DocWriteRequest = IndexRequest::new("users").into();
        let response = BulkResponse::new(
            vec![BulkItemResponse::success(&request)],
            Duration::default(),
        );
        assert!(!response.has_failures());
        assert_eq!(response.failed_count(), 0);
    }

    #[test]
    fn test_serialize_tags_operation() {
        let request: DocWriteRequest = DeleteRequest::new("users", "3").into();
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({"op": "delete", "index": "users", "id": "3"}));
    }
}
