//! Single-method capabilities the sink is configured with, and their defaults.
//!
//! Closures implement each of them through blanket impls, so both
//! `.options_fn(|_: &BulkRequest| RequestOptions::default())` and a named unit struct work.

use crate::request::{BulkRequest, DocWriteRequest, RequestOptions};

/// Maps an item of the stream to the request that writes it.
pub trait MapToRequestFn<T>: Send + Sync + 'static {
    fn map_to_request(&self, item: T) -> DocWriteRequest;
}

impl<T, F> MapToRequestFn<T> for F
where
    F: Fn(T) -> DocWriteRequest + Send + Sync + 'static,
{
    fn map_to_request(&self, item: T) -> DocWriteRequest {
        self(item)
    }
}

/// Creates the empty [BulkRequest] each new batch is accumulated in.
pub trait BulkRequestFn: Send + Sync + 'static {
    fn bulk_request(&self) -> BulkRequest;
}

impl<F> BulkRequestFn for F
where
    F: Fn() -> BulkRequest + Send + Sync + 'static,
{
    fn bulk_request(&self) -> BulkRequest {
        self()
    }
}

/// Derives the [RequestOptions] for a pending bulk, right before it is sent.
pub trait OptionsFn: Send + Sync + 'static {
    fn options(&self, request: &BulkRequest) -> RequestOptions;
}

impl<F> OptionsFn for F
where
    F: Fn(&BulkRequest) -> RequestOptions + Send + Sync + 'static,
{
    fn options(&self, request: &BulkRequest) -> RequestOptions {
        self(request)
    }
}

/// Default [BulkRequestFn], an empty bulk with no preset settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewBulkRequest;

impl BulkRequestFn for NewBulkRequest {
    fn bulk_request(&self) -> BulkRequest {
        BulkRequest::new()
    }
}

/// Default [OptionsFn], always [RequestOptions::default].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOptions;

impl OptionsFn for DefaultOptions {
    fn options(&self, _request: &BulkRequest) -> RequestOptions {
        RequestOptions::default()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::request::{IndexRequest, RefreshPolicy};

    struct ToIndex;

    impl MapToRequestFn<u32> for ToIndex {
        fn map_to_request(&self, item: u32) -> DocWriteRequest {
            IndexRequest::new("numbers")
                .id(item.to_string())
                .source(json!({ "value": item }))
                .into()
        }
    }

    #[test]
    fn test_defaults() {
        let bulk = NewBulkRequest.bulk_request();
        assert!(bulk.is_empty());
        assert_eq!(bulk.refresh_policy(), RefreshPolicy::None);
        assert_eq!(DefaultOptions.options(&bulk), RequestOptions::default());
    }

    #[test]
    fn test_struct_and_closure_mappers() {
        let request = ToIndex.map_to_request(7);
        assert_eq!(request.id(), Some("7"));

        let closure = |name: &'static str| -> DocWriteRequest { IndexRequest::new(name).into() };
        assert_eq!(closure.map_to_request("users").index(), "users");
    }

    #[test]
    fn test_closure_options_and_bulk_request() {
        let bulk_fn = || BulkRequest::new().with_refresh_policy(RefreshPolicy::WaitUntil);
        let bulk = bulk_fn.bulk_request();
        assert_eq!(bulk.refresh_policy(), RefreshPolicy::WaitUntil);

        let options_fn = |request: &BulkRequest| {
            RequestOptions::default().add_header("X-Bulk-Size", request.len().to_string())
        };
        assert_eq!(options_fn.options(&bulk).header("X-Bulk-Size"), Some("0"));
    }
}
