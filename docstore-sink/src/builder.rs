use std::marker::PhantomData;
use std::sync::Arc;

use crate::Result;
use crate::client::ClientFn;
use crate::config::SinkSettings;
use crate::error::Error;
use crate::functions::{
    BulkRequestFn, DefaultOptions, MapToRequestFn, NewBulkRequest, OptionsFn,
};
use crate::sink::Sink;

/// Builder for a [Sink] writing items of type `T` through clients opened by `C`.
///
/// Items are mapped to requests with [SinkBuilder::map_to_request_fn] and collected in the
/// [crate::BulkRequest] returned by [SinkBuilder::bulk_request_fn] (an empty one by default).
/// [SinkBuilder::client_fn] and [SinkBuilder::map_to_request_fn] are required.
///
/// ```ignore
/// let sink = SinkBuilder::new()
///     .client_fn(StoreClientFn::new("http://localhost:9200"))
///     .map_to_request_fn(|user: User| {
///         IndexRequest::new("users").id(user.id).source(json!(user)).into()
///     })
///     .build()?;
/// ```
pub struct SinkBuilder<T, C> {
    settings: SinkSettings,
    client_fn: Option<C>,
    map_to_request_fn: Option<Arc<dyn MapToRequestFn<T>>>,
    bulk_request_fn: Arc<dyn BulkRequestFn>,
    options_fn: Arc<dyn OptionsFn>,
    _item: PhantomData<fn(T)>,
}

impl<T, C> Default for SinkBuilder<T, C> {
    fn default() -> Self {
        Self {
            settings: SinkSettings::default(),
            client_fn: None,
            map_to_request_fn: None,
            bulk_request_fn: Arc::new(NewBulkRequest),
            options_fn: Arc::new(DefaultOptions),
            _item: PhantomData,
        }
    }
}

impl<C> SinkBuilder<(), C>
where
    C: ClientFn,
{
    /// A builder without an item type yet, it is bound by [SinkBuilder::map_to_request_fn].
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T, C> SinkBuilder<T, C>
where
    C: ClientFn,
{
    /// Set the function opening a client to the store, once per worker. Required.
    pub fn client_fn(mut self, client_fn: C) -> Self {
        self.client_fn = Some(client_fn);
        self
    }

    /// Set the function creating the empty bulk that requests are added to.
    pub fn bulk_request_fn(mut self, bulk_request_fn: impl BulkRequestFn) -> Self {
        self.bulk_request_fn = Arc::new(bulk_request_fn);
        self
    }

    /// Set the function mapping an item to the request writing it. Required.
    ///
    /// Rebinds the item type of the builder to the mapper's input, dropping any mapper set
    /// before.
    pub fn map_to_request_fn<U>(
        self,
        map_to_request_fn: impl MapToRequestFn<U>,
    ) -> SinkBuilder<U, C> {
        let map_to_request_fn: Arc<dyn MapToRequestFn<U>> = Arc::new(map_to_request_fn);
        SinkBuilder {
            settings: self.settings,
            client_fn: self.client_fn,
            map_to_request_fn: Some(map_to_request_fn),
            bulk_request_fn: self.bulk_request_fn,
            options_fn: self.options_fn,
            _item: PhantomData,
        }
    }

    /// Set the function deriving the options of a bulk, e.g. to add an auth header.
    pub fn options_fn(mut self, options_fn: impl OptionsFn) -> Self {
        self.options_fn = Arc::new(options_fn);
        self
    }

    pub fn settings(mut self, settings: SinkSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.settings.name = name.into();
        self
    }

    pub fn local_parallelism(mut self, local_parallelism: usize) -> Self {
        self.settings.local_parallelism = local_parallelism;
        self
    }

    /// Build the sink, failing when a required function is missing.
    pub fn build(self) -> Result<Sink<T, C>> {
        let (client_fn, map_to_request_fn) = match (self.client_fn, self.map_to_request_fn) {
            (Some(client_fn), Some(map_to_request_fn)) => (client_fn, map_to_request_fn),
            (None, Some(_)) => return Err(Error::Config("client_fn is not set".to_string())),
            (Some(_), None) => {
                return Err(Error::Config("map_to_request_fn is not set".to_string()));
            }
            (None, None) => {
                return Err(Error::Config(
                    "client_fn and map_to_request_fn are not set".to_string(),
                ));
            }
        };
        self.settings.validate()?;

        Ok(Sink {
            name: self.settings.name,
            local_parallelism: self.settings.local_parallelism,
            client_fn: Arc::new(client_fn),
            map_to_request_fn,
            bulk_request_fn: self.bulk_request_fn,
            options_fn: self.options_fn,
            _item: PhantomData,
        })
    }
}
