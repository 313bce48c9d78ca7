//! Response reduction.
//!
//! Once the transport answers, the body is folded into the live reference
//! the call returned:
//!
//! - Collection actions accept a bare JSON array or a Django REST Framework
//!   pagination envelope, `{count, next, previous, results}`. Envelopes are
//!   followed through their `next` links until the last page (or the
//!   `paginationLimit`) is reached, and success is reported once, after the
//!   final page.
//!   Every entry becomes an [`Instance`]; entries that are not objects
//!   become empty ones so the collection keeps the server's length.
//! - Instance actions replace the instance's fields with the returned object,
//!   keeping the instance's identity.
//!
//! # Example
//!
//! ```rust
//! use drf_resource::rest::ResponseBody;
//! use serde_json::json;
//!
//! let body = ResponseBody::classify(json!({
//!     "count": 3,
//!     "next": "http://api.example.com/users/?page=2",
//!     "previous": null,
//!     "results": [{"id": 1}, {"id": 2}]
//! }));
//!
//! match body {
//!     ResponseBody::Page(page) => {
//!         assert_eq!(page.results.len(), 2);
//!         assert!(page.next.is_some());
//!     }
//!     _ => unreachable!(),
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clients::{RequestConfig, TransportResponse};
use crate::rest::args::{ErrorFn, SuccessFn};
use crate::rest::errors::{PageFetchError, ResourceError};
use crate::rest::live::{Collection, Instance, Live, Record, ResponseParts};
use crate::rest::resource::ResourceClass;

/// One page of a paginated list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Total number of results across all pages.
    #[serde(default)]
    pub count: Option<u64>,
    /// Absolute URL of the next page.
    #[serde(default)]
    pub next: Option<String>,
    /// Absolute URL of the previous page.
    #[serde(default)]
    pub previous: Option<String>,
    /// The results on this page.
    pub results: Vec<Value>,
}

/// The shape of a response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// `null` or no body.
    Empty,
    /// A pagination envelope.
    Page(Page),
    /// A bare array.
    Items(Vec<Value>),
    /// Any other object.
    Record(Record),
    /// A scalar.
    Other(Value),
}

impl ResponseBody {
    /// Decides the shape of `data`.
    ///
    /// An object is an envelope when it has both `count` and `results` and
    /// `results` is an array.
    #[must_use]
    pub fn classify(data: Value) -> Self {
        match data {
            Value::Null => Self::Empty,
            Value::Array(items) => Self::Items(items),
            Value::Object(map) if map.contains_key("count") && map.contains_key("results") => {
                match serde_json::from_value::<Page>(Value::Object(map.clone())) {
                    Ok(page) => Self::Page(page),
                    Err(_) => Self::Record(map),
                }
            }
            Value::Object(map) => Self::Record(map),
            other => Self::Other(other),
        }
    }
}

/// One in-flight action call.
pub(crate) struct Dispatch {
    pub(crate) action: String,
    pub(crate) class: ResourceClass,
    pub(crate) live: Live,
    pub(crate) generation: u64,
    pub(crate) config: RequestConfig,
    pub(crate) limit: Option<usize>,
    pub(crate) success: Option<SuccessFn>,
    pub(crate) error: Option<ErrorFn>,
}

impl Dispatch {
    /// Performs the request, reduces the response and settles the reference.
    pub(crate) async fn run(self) {
        let sequence = self.live.lifecycle().sequence();
        let _turn = sequence.lock_owned().await;

        let result = self.class.transport().request(self.config.clone()).await;
        self.live.lifecycle().publish_transport(self.generation, &result);

        let outcome = match result {
            Ok(response) => self.reduce(response).await,
            Err(e) => Err(ResourceError::Transport(e)),
        };
        self.settle(outcome);
    }

    async fn reduce(&self, response: TransportResponse) -> Result<ResponseParts, ResourceError> {
        let parts = ResponseParts::from(&response);
        match &self.live {
            Live::Collection(collection) => self.fill(collection, response.data).await?,
            Live::Instance(instance) => self.replace(instance, response.data),
        }
        Ok(parts)
    }

    async fn fill(&self, collection: &Collection, data: Value) -> Result<(), ResourceError> {
        match ResponseBody::classify(data) {
            ResponseBody::Empty => {}
            ResponseBody::Page(page) => {
                collection.clear();
                self.paginate(collection, page).await?;
            }
            ResponseBody::Items(items) => {
                collection.clear();
                collection.extend(self.wrap(items));
            }
            ResponseBody::Record(_) | ResponseBody::Other(_) => {
                collection.clear();
                tracing::warn!(
                    action = %self.action,
                    "Expected an array or a paginated response for an array action"
                );
            }
        }
        Ok(())
    }

    async fn paginate(&self, collection: &Collection, first: Page) -> Result<(), ResourceError> {
        let mut page = first;
        loop {
            collection.extend(self.wrap(page.results));

            let more = self.limit.map_or(true, |limit| collection.len() < limit);
            let next = match page.next {
                Some(next) if more => next,
                _ => return Ok(()),
            };

            tracing::debug!(action = %self.action, url = %next, loaded = collection.len(), "Following next page");
            let failed = |source: PageFetchError| ResourceError::PaginationFetch {
                url: next.clone(),
                source,
            };

            let response = self
                .class
                .transport()
                .request(self.config.follow(next.clone()))
                .await
                .map_err(|e| failed(e.into()))?;
            page = serde_json::from_value(response.data)
                .map_err(|e| failed(PageFetchError::NotAnEnvelope(e.to_string())))?;
        }
    }

    fn replace(&self, instance: &Instance, data: Value) {
        match data {
            Value::Null => {}
            Value::Object(record) => instance.replace(record),
            _ => tracing::warn!(
                action = %self.action,
                "Expected an object for a non-array action; leaving the instance unchanged"
            ),
        }
    }

    fn wrap(&self, items: Vec<Value>) -> Vec<Instance> {
        items
            .into_iter()
            .map(|item| match item {
                Value::Object(record) => Instance::new(self.class.clone(), record),
                other => {
                    tracing::warn!(action = %self.action, item = %other, "Wrapping non-object item as an empty record");
                    Instance::new(self.class.clone(), Record::new())
                }
            })
            .collect()
    }

    fn settle(self, outcome: Result<ResponseParts, ResourceError>) {
        let lifecycle = self.live.lifecycle();
        lifecycle.complete();

        match &outcome {
            Ok(parts) => {
                if let Some(success) = &self.success {
                    success(&self.live, &parts.headers);
                }
            }
            Err(error) => match &self.error {
                Some(callback) => callback(error),
                None => tracing::debug!(action = %self.action, error = %error, "Action failed without an error callback"),
            },
        }

        // A call started from the callback supersedes this one
        lifecycle.publish(self.generation, outcome);
    }
}
