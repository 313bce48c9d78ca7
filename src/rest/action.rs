//! Action descriptors.
//!
//! An [`ActionDescriptor`] describes one named operation of a resource class:
//! its HTTP method, an optional URL overriding the class template, extra
//! parameter defaults, whether it returns a collection, and the options
//! forwarded to the transport.
//!
//! Every class starts from [`default_actions`]:
//!
//! | Action   | Method | Notes                              |
//! |----------|--------|------------------------------------|
//! | `get`    | GET    |                                    |
//! | `save`   | POST   | PUT when the payload has a non-null `id` |
//! | `update` | PUT    |                                    |
//! | `query`  | GET    | returns a collection               |
//! | `remove` | DELETE |                                    |
//! | `delete` | DELETE |                                    |
//!
//! # Example
//!
//! ```rust
//! use drf_resource::clients::HttpMethod;
//! use drf_resource::rest::ActionDescriptor;
//! use serde_json::json;
//!
//! let publish = ActionDescriptor::new(HttpMethod::Post)
//!     .url("/api/articles/:id/publish/")
//!     .param("id", "@id");
//!
//! // Descriptors can also be loaded from configuration
//! let recent: ActionDescriptor = serde_json::from_value(json!({
//!     "method": "get",
//!     "url": "/api/articles/recent/",
//!     "isArray": true,
//!     "timeout": 5000
//! }))
//! .unwrap();
//! assert!(recent.is_array);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::clients::{HttpMethod, RequestConfig, RequestTransform, ResponseTransform, ResponseType};
use crate::rest::params::{ParamDefault, ParamDefaults};
use crate::rest::path::RenderedUrl;

/// Actions keyed by name.
pub type Actions = BTreeMap<String, ActionDescriptor>;

/// Configuration of a single resource action.
///
/// Transforms cannot be expressed in configuration and are skipped when
/// deserializing; `timeout` is read as milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDescriptor {
    /// The declared HTTP method.
    pub method: HttpMethod,
    /// URL template used instead of the class template.
    #[serde(default)]
    pub url: Option<String>,
    /// Parameter defaults layered over the class defaults.
    #[serde(default)]
    pub params: ParamDefaults,
    /// Whether the action returns a collection.
    #[serde(default)]
    pub is_array: bool,
    /// Extra request headers.
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    /// Transforms applied to the payload before sending.
    #[serde(skip)]
    pub transform_request: Vec<RequestTransform>,
    /// Transforms applied to the response body.
    #[serde(skip)]
    pub transform_response: Vec<ResponseTransform>,
    /// Opaque cache token forwarded to the transport.
    #[serde(default)]
    pub cache: Option<String>,
    /// Request timeout.
    #[serde(default, deserialize_with = "deserialize_millis")]
    pub timeout: Option<Duration>,
    /// Whether credentials accompany the request.
    #[serde(default)]
    pub with_credentials: Option<bool>,
    /// How the transport interprets the response body.
    #[serde(default)]
    pub response_type: Option<ResponseType>,
    /// `(field, method)`: use `method` when the payload holds a non-null
    /// `field`.
    #[serde(default, alias = "method_if_field_has_value")]
    pub method_if_field_has_value: Option<(String, HttpMethod)>,
}

fn deserialize_millis<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
}

impl ActionDescriptor {
    /// Creates a descriptor for `method` with no other options.
    #[must_use]
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            url: None,
            params: ParamDefaults::new(),
            is_array: false,
            headers: None,
            transform_request: Vec::new(),
            transform_response: Vec::new(),
            cache: None,
            timeout: None,
            with_credentials: None,
            response_type: None,
            method_if_field_has_value: None,
        }
    }

    /// Sets the URL template.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Adds a parameter default.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamDefault>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Marks the action as returning a collection.
    #[must_use]
    pub const fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    /// Adds a request header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Appends a request transform.
    #[must_use]
    pub fn transform_request(mut self, transform: RequestTransform) -> Self {
        self.transform_request.push(transform);
        self
    }

    /// Appends a response transform.
    #[must_use]
    pub fn transform_response(mut self, transform: ResponseTransform) -> Self {
        self.transform_response.push(transform);
        self
    }

    /// Sets the opaque cache token.
    #[must_use]
    pub fn cache(mut self, token: impl Into<String>) -> Self {
        self.cache = Some(token.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets whether credentials accompany the request.
    #[must_use]
    pub const fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = Some(with_credentials);
        self
    }

    /// Sets how the response body is interpreted.
    #[must_use]
    pub const fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    /// Uses `method` instead of the declared one when the payload holds a
    /// non-null `field`.
    #[must_use]
    pub fn method_if_field_has_value(mut self, field: impl Into<String>, method: HttpMethod) -> Self {
        self.method_if_field_has_value = Some((field.into(), method));
        self
    }

    /// Returns `true` if the declared method carries a payload.
    #[must_use]
    pub const fn has_body(&self) -> bool {
        self.method.has_body()
    }

    /// Returns the method to use for a request carrying `data`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use drf_resource::clients::HttpMethod;
    /// use drf_resource::rest::default_actions;
    /// use serde_json::json;
    ///
    /// let save = &default_actions()["save"];
    /// assert_eq!(save.effective_method(Some(&json!({"name": "x"}))), HttpMethod::Post);
    /// assert_eq!(save.effective_method(Some(&json!({"id": null}))), HttpMethod::Post);
    /// assert_eq!(save.effective_method(Some(&json!({"id": 3}))), HttpMethod::Put);
    /// ```
    #[must_use]
    pub fn effective_method(&self, data: Option<&Value>) -> HttpMethod {
        match (&self.method_if_field_has_value, data) {
            (Some((field, alternate)), Some(Value::Object(record)))
                if record.get(field).is_some_and(|v| !v.is_null()) =>
            {
                *alternate
            }
            _ => self.method,
        }
    }

    /// Builds the transport request for this action.
    pub(crate) fn request_config(
        &self,
        method: HttpMethod,
        rendered: RenderedUrl,
        data: Option<Value>,
    ) -> RequestConfig {
        let params = (!rendered.query.is_empty()).then_some(rendered.query);
        RequestConfig {
            method,
            url: rendered.url,
            params,
            data,
            headers: self.headers.clone(),
            transform_request: self.transform_request.clone(),
            transform_response: self.transform_response.clone(),
            cache: self.cache.clone(),
            timeout: self.timeout,
            with_credentials: self.with_credentials,
            response_type: self.response_type,
        }
    }
}

/// Returns the built-in actions every resource class starts from.
#[must_use]
pub fn default_actions() -> Actions {
    let mut actions = Actions::new();
    actions.insert("get".into(), ActionDescriptor::new(HttpMethod::Get));
    actions.insert(
        "save".into(),
        ActionDescriptor::new(HttpMethod::Post).method_if_field_has_value("id", HttpMethod::Put),
    );
    actions.insert("update".into(), ActionDescriptor::new(HttpMethod::Put));
    actions.insert("query".into(), ActionDescriptor::new(HttpMethod::Get).array());
    actions.insert("remove".into(), ActionDescriptor::new(HttpMethod::Delete));
    actions.insert("delete".into(), ActionDescriptor::new(HttpMethod::Delete));
    actions
}

// Verify types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ActionDescriptor>();
};
