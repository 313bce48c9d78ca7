//! Outbound request types.
//!
//! This module provides the [`RequestConfig`] type and its builder. A
//! `RequestConfig` is what the action dispatcher hands to a
//! [`Transport`](crate::clients::Transport): the effective method, the
//! rendered URL, residual query parameters, the payload, and every
//! pass-through option an action descriptor can carry.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::clients::errors::InvalidHttpRequestError;
use crate::clients::Headers;

/// HTTP methods supported by resource actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// HTTP GET method for retrieving resources.
    Get,
    /// HTTP POST method for creating resources.
    Post,
    /// HTTP PUT method for replacing resources.
    Put,
    /// HTTP PATCH method for partially updating resources.
    Patch,
    /// HTTP DELETE method for removing resources.
    Delete,
    /// HTTP HEAD method.
    Head,
}

impl HttpMethod {
    /// Returns `true` if requests with this method carry a payload.
    ///
    /// POST, PUT, and PATCH carry a body; the rest do not.
    #[must_use]
    pub const fn has_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }

    /// Returns the canonical upper-case method name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = InvalidHttpRequestError;

    /// Parses a method name case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            _ => Err(InvalidHttpRequestError::InvalidMethod {
                method: s.to_string(),
            }),
        }
    }
}

impl Serialize for HttpMethod {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HttpMethod {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// How the transport should interpret a response body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Parse the body as JSON (an empty body becomes `null`).
    #[default]
    Json,
    /// Keep the body as a JSON string value.
    Text,
}

type RequestTransformFn = dyn Fn(Value, &HashMap<String, String>) -> Value + Send + Sync;
type ResponseTransformFn = dyn Fn(Value, &Headers) -> Value + Send + Sync;

/// A function applied to the outgoing payload before it is sent.
///
/// Receives the payload and the request headers.
#[derive(Clone)]
pub struct RequestTransform(Arc<RequestTransformFn>);

impl RequestTransform {
    /// Wraps a transform function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value, &HashMap<String, String>) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Applies the transform.
    #[must_use]
    pub fn apply(&self, data: Value, headers: &HashMap<String, String>) -> Value {
        (self.0)(data, headers)
    }
}

impl fmt::Debug for RequestTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RequestTransform(..)")
    }
}

/// A function applied to the parsed response body before it is reduced.
///
/// Receives the body and the response headers.
#[derive(Clone)]
pub struct ResponseTransform(Arc<ResponseTransformFn>);

impl ResponseTransform {
    /// Wraps a transform function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value, &Headers) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Applies the transform.
    #[must_use]
    pub fn apply(&self, data: Value, headers: &Headers) -> Value {
        (self.0)(data, headers)
    }
}

impl fmt::Debug for ResponseTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResponseTransform(..)")
    }
}

/// A request to be performed by a [`Transport`](crate::clients::Transport).
///
/// Query parameters in `params` are *not* encoded into `url`; encoding and
/// appending them is the transport's job.
///
/// # Example
///
/// ```rust
/// use drf_resource::clients::{HttpMethod, RequestConfig};
/// use serde_json::json;
///
/// let config = RequestConfig::builder(HttpMethod::Get, "/users/")
///     .param("search", "ada")
///     .build()
///     .unwrap();
/// assert_eq!(config.params.unwrap()["search"], json!("ada"));
/// ```
#[derive(Clone, Debug)]
pub struct RequestConfig {
    /// The effective HTTP method.
    pub method: HttpMethod,
    /// The rendered URL (relative or absolute), without query string.
    pub url: String,
    /// Residual query parameters.
    pub params: Option<Map<String, Value>>,
    /// The request payload.
    pub data: Option<Value>,
    /// Extra request headers.
    pub headers: Option<HashMap<String, String>>,
    /// Transforms applied to `data` before sending, in order.
    pub transform_request: Vec<RequestTransform>,
    /// Transforms applied to the response body after parsing, in order.
    pub transform_response: Vec<ResponseTransform>,
    /// Opaque cache token, forwarded verbatim.
    pub cache: Option<String>,
    /// Request timeout.
    pub timeout: Option<Duration>,
    /// Whether credentials should accompany the request.
    pub with_credentials: Option<bool>,
    /// How to interpret the response body.
    pub response_type: Option<ResponseType>,
}

impl RequestConfig {
    /// Creates a new builder for constructing a `RequestConfig`.
    #[must_use]
    pub fn builder(method: HttpMethod, url: impl Into<String>) -> RequestConfigBuilder {
        RequestConfigBuilder::new(method, url)
    }

    /// Validates the request.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError::EmptyUrl`] if `url` is empty.
    pub fn verify(&self) -> Result<(), InvalidHttpRequestError> {
        if self.url.trim().is_empty() {
            return Err(InvalidHttpRequestError::EmptyUrl);
        }
        Ok(())
    }

    /// Derives the request for a follow-up page.
    ///
    /// Everything is copied except the URL, which becomes `next`, and the
    /// query parameters, which are cleared because `next` already carries
    /// its own query string.
    #[must_use]
    pub fn follow(&self, next: impl Into<String>) -> Self {
        Self {
            url: next.into(),
            params: None,
            ..self.clone()
        }
    }
}

/// Builder for constructing [`RequestConfig`] instances.
#[derive(Debug)]
pub struct RequestConfigBuilder {
    config: RequestConfig,
}

impl RequestConfigBuilder {
    fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            config: RequestConfig {
                method,
                url: url.into(),
                params: None,
                data: None,
                headers: None,
                transform_request: Vec::new(),
                transform_response: Vec::new(),
                cache: None,
                timeout: None,
                with_credentials: None,
                response_type: None,
            },
        }
    }

    /// Sets all query parameters at once.
    #[must_use]
    pub fn params(mut self, params: Map<String, Value>) -> Self {
        self.config.params = Some(params);
        self
    }

    /// Adds a single query parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config
            .params
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Sets the request payload.
    #[must_use]
    pub fn data(mut self, data: impl Into<Value>) -> Self {
        self.config.data = Some(data.into());
        self
    }

    /// Adds a single header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config
            .headers
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Appends a request transform.
    #[must_use]
    pub fn transform_request(mut self, transform: RequestTransform) -> Self {
        self.config.transform_request.push(transform);
        self
    }

    /// Appends a response transform.
    #[must_use]
    pub fn transform_response(mut self, transform: ResponseTransform) -> Self {
        self.config.transform_response.push(transform);
        self
    }

    /// Sets the opaque cache token.
    #[must_use]
    pub fn cache(mut self, token: impl Into<String>) -> Self {
        self.config.cache = Some(token.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Sets whether credentials accompany the request.
    #[must_use]
    pub const fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.config.with_credentials = Some(with_credentials);
        self
    }

    /// Sets how the response body is interpreted.
    #[must_use]
    pub const fn response_type(mut self, response_type: ResponseType) -> Self {
        self.config.response_type = Some(response_type);
        self
    }

    /// Builds the [`RequestConfig`], validating it in the process.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError`] if the request fails validation.
    pub fn build(self) -> Result<RequestConfig, InvalidHttpRequestError> {
        self.config.verify()?;
        Ok(self.config)
    }
}
