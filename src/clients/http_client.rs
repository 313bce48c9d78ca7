//! reqwest-backed transport.
//!
//! This module provides [`HttpTransport`], the default
//! [`Transport`](crate::clients::Transport) implementation.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::clients::errors::{HttpError, TransportError};
use crate::clients::http_request::{HttpMethod, RequestConfig, ResponseType};
use crate::clients::http_response::{Headers, TransportResponse};
use crate::clients::transport::Transport;
use crate::config::{BaseUrl, TransportConfig};
use crate::rest::codec::build_query_string;

/// Crate version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// HTTP transport for talking to a REST backend.
///
/// The transport handles:
/// - Resolving relative URLs against the configured [`BaseUrl`]
/// - Encoding residual query parameters
/// - Default headers including User-Agent and `Accept: application/json`
/// - Request/response transforms and per-request timeouts
///
/// It performs exactly one attempt per request. `cache` and
/// `with_credentials` are carried on [`RequestConfig`] for transports that
/// use them; this one ignores both.
///
/// # Thread Safety
///
/// `HttpTransport` is `Send + Sync`, making it safe to share across async tasks.
///
/// # Example
///
/// ```rust,ignore
/// use drf_resource::{BaseUrl, TransportConfig};
/// use drf_resource::clients::{HttpMethod, HttpTransport, RequestConfig, Transport};
///
/// let config = TransportConfig::builder()
///     .base_url(BaseUrl::new("https://api.example.com").unwrap())
///     .build()
///     .unwrap();
/// let transport = HttpTransport::new(Some(&config))?;
///
/// let request = RequestConfig::builder(HttpMethod::Get, "/users/")
///     .param("page", 2)
///     .build()
///     .unwrap();
///
/// let response = transport.request(request).await?;
/// ```
#[derive(Debug)]
pub struct HttpTransport {
    /// The internal reqwest HTTP client.
    client: reqwest::Client,
    /// Base URL relative request URLs are joined onto.
    base_url: Option<BaseUrl>,
    /// Default headers to include in all requests.
    default_headers: HashMap<String, String>,
    /// Timeout used when a request does not set one.
    default_timeout: Option<Duration>,
}

// Verify HttpTransport is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpTransport>();
};

impl HttpTransport {
    /// Creates a new HTTP transport.
    ///
    /// Without a configuration, request URLs must be absolute.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Client`] if the underlying reqwest client cannot
    /// be created (e.g., TLS initialization failure).
    pub fn new(config: Option<&TransportConfig>) -> Result<Self, HttpError> {
        let user_agent_prefix = config
            .and_then(TransportConfig::user_agent_prefix)
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let rust_version = env!("CARGO_PKG_RUST_VERSION");
        let user_agent = format!("{user_agent_prefix}drf-resource v{SDK_VERSION} | Rust {rust_version}");

        let mut default_headers = HashMap::new();
        default_headers.insert("User-Agent".to_string(), user_agent);
        default_headers.insert("Accept".to_string(), "application/json".to_string());
        if let Some(config) = config {
            for (name, value) in config.default_headers() {
                default_headers.insert(name.as_ref().to_string(), value.clone());
            }
        }

        let client = reqwest::Client::builder().use_rustls_tls().build()?;

        Ok(Self {
            client,
            base_url: config.map(|c| c.base_url().clone()),
            default_headers,
            default_timeout: config.and_then(TransportConfig::timeout),
        })
    }

    /// Returns the base URL, if configured.
    #[must_use]
    pub const fn base_url(&self) -> Option<&BaseUrl> {
        self.base_url.as_ref()
    }

    /// Returns the default headers for this transport.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Builds the full URL for a request: base URL, rendered path, and the
    /// encoded residual query parameters.
    #[must_use]
    pub fn resolve_url(&self, config: &RequestConfig) -> String {
        let mut url = self
            .base_url
            .as_ref()
            .map_or_else(|| config.url.clone(), |base| base.join(&config.url));

        if let Some(params) = &config.params {
            let query = build_query_string(params);
            if !query.is_empty() {
                url.push(if url.contains('?') { '&' } else { '?' });
                url.push_str(&query);
            }
        }
        url
    }

    fn reqwest_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }

    /// Parses response headers into a `HashMap`.
    fn parse_response_headers(headers: &reqwest::header::HeaderMap) -> Headers {
        let mut result: Headers = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }

    /// Interprets a response body according to `response_type`.
    fn parse_body(text: String, response_type: ResponseType) -> Value {
        if text.trim().is_empty() {
            return Value::Null;
        }
        match response_type {
            ResponseType::Json => serde_json::from_str(&text).unwrap_or(Value::String(text)),
            ResponseType::Text => Value::String(text),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, config: RequestConfig) -> Result<TransportResponse, TransportError> {
        config.verify()?;

        let url = self.resolve_url(&config);
        let network = |e: reqwest::Error| TransportError::Network {
            url: url.clone(),
            message: e.to_string(),
        };

        // Merge headers
        let mut headers = self.default_headers.clone();
        if config.data.is_some() {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }
        if let Some(extra) = &config.headers {
            for (key, value) in extra {
                headers.insert(key.clone(), value.clone());
            }
        }

        let body = config.data.clone().map(|data| {
            config
                .transform_request
                .iter()
                .fold(data, |acc, transform| transform.apply(acc, &headers))
        });

        let mut req_builder = self
            .client
            .request(Self::reqwest_method(config.method), &url);
        for (key, value) in &headers {
            req_builder = req_builder.header(key, value);
        }
        if let Some(timeout) = config.timeout.or(self.default_timeout) {
            req_builder = req_builder.timeout(timeout);
        }
        if let Some(body) = body {
            // A transform may already have serialized the payload
            let body = match body {
                Value::String(raw) => raw,
                other => other.to_string(),
            };
            req_builder = req_builder.body(body);
        }

        tracing::trace!(method = %config.method, url = %url, "sending request");
        let res = req_builder.send().await.map_err(network)?;

        let status = res.status().as_u16();
        let res_headers = Self::parse_response_headers(res.headers());
        let text = res.text().await.map_err(network)?;

        let data = Self::parse_body(text, config.response_type.unwrap_or_default());
        let data = config
            .transform_response
            .iter()
            .fold(data, |acc, transform| transform.apply(acc, &res_headers));

        tracing::trace!(status, url = %url, "received response");

        if (200..300).contains(&status) {
            Ok(TransportResponse::new(status, res_headers, data))
        } else {
            Err(TransportError::Status {
                status,
                url,
                data,
                headers: res_headers,
            })
        }
    }
}
