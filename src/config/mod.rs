//! Configuration types for the HTTP transport.
//!
//! This module provides the configuration consumed by
//! [`HttpTransport`](crate::clients::HttpTransport):
//!
//! - [`TransportConfig`]: The configuration struct holding transport settings
//! - [`TransportConfigBuilder`]: A builder for constructing [`TransportConfig`] instances
//! - [`BaseUrl`]: A validated base URL that relative resource URLs resolve against
//! - [`HeaderName`]: A validated HTTP header name
//!
//! # Example
//!
//! ```rust
//! use drf_resource::{BaseUrl, TransportConfig};
//! use std::time::Duration;
//!
//! let config = TransportConfig::builder()
//!     .base_url(BaseUrl::new("https://api.example.com").unwrap())
//!     .default_header("X-CSRFToken", "abc123")
//!     .timeout(Duration::from_secs(10))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.base_url().as_ref(), "https://api.example.com");
//! ```

mod newtypes;

pub use newtypes::{BaseUrl, HeaderName};

use std::collections::HashMap;
use std::time::Duration;

use crate::error::ConfigError;

/// Configuration for [`HttpTransport`](crate::clients::HttpTransport).
///
/// # Thread Safety
///
/// `TransportConfig` is `Clone`, `Send`, and `Sync`.
#[derive(Clone, Debug)]
pub struct TransportConfig {
    base_url: BaseUrl,
    default_headers: HashMap<HeaderName, String>,
    timeout: Option<Duration>,
    user_agent_prefix: Option<String>,
}

impl TransportConfig {
    /// Creates a new builder for constructing a `TransportConfig`.
    #[must_use]
    pub fn builder() -> TransportConfigBuilder {
        TransportConfigBuilder::new()
    }

    /// Returns the base URL.
    #[must_use]
    pub const fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Returns the headers sent with every request.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<HeaderName, String> {
        &self.default_headers
    }

    /// Returns the default timeout, used when an action does not set one.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }
}

// Verify TransportConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<TransportConfig>();
};

/// Builder for constructing [`TransportConfig`] instances.
///
/// `base_url` is required. Header names are validated at
/// [`build`](Self::build) time so the fluent chain stays infallible.
///
/// # Defaults
///
/// - `default_headers`: Empty
/// - `timeout`: `None` (no timeout)
/// - `user_agent_prefix`: `None`
#[derive(Debug, Default)]
pub struct TransportConfigBuilder {
    base_url: Option<BaseUrl>,
    default_headers: Vec<(String, String)>,
    timeout: Option<Duration>,
    user_agent_prefix: Option<String>,
}

impl TransportConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL (required).
    #[must_use]
    pub fn base_url(mut self, url: BaseUrl) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Sets the default request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Builds the [`TransportConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `base_url` is not set,
    /// or [`ConfigError::InvalidHeaderName`] for an invalid header name.
    pub fn build(self) -> Result<TransportConfig, ConfigError> {
        let base_url = self
            .base_url
            .ok_or(ConfigError::MissingRequiredField { field: "base_url" })?;

        let default_headers = self
            .default_headers
            .into_iter()
            .map(|(name, value)| Ok((HeaderName::new(name)?, value)))
            .collect::<Result<HashMap<_, _>, ConfigError>>()?;

        Ok(TransportConfig {
            base_url,
            default_headers,
            timeout: self.timeout,
            user_agent_prefix: self.user_agent_prefix,
        })
    }
}
