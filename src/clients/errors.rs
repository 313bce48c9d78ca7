//! Transport error types.
//!
//! This module contains the error types for the transport layer:
//!
//! - [`InvalidHttpRequestError`]: When a request fails validation before sending
//! - [`TransportError`]: When the transport rejects a request (status or network)
//! - [`HttpError`]: When the reqwest-backed transport cannot be constructed
//!
//! # Example
//!
//! ```rust,ignore
//! use drf_resource::clients::{Transport, TransportError};
//!
//! match transport.request(config).await {
//!     Ok(response) => println!("Success: {}", response.data),
//!     Err(TransportError::Status { status, data, .. }) => {
//!         println!("API error {status}: {data}");
//!     }
//!     Err(TransportError::Network { message, .. }) => {
//!         println!("Network error: {message}");
//!     }
//!     Err(TransportError::InvalidRequest(e)) => {
//!         println!("Invalid request: {e}");
//!     }
//! }
//! ```

use serde_json::Value;
use thiserror::Error;

use crate::clients::Headers;

/// Error returned when a request fails validation.
///
/// This error is raised before a request is sent.
///
/// # Example
///
/// ```rust
/// use drf_resource::clients::InvalidHttpRequestError;
///
/// let error = InvalidHttpRequestError::InvalidMethod {
///     method: "BREW".to_string(),
/// };
/// assert_eq!(error.to_string(), "Invalid Http method BREW.");
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidHttpRequestError {
    /// The HTTP method is not one of the supported methods.
    #[error("Invalid Http method {method}.")]
    InvalidMethod {
        /// The invalid method that was provided.
        method: String,
    },

    /// The request URL is empty.
    #[error("Cannot send a request without a url.")]
    EmptyUrl,
}

/// Error returned when the transport rejects a request.
///
/// `TransportError` is `Clone` so that a single failure can be delivered to
/// an error callback and to every awaiter of a live reference.
#[derive(Debug, Error, Clone)]
pub enum TransportError {
    /// The server answered with a non-2xx status.
    #[error("Request to {url} failed with status {status}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The requested URL.
        url: String,
        /// The parsed response body.
        data: Value,
        /// The response headers.
        headers: Headers,
    },

    /// The request never produced a response (connection, DNS, timeout).
    #[error("Network error for {url}: {message}")]
    Network {
        /// The requested URL.
        url: String,
        /// Description of the failure.
        message: String,
    },

    /// The request failed validation.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidHttpRequestError),
}

impl TransportError {
    /// Returns the HTTP status code, if the server responded.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the response body, if the server responded.
    #[must_use]
    pub const fn data(&self) -> Option<&Value> {
        match self {
            Self::Status { data, .. } => Some(data),
            _ => None,
        }
    }
}

/// Error returned when the reqwest-backed transport cannot be constructed.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The underlying HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
