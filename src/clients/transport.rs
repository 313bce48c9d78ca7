//! The transport seam.
//!
//! Resource classes never perform network I/O themselves. They hand a
//! [`RequestConfig`] to an injected [`Transport`] and reduce whatever it
//! resolves with. [`HttpTransport`](crate::clients::HttpTransport) is the
//! reqwest-backed implementation; tests substitute in-memory transports.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::clients::{RequestConfig, TransportError, TransportResponse};

/// Performs a single request.
///
/// Implementations are responsible for encoding `config.params` into the
/// query string, applying `transform_request`/`transform_response`, and
/// honouring `timeout`. A non-2xx response must be reported as
/// [`TransportError::Status`].
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use drf_resource::clients::{RequestConfig, Transport, TransportError, TransportResponse};
/// use serde_json::json;
///
/// #[derive(Debug)]
/// struct Echo;
///
/// #[async_trait]
/// impl Transport for Echo {
///     async fn request(&self, config: RequestConfig) -> Result<TransportResponse, TransportError> {
///         Ok(TransportResponse::ok(json!({ "url": config.url })))
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Performs the request described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the request is invalid, cannot be
    /// sent, or the server answers with a non-2xx status.
    async fn request(&self, config: RequestConfig) -> Result<TransportResponse, TransportError>;
}
