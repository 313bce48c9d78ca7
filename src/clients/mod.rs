//! Transport layer.
//!
//! Resource classes talk to the network through the [`Transport`] trait.
//! This module defines that seam and its data types, and ships the
//! reqwest-backed [`HttpTransport`].
//!
//! # Overview
//!
//! - [`Transport`]: The async trait every transport implements
//! - [`RequestConfig`]: The outbound request (method, URL, query, payload, options)
//! - [`TransportResponse`]: The `{status, headers, data}` a transport resolves with
//! - [`HttpMethod`]: Supported HTTP methods
//! - [`RequestTransform`] / [`ResponseTransform`]: Payload/body transforms
//! - [`HttpTransport`]: The reqwest implementation
//! - [`TransportError`]: Why a transport rejected a request
//!
//! # Example
//!
//! ```rust,ignore
//! use drf_resource::clients::{HttpMethod, HttpTransport, RequestConfig, Transport};
//!
//! let transport = HttpTransport::new(None)?;
//! let request = RequestConfig::builder(HttpMethod::Get, "https://api.example.com/users/")
//!     .build()
//!     .unwrap();
//! let response = transport.request(request).await?;
//! println!("{}", response.data);
//! ```

mod errors;
mod http_client;
mod http_request;
mod http_response;
mod transport;

pub use errors::{HttpError, InvalidHttpRequestError, TransportError};
pub use http_client::{HttpTransport, SDK_VERSION};
pub use http_request::{
    HttpMethod, RequestConfig, RequestConfigBuilder, RequestTransform, ResponseTransform,
    ResponseType,
};
pub use http_response::{Headers, TransportResponse};
pub use transport::Transport;
