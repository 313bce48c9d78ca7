//! Error types for crate configuration.
//!
//! This module contains the error type returned when building a
//! [`TransportConfig`](crate::TransportConfig) or a
//! [`ResourceClass`](crate::rest::ResourceClass) from invalid input.
//!
//! # Error Handling
//!
//! All configuration constructors return `Result<T, ConfigError>` to enable
//! fail-fast validation. Error messages are designed to be clear and actionable.
//!
//! # Example
//!
//! ```rust
//! use drf_resource::{BaseUrl, ConfigError};
//!
//! let result = BaseUrl::new("api.example.com");
//! assert!(matches!(result, Err(ConfigError::InvalidBaseUrl { .. })));
//! ```

use thiserror::Error;

/// Errors that can occur during configuration.
///
/// Each variant provides a clear, actionable error message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Base URL is invalid.
    #[error("Invalid base URL '{url}'. Please provide a URL with scheme and host (e.g., 'https://api.example.com').")]
    InvalidBaseUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// A resource URL template cannot be empty.
    #[error("URL template cannot be empty. Please provide a template such as '/users/:id/'.")]
    EmptyTemplate,

    /// An action was declared without a name.
    #[error("Action name cannot be empty.")]
    EmptyActionName,

    /// A default header name is not a valid HTTP header name.
    #[error("Invalid header name '{name}'. Header names must be non-empty visible ASCII without separators.")]
    InvalidHeaderName {
        /// The invalid header name that was provided.
        name: String,
    },

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },
}
