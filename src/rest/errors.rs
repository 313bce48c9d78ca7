//! Error types for resource actions.
//!
//! - [`ArgumentError`]: An action was called with arguments of the wrong
//!   number or kind. Always returned synchronously.
//! - [`ResourceError`]: Why an action failed, either synchronously (bad
//!   arguments, unknown action, no runtime) or asynchronously through the
//!   error callback and [`settled`](crate::rest::Live::settled).
//!
//! # Example
//!
//! ```rust,ignore
//! use drf_resource::rest::{Arg, ResourceError};
//!
//! let users = class.call("query", vec![])?;
//! match users.settled().await {
//!     Ok(response) => println!("{} users", response.data["count"]),
//!     Err(ResourceError::Transport(e)) => println!("Request failed: {e}"),
//!     Err(ResourceError::PaginationFetch { url, .. }) => {
//!         println!("Stopped at {url}, keeping what was loaded");
//!     }
//!     Err(e) => println!("Other error: {e}"),
//! }
//! ```

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

use crate::clients::TransportError;

/// Error returned when an action is called with the wrong arguments.
///
/// # Example
///
/// ```rust
/// use drf_resource::rest::ArgumentError;
///
/// let error = ArgumentError::Arity { max: 4, got: 5 };
/// assert_eq!(
///     error.to_string(),
///     "Expected between 0-4 arguments [params, data, success, error], got 5 arguments."
/// );
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    /// Too many positional arguments.
    #[error("Expected between 0-{max} arguments [{}], got {got} arguments.", signature(.max))]
    Arity {
        /// The maximum number of arguments accepted.
        max: usize,
        /// The number of arguments received.
        got: usize,
    },

    /// An argument of the wrong kind at `position` (1-based).
    #[error("Argument {position} must be {expected}.")]
    Kind {
        /// The 1-based argument position.
        position: usize,
        /// What was expected at that position.
        expected: &'static str,
    },
}

const fn signature(max: &usize) -> &'static str {
    if *max == 3 {
        "params, success, error"
    } else {
        "params, data, success, error"
    }
}

/// Why a follow-up page could not be loaded.
#[derive(Debug, Error, Clone)]
pub enum PageFetchError {
    /// The transport rejected the request.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The body was not a `{count, next, previous, results}` envelope.
    #[error("Response is not a pagination envelope: {0}")]
    NotAnEnvelope(String),
}

/// Error type for resource actions.
///
/// `ResourceError` is `Clone` so a single failure can be handed to the error
/// callback and to every awaiter of the live reference.
#[derive(Debug, Error, Clone)]
pub enum ResourceError {
    /// The action was called with invalid arguments.
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// No action with this name exists on the class.
    #[error("Unknown action '{name}'")]
    UnknownAction {
        /// The requested action name.
        name: String,
    },

    /// The action was called outside a Tokio runtime.
    #[error("Cannot dispatch action without a Tokio runtime: {0}")]
    Runtime(String),

    /// The transport rejected the request.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A follow-up page failed after earlier pages were loaded.
    ///
    /// Entries collected from earlier pages stay in the collection.
    #[error("Failed to fetch page {url}: {source}")]
    PaginationFetch {
        /// The `next` URL that failed.
        url: String,
        /// The underlying failure.
        #[source]
        source: PageFetchError,
    },
}

impl ResourceError {
    /// Returns the transport error behind this failure, if any.
    #[must_use]
    pub const fn transport_error(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(e)
            | Self::PaginationFetch {
                source: PageFetchError::Transport(e),
                ..
            } => Some(e),
            _ => None,
        }
    }

    /// Returns the HTTP status code, if the server responded.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.transport_error().and_then(TransportError::status)
    }

    /// Returns field validation errors from a `400 Bad Request` body.
    ///
    /// Django REST Framework reports validation failures as
    /// `{"field": ["message", ...]}`, with errors not tied to a field under
    /// `non_field_errors` and single-message failures under `detail`. Both
    /// of the latter are returned under `"base"`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use drf_resource::clients::TransportError;
    /// use drf_resource::rest::ResourceError;
    /// use serde_json::json;
    ///
    /// let error = ResourceError::Transport(TransportError::Status {
    ///     status: 400,
    ///     url: "/api/users/".to_string(),
    ///     data: json!({"email": ["Enter a valid email address."]}),
    ///     headers: Default::default(),
    /// });
    /// assert_eq!(error.field_errors()["email"], vec!["Enter a valid email address."]);
    /// ```
    #[must_use]
    pub fn field_errors(&self) -> HashMap<String, Vec<String>> {
        match self.transport_error() {
            Some(TransportError::Status {
                status: 400, data, ..
            }) => parse_field_errors(data),
            _ => HashMap::new(),
        }
    }
}

fn messages(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_str().map_or_else(|| v.to_string(), ToString::to_string))
            .collect(),
        Value::String(s) => vec![s.clone()],
        other => vec![other.to_string()],
    }
}

fn parse_field_errors(body: &Value) -> HashMap<String, Vec<String>> {
    let mut result = HashMap::new();

    match body {
        Value::Object(map) => {
            for (field, value) in map {
                let key = match field.as_str() {
                    "non_field_errors" | "detail" => "base",
                    other => other,
                };
                result
                    .entry(key.to_string())
                    .or_insert_with(Vec::new)
                    .extend(messages(value));
            }
        }
        Value::Array(_) | Value::String(_) => {
            let msgs = messages(body);
            if !msgs.is_empty() {
                result.insert("base".to_string(), msgs);
            }
        }
        _ => {}
    }

    result
}

// Verify error types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ArgumentError>();
    assert_send_sync::<ResourceError>();
};
