//! Transport response types.
//!
//! This module provides [`TransportResponse`], the `{status, headers, data}`
//! triple every [`Transport`](crate::clients::Transport) resolves with.

use std::collections::HashMap;

use serde_json::Value;

/// Response headers keyed by lower-case name (headers may have multiple values).
pub type Headers = HashMap<String, Vec<String>>;

/// A resolved response from a transport.
#[derive(Clone, Debug, PartialEq)]
pub struct TransportResponse {
    /// The HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: Headers,
    /// The parsed (and transformed) response body; `null` when empty.
    pub data: Value,
}

impl TransportResponse {
    /// Creates a new response.
    #[must_use]
    pub const fn new(status: u16, headers: Headers, data: Value) -> Self {
        Self {
            status,
            headers,
            data,
        }
    }

    /// Creates a `200 OK` response with no headers.
    ///
    /// Convenient for in-memory transports.
    #[must_use]
    pub fn ok(data: Value) -> Self {
        Self::new(200, Headers::new(), data)
    }

    /// Returns `true` if the status code is 2xx.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status >= 200 && self.status <= 299
    }

    /// Returns the first value of a header, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}
