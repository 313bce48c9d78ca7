//! URL template rendering.
//!
//! A [`Route`] wraps a template such as `/api/users/:id/` and renders it
//! against a set of parameters. Placeholders are `:name` tokens made of word
//! characters (`A-Z a-z 0-9 _`) that are not purely numeric, so the port in
//! `http://localhost:8080/` is left alone. A literal colon is written `\:`.
//!
//! # Rendering
//!
//! - A placeholder with a non-null value is replaced by the value, encoded
//!   with [`encode_uri_segment`].
//! - A placeholder with no value (or `null`) is removed. When it sits between
//!   two slashes the separator collapses, so `/users/:id/posts/` renders as
//!   `/users/posts/` and `/users/:id/` as `/users/`.
//! - Parameters that do not name a placeholder are returned as residual query
//!   parameters.
//!
//! # Example
//!
//! ```rust
//! use drf_resource::rest::Route;
//! use serde_json::json;
//!
//! let route = Route::new("/api/users/:id/");
//!
//! let params = json!({"id": 7, "expand": "groups"});
//! let rendered = route.render(params.as_object().unwrap(), None, None);
//! assert_eq!(rendered.url, "/api/users/7/");
//! assert_eq!(rendered.query["expand"], json!("groups"));
//!
//! let rendered = route.render(&Default::default(), None, None);
//! assert_eq!(rendered.url, "/api/users/");
//! ```

use serde_json::Value;

use crate::rest::codec::{encode_uri_segment, stringify};
use crate::rest::params::{ParamDefaults, Params};

/// Appended before rendering so every placeholder is followed by a
/// non-word character, and stripped afterwards.
const SENTINEL: char = '#';

/// The result of rendering a [`Route`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedUrl {
    /// The rendered URL, without query string.
    pub url: String,
    /// Parameters that were not consumed by a placeholder.
    pub query: Params,
}

/// A URL template with optional placeholder defaults.
#[derive(Debug, Clone)]
pub struct Route {
    template: String,
    defaults: ParamDefaults,
}

impl Route {
    /// Creates a route without defaults.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            defaults: ParamDefaults::new(),
        }
    }

    /// Sets the defaults consulted for placeholders missing from the
    /// render parameters.
    #[must_use]
    pub fn with_defaults(mut self, defaults: ParamDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Returns the template.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the placeholder defaults.
    #[must_use]
    pub const fn defaults(&self) -> &ParamDefaults {
        &self.defaults
    }

    /// Returns the placeholder names of the route's template, in order of
    /// first appearance.
    #[must_use]
    pub fn placeholders(&self) -> Vec<String> {
        discover_placeholders(&format!("{}{SENTINEL}", self.template))
    }

    /// Renders the route.
    ///
    /// `action_url`, when given, replaces the route's own template. An
    /// explicit entry in `params` takes precedence over the route default for
    /// the same name, even when the entry is `null`. Defaults read from the
    /// payload are resolved against `payload`.
    #[must_use]
    pub fn render(
        &self,
        params: &Params,
        payload: Option<&Value>,
        action_url: Option<&str>,
    ) -> RenderedUrl {
        let mut url = format!("{}{SENTINEL}", action_url.unwrap_or(&self.template));
        let placeholders = discover_placeholders(&url);
        url = url.replace("\\:", ":");

        for name in &placeholders {
            let value = match params.get(name) {
                Some(value) => Some(value.clone()),
                None => self.defaults.get(name).map(|d| d.resolve(payload)),
            };

            let encoded = value
                .filter(|v| !v.is_null())
                .map(|v| encode_uri_segment(&stringify(&v)));
            url = substitute(&url, name, encoded.as_deref());
        }

        if url.ends_with(SENTINEL) {
            url.pop();
        }

        let query = params
            .iter()
            .filter(|(key, _)| !placeholders.contains(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        RenderedUrl { url, query }
    }
}

const fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Finds the placeholder names in `url`, in order of first appearance.
fn discover_placeholders(url: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for token in url.split(|c: char| !is_word_char(c)) {
        if token.is_empty()
            || token.chars().all(|c| c.is_ascii_digit())
            || names.iter().any(|n| n == token)
        {
            continue;
        }
        if has_unescaped_occurrence(url, token) {
            names.push(token.to_string());
        }
    }
    names
}

/// Returns `true` if `:name` occurs in `url` not preceded by a backslash and
/// followed by a non-word character or the end.
fn has_unescaped_occurrence(url: &str, name: &str) -> bool {
    let needle = format!(":{name}");
    url.match_indices(&needle).any(|(pos, _)| {
        let escaped = url[..pos].ends_with('\\');
        let bounded = url[pos + needle.len()..]
            .chars()
            .next()
            .map_or(true, |c| !is_word_char(c));
        !escaped && bounded
    })
}

/// Replaces every bounded `:name` in `url` with `value`, or removes it when
/// `value` is `None`, collapsing the separator in front of a following `/`.
fn substitute(url: &str, name: &str, value: Option<&str>) -> String {
    let needle = format!(":{name}");
    let mut out = String::with_capacity(url.len());
    let mut rest = url;

    while let Some(pos) = rest.find(&needle) {
        let after = &rest[pos + needle.len()..];
        out.push_str(&rest[..pos]);

        let bounded = after.chars().next().map_or(true, |c| !is_word_char(c));
        if !bounded {
            out.push_str(&needle);
        } else if let Some(value) = value {
            out.push_str(value);
        } else if after.starts_with('/') && out.ends_with('/') {
            out.pop();
        }
        rest = after;
    }

    out.push_str(rest);
    out
}

// Verify types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Route>();
    assert_send_sync::<RenderedUrl>();
};
