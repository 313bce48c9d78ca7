//! RFC 3986 percent-encoding for URL path segments and query components.
//!
//! `urlencoding::encode` escapes everything outside `A-Z a-z 0-9 - _ . ~`,
//! which is too aggressive for both places a parameter can land:
//!
//! ```text
//! segment     = *pchar
//! query       = *( pchar / "/" / "?" )
//! pchar       = unreserved / pct-encoded / sub-delims / ":" / "@"
//! unreserved  = ALPHA / DIGIT / "-" / "." / "_" / "~"
//! sub-delims  = "!" / "$" / "&" / "'" / "(" / ")"
//!             / "*" / "+" / "," / ";" / "="
//! ```
//!
//! The functions here start from that encoding and selectively restore the
//! characters each context allows.

use serde_json::{Map, Value};

/// Characters `encodeURIComponent` leaves alone beyond `urlencoding`'s set.
const COMPONENT_SAFE: &[u8] = b"!'()*";
/// Additionally allowed inside a query key or value.
const QUERY_SAFE: &[u8] = b"@:$,";
/// Additionally allowed inside a path segment.
const SEGMENT_SAFE: &[u8] = b"&=+";

/// Encodes a value for use inside a URL path segment.
///
/// `@`, `:`, `$`, `,`, `&`, `=`, `+` and the other `pchar`s stay literal;
/// `/`, `?`, `#`, `%` are escaped and spaces become `%20`.
///
/// # Example
///
/// ```rust
/// use drf_resource::rest::encode_uri_segment;
///
/// assert_eq!(encode_uri_segment("a@b:c"), "a@b:c");
/// assert_eq!(encode_uri_segment("x=1&y=2+3"), "x=1&y=2+3");
/// assert_eq!(encode_uri_segment("a/b c"), "a%2Fb%20c");
/// ```
#[must_use]
pub fn encode_uri_segment(value: &str) -> String {
    restore(
        &urlencoding::encode(value),
        |b| COMPONENT_SAFE.contains(&b) || QUERY_SAFE.contains(&b) || SEGMENT_SAFE.contains(&b),
        true,
    )
}

/// Encodes a query key or value.
///
/// `@`, `:`, `$`, `,` stay literal; `&`, `=`, `+` are escaped. Spaces are
/// rendered as `%20` when `pct_encode_spaces` is set, otherwise as `+`.
///
/// # Example
///
/// ```rust
/// use drf_resource::rest::encode_uri_query;
///
/// assert_eq!(encode_uri_query("a b@c", false), "a+b@c");
/// assert_eq!(encode_uri_query("a b", true), "a%20b");
/// assert_eq!(encode_uri_query("x=1&y", false), "x%3D1%26y");
/// ```
#[must_use]
pub fn encode_uri_query(value: &str, pct_encode_spaces: bool) -> String {
    restore(
        &urlencoding::encode(value),
        |b| COMPONENT_SAFE.contains(&b) || QUERY_SAFE.contains(&b),
        pct_encode_spaces,
    )
}

/// Rewrites `%XX` triplets whose decoded byte is `allowed` back to the
/// literal character, and `%20` to `+` unless `pct_encode_spaces`.
fn restore(encoded: &str, allowed: impl Fn(u8) -> bool, pct_encode_spaces: bool) -> String {
    let bytes = encoded.as_bytes();
    let mut out = String::with_capacity(encoded.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let decoded = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            match decoded {
                Some(b' ') if !pct_encode_spaces => {
                    out.push('+');
                    i += 3;
                    continue;
                }
                Some(b) if b.is_ascii() && allowed(b) => {
                    out.push(char::from(b));
                    i += 3;
                    continue;
                }
                _ => {}
            }
        }
        out.push(char::from(bytes[i]));
        i += 1;
    }
    out
}

/// Renders a parameter value as the text that gets encoded.
///
/// Strings are used raw; everything else uses its JSON text.
#[must_use]
pub(crate) fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Builds an encoded query string from residual parameters.
///
/// Keys are emitted in sorted order. `null` values are skipped, arrays repeat
/// the key once per non-null element, and objects are sent as JSON text.
///
/// # Example
///
/// ```rust
/// use drf_resource::rest::build_query_string;
/// use serde_json::json;
///
/// let params = json!({"tag": ["a", "b c"], "page": 2, "skip": null});
/// let query = build_query_string(params.as_object().unwrap());
/// assert_eq!(query, "page=2&tag=a&tag=b+c");
/// ```
#[must_use]
pub fn build_query_string(params: &Map<String, Value>) -> String {
    let mut parts = Vec::new();
    for (key, value) in params {
        let values: Vec<&Value> = match value {
            Value::Null => continue,
            Value::Array(items) => items.iter().filter(|v| !v.is_null()).collect(),
            other => vec![other],
        };
        for value in values {
            parts.push(format!(
                "{}={}",
                encode_uri_query(key, false),
                encode_uri_query(&stringify(value), false)
            ));
        }
    }
    parts.join("&")
}
