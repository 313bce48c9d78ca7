//! Parameter defaults and payload extraction.
//!
//! A default parameter value is one of three things:
//!
//! - a literal JSON value,
//! - a zero-argument function evaluated every time the parameter is needed,
//! - a path into the outgoing payload (`@id`, `@owner.id`, `@tags[0].slug`).
//!
//! Strings beginning with `@` become [`ParamDefault::FromPayload`] on
//! conversion, so `ParamDefault::from("@id")` reads the payload's `id` field.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Concrete parameter values, keyed by name.
pub type Params = Map<String, Value>;

/// Parameter defaults, keyed by name.
pub type ParamDefaults = BTreeMap<String, ParamDefault>;

type LazyFn = dyn Fn() -> Value + Send + Sync;

/// A default parameter value.
///
/// # Example
///
/// ```rust
/// use drf_resource::rest::ParamDefault;
/// use serde_json::json;
///
/// let payload = json!({"owner": {"id": 7}});
///
/// assert_eq!(ParamDefault::from("users").resolve(Some(&payload)), json!("users"));
/// assert_eq!(ParamDefault::from("@owner.id").resolve(Some(&payload)), json!(7));
/// assert_eq!(ParamDefault::lazy(|| json!(3)).resolve(None), json!(3));
/// ```
#[derive(Clone)]
pub enum ParamDefault {
    /// A fixed value.
    Literal(Value),
    /// A function evaluated each time the value is needed.
    Lazy(Arc<LazyFn>),
    /// A path into the outgoing payload.
    FromPayload(String),
}

impl ParamDefault {
    /// Creates a lazily evaluated default.
    pub fn lazy<F>(f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self::Lazy(Arc::new(f))
    }

    /// Creates a default read from the payload at `path` (without the `@`).
    pub fn from_payload(path: impl Into<String>) -> Self {
        Self::FromPayload(path.into())
    }

    /// Resolves the default to a concrete value.
    ///
    /// A lazy default whose result is itself an `@path` string is looked up
    /// in the payload. Unresolvable payload paths yield `null`.
    #[must_use]
    pub fn resolve(&self, payload: Option<&Value>) -> Value {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Lazy(f) => match f() {
                Value::String(s) if s.starts_with('@') => lookup_or_null(payload, &s[1..]),
                value => value,
            },
            Self::FromPayload(path) => lookup_or_null(payload, path),
        }
    }
}

fn lookup_or_null(payload: Option<&Value>, path: &str) -> Value {
    payload
        .and_then(|p| lookup(p, path))
        .cloned()
        .unwrap_or(Value::Null)
}

impl fmt::Debug for ParamDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Lazy(_) => f.write_str("Lazy(..)"),
            Self::FromPayload(path) => f.debug_tuple("FromPayload").field(path).finish(),
        }
    }
}

impl From<Value> for ParamDefault {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) if s.starts_with('@') => Self::FromPayload(s[1..].to_string()),
            value => Self::Literal(value),
        }
    }
}

impl From<&str> for ParamDefault {
    fn from(value: &str) -> Self {
        Value::from(value).into()
    }
}

impl From<String> for ParamDefault {
    fn from(value: String) -> Self {
        Value::from(value).into()
    }
}

impl From<i64> for ParamDefault {
    fn from(value: i64) -> Self {
        Self::Literal(value.into())
    }
}

impl From<u64> for ParamDefault {
    fn from(value: u64) -> Self {
        Self::Literal(value.into())
    }
}

impl From<bool> for ParamDefault {
    fn from(value: bool) -> Self {
        Self::Literal(value.into())
    }
}

impl<'de> Deserialize<'de> for ParamDefault {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Self::from)
    }
}

/// Merges `param_defaults` and `action_params` (the latter wins) and
/// resolves every entry against `payload`.
///
/// # Example
///
/// ```rust
/// use drf_resource::rest::{extract_params, ParamDefault, ParamDefaults};
/// use serde_json::json;
///
/// let mut defaults = ParamDefaults::new();
/// defaults.insert("id".into(), ParamDefault::from("@id"));
/// defaults.insert("format".into(), ParamDefault::from("json"));
///
/// let mut action = ParamDefaults::new();
/// action.insert("format".into(), ParamDefault::from("api"));
///
/// let params = extract_params(Some(&json!({"id": 4})), &action, &defaults);
/// assert_eq!(params["id"], json!(4));
/// assert_eq!(params["format"], json!("api"));
/// ```
#[must_use]
pub fn extract_params(
    payload: Option<&Value>,
    action_params: &ParamDefaults,
    param_defaults: &ParamDefaults,
) -> Params {
    let mut merged: BTreeMap<&str, &ParamDefault> = param_defaults
        .iter()
        .map(|(key, value)| (key.as_str(), value))
        .collect();
    merged.extend(action_params.iter().map(|(key, value)| (key.as_str(), value)));

    merged
        .into_iter()
        .map(|(key, default)| (key.to_string(), default.resolve(payload)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Key(String),
    Index(usize),
}

/// Reads the value at a dot/bracket `path` inside `value`.
///
/// Supports `a.b`, `a[0]`, `a["key"]`, `a['key']`, and any combination.
/// Returns `None` for malformed paths or missing values.
///
/// # Example
///
/// ```rust
/// use drf_resource::rest::lookup;
/// use serde_json::json;
///
/// let data = json!({"user": {"tags": [{"slug": "admin"}]}});
/// assert_eq!(lookup(&data, "user.tags[0].slug"), Some(&json!("admin")));
/// assert_eq!(lookup(&data, "user.missing"), None);
/// ```
#[must_use]
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    parse_path(path)?
        .iter()
        .try_fold(value, |current, segment| match segment {
            PathSegment::Key(key) => match current {
                Value::Object(map) => map.get(key),
                Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            },
            PathSegment::Index(index) => match current {
                Value::Array(items) => items.get(*index),
                Value::Object(map) => map.get(&index.to_string()),
                _ => None,
            },
        })
}

fn parse_path(path: &str) -> Option<Vec<PathSegment>> {
    let mut segments = Vec::new();
    let mut ident = String::new();
    let mut need_ident = true;
    let mut chars = path.trim().chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if ident.is_empty() {
                    return None;
                }
                segments.push(PathSegment::Key(std::mem::take(&mut ident)));
                need_ident = true;
            }
            '[' => {
                if !ident.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut ident)));
                } else if need_ident {
                    return None;
                }

                let mut inner = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == ']' {
                        closed = true;
                        break;
                    }
                    inner.push(c);
                }
                if !closed {
                    return None;
                }

                segments.push(parse_bracket(inner.trim())?);
                need_ident = false;

                match chars.peek() {
                    Some('.') => {
                        chars.next();
                        need_ident = true;
                    }
                    Some('[') | None => {}
                    Some(_) => return None,
                }
            }
            c => {
                ident.push(c);
                need_ident = false;
            }
        }
    }

    if !ident.is_empty() {
        segments.push(PathSegment::Key(ident));
    } else if need_ident {
        return None;
    }
    Some(segments)
}

fn parse_bracket(inner: &str) -> Option<PathSegment> {
    for quote in ['"', '\''] {
        if let Some(key) = inner
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return Some(PathSegment::Key(key.to_string()));
        }
    }
    inner.parse().ok().map(PathSegment::Index)
}
