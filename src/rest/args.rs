//! Positional argument resolution for action calls.
//!
//! Actions accept a short list of positional [`Arg`]s whose meaning depends
//! on how many there are, which ones are callbacks, and whether the action
//! sends a body. [`resolve_class_args`] and [`resolve_instance_args`] turn
//! that list into a [`CallArgs`].
//!
//! Class calls take up to four arguments, `[params, data, success, error]`:
//!
//! | Arguments                         | Meaning                                  |
//! |-----------------------------------|------------------------------------------|
//! | `()`                              | no params, no data                       |
//! | `(success)`                       |                                          |
//! | `(x)`                             | `x` is data for POST/PUT/PATCH, else params |
//! | `(success, error)`                |                                          |
//! | `(x, success[, error])`           | `x` as above                             |
//! | `(params, data[, success[, error]])` |                                       |
//!
//! Instance calls take up to three, `[params, success, error]`, and default
//! their params to the class defaults resolved against the instance.
//!
//! # Example
//!
//! ```rust
//! use drf_resource::rest::{resolve_class_args, Arg};
//! use serde_json::json;
//!
//! let args = vec![Arg::from(json!({"name": "Ada"})), Arg::success(|_, _| {})];
//!
//! // POST: the first argument is the payload
//! let call = resolve_class_args(args.clone(), true).unwrap();
//! assert_eq!(call.data, Some(json!({"name": "Ada"})));
//! assert!(call.params.is_empty());
//!
//! // GET: the first argument is the query
//! let call = resolve_class_args(args, false).unwrap();
//! assert_eq!(call.params["name"], json!("Ada"));
//! assert!(call.data.is_none());
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::clients::Headers;
use crate::rest::errors::{ArgumentError, ResourceError};
use crate::rest::live::Live;
use crate::rest::params::Params;

/// Callback invoked once an action settles successfully.
pub type SuccessFn = Arc<dyn Fn(&Live, &Headers) + Send + Sync>;

/// Callback invoked once an action fails.
pub type ErrorFn = Arc<dyn Fn(&ResourceError) + Send + Sync>;

const EXPECT_PARAMS: &str = "a parameter object";
const EXPECT_VALUE: &str = "a value";
const EXPECT_SUCCESS: &str = "a success callback";
const EXPECT_ERROR: &str = "an error callback";

/// A positional action argument.
#[derive(Clone)]
pub enum Arg {
    /// Parameters or payload.
    Value(Value),
    /// A success callback.
    Success(SuccessFn),
    /// An error callback.
    Error(ErrorFn),
}

impl Arg {
    /// Wraps a success callback.
    pub fn success<F>(f: F) -> Self
    where
        F: Fn(&Live, &Headers) + Send + Sync + 'static,
    {
        Self::Success(Arc::new(f))
    }

    /// Wraps an error callback.
    pub fn error<F>(f: F) -> Self
    where
        F: Fn(&ResourceError) + Send + Sync + 'static,
    {
        Self::Error(Arc::new(f))
    }

    /// Returns `true` for either kind of callback.
    #[must_use]
    pub const fn is_callback(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Error(_))
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Success(_) => f.write_str("Success(..)"),
            Self::Error(_) => f.write_str("Error(..)"),
        }
    }
}

/// The resolved meaning of an action call's arguments.
#[derive(Clone, Default)]
pub struct CallArgs {
    /// Call parameters (placeholders and query).
    pub params: Params,
    /// The request payload.
    pub data: Option<Value>,
    /// Success callback.
    pub success: Option<SuccessFn>,
    /// Error callback.
    pub error: Option<ErrorFn>,
}

impl fmt::Debug for CallArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallArgs")
            .field("params", &self.params)
            .field("data", &self.data)
            .field("success", &self.success.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

fn params_at(arg: Arg, position: usize) -> Result<Params, ArgumentError> {
    match arg {
        Arg::Value(Value::Object(map)) => Ok(map),
        Arg::Value(Value::Null) => Ok(Params::new()),
        _ => Err(ArgumentError::Kind {
            position,
            expected: EXPECT_PARAMS,
        }),
    }
}

fn data_at(arg: Arg, position: usize) -> Result<Option<Value>, ArgumentError> {
    match arg {
        Arg::Value(Value::Null) => Ok(None),
        Arg::Value(value) => Ok(Some(value)),
        _ => Err(ArgumentError::Kind {
            position,
            expected: EXPECT_VALUE,
        }),
    }
}

fn success_at(arg: Option<Arg>, position: usize) -> Result<Option<SuccessFn>, ArgumentError> {
    match arg {
        None | Some(Arg::Value(Value::Null)) => Ok(None),
        Some(Arg::Success(f)) => Ok(Some(f)),
        Some(_) => Err(ArgumentError::Kind {
            position,
            expected: EXPECT_SUCCESS,
        }),
    }
}

fn error_at(arg: Option<Arg>, position: usize) -> Result<Option<ErrorFn>, ArgumentError> {
    match arg {
        None | Some(Arg::Value(Value::Null)) => Ok(None),
        Some(Arg::Error(f)) => Ok(Some(f)),
        Some(_) => Err(ArgumentError::Kind {
            position,
            expected: EXPECT_ERROR,
        }),
    }
}

/// Pads `args` to `max` optional slots.
fn slots<const N: usize>(args: Vec<Arg>) -> [Option<Arg>; N] {
    let mut slots: [Option<Arg>; N] = std::array::from_fn(|_| None);
    for (slot, arg) in slots.iter_mut().zip(args) {
        *slot = Some(arg);
    }
    slots
}

/// Resolves the arguments of a class-level action call.
///
/// `has_body` is whether the action's declared method sends a payload.
///
/// # Errors
///
/// Returns [`ArgumentError::Arity`] for more than four arguments and
/// [`ArgumentError::Kind`] when an argument does not fit its position.
pub fn resolve_class_args(args: Vec<Arg>, has_body: bool) -> Result<CallArgs, ArgumentError> {
    let count = args.len();
    if count > 4 {
        return Err(ArgumentError::Arity { max: 4, got: count });
    }

    let [a1, a2, a3, a4] = slots::<4>(args);
    let mut call = CallArgs::default();

    let Some(a1) = a1 else {
        return Ok(call);
    };

    let single = |arg: Arg, call: &mut CallArgs| -> Result<(), ArgumentError> {
        if has_body {
            call.data = data_at(arg, 1)?;
        } else {
            call.params = params_at(arg, 1)?;
        }
        Ok(())
    };

    match a2 {
        None => {
            if a1.is_callback() {
                call.success = success_at(Some(a1), 1)?;
            } else {
                single(a1, &mut call)?;
            }
        }
        Some(a2) if a2.is_callback() => {
            if a1.is_callback() {
                call.success = success_at(Some(a1), 1)?;
                call.error = error_at(Some(a2), 2)?;
            } else {
                call.success = success_at(Some(a2), 2)?;
                call.error = error_at(a3, 3)?;
                single(a1, &mut call)?;
            }
        }
        Some(a2) => {
            call.params = params_at(a1, 1)?;
            call.data = data_at(a2, 2)?;
            call.success = success_at(a3, 3)?;
            call.error = error_at(a4, 4)?;
        }
    }

    Ok(call)
}

/// Resolves the arguments of an instance-level action call.
///
/// `default_params` is used when no params argument is given.
///
/// # Errors
///
/// Returns [`ArgumentError::Arity`] for more than three arguments and
/// [`ArgumentError::Kind`] when an argument does not fit its position.
pub fn resolve_instance_args(
    args: Vec<Arg>,
    default_params: Params,
) -> Result<CallArgs, ArgumentError> {
    let count = args.len();
    if count > 3 {
        return Err(ArgumentError::Arity { max: 3, got: count });
    }

    let [a1, a2, a3] = slots::<3>(args);
    let mut call = CallArgs {
        params: default_params,
        ..CallArgs::default()
    };

    match a1 {
        None => {}
        Some(a1) if count == 3 => {
            call.params = params_at(a1, 1)?;
            call.success = success_at(a2, 2)?;
            call.error = error_at(a3, 3)?;
        }
        Some(a1) if a1.is_callback() => {
            call.success = success_at(Some(a1), 1)?;
            call.error = error_at(a2, 2)?;
        }
        Some(a1) => {
            call.params = params_at(a1, 1)?;
            call.success = success_at(a2, 2)?;
        }
    }

    Ok(call)
}
