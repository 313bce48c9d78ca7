//! Resource classes over paginated REST backends.
//!
//! This module maps URL templates and action descriptors onto requests and
//! turns the responses into live references:
//!
//! - **[`ResourceClass`]**: a template, parameter defaults and actions bound
//!   to a [`Transport`](crate::clients::Transport)
//! - **[`ActionDescriptor`]**: per-action method, URL and transport options
//! - **[`Live`]**, **[`Instance`]**, **[`Collection`]**: references returned
//!   immediately and populated when the response arrives
//! - **[`Route`]**: `:name` template rendering
//! - **[`ParamDefault`]**: literal, lazy and `@payload.path` defaults
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use drf_resource::clients::HttpTransport;
//! use drf_resource::rest::{Arg, ResourceClass};
//! use serde_json::json;
//!
//! let users = ResourceClass::builder(Arc::new(HttpTransport::new(Some(&config))?), "/api/users/:id/")
//!     .param("id", "@id")
//!     .build()?;
//!
//! // Every page of GET /api/users/?search=ada, reported once
//! let found = users.call(
//!     "query",
//!     vec![
//!         json!({"search": "ada"}).into(),
//!         Arg::success(|users, _headers| println!("{} users", users.to_value())),
//!     ],
//! )?;
//!
//! // Or await the settlement
//! let response = found.settled().await?;
//! let users = response.resource.into_collection().unwrap();
//! for user in users.items() {
//!     println!("{:?}", user.get("username"));
//! }
//! ```
//!
//! # Key Types
//!
//! - [`ResourceError`] and [`ArgumentError`]: What can go wrong
//! - [`ResponseBody`] and [`Page`]: Response shapes
//! - [`resolve_class_args`] and [`resolve_instance_args`]: Argument resolution
//! - [`encode_uri_segment`], [`encode_uri_query`], [`build_query_string`]: URL encoding

mod action;
mod args;
pub(crate) mod codec;
mod errors;
mod live;
mod params;
mod path;
mod resource;
mod response;

// Public exports
pub use action::{default_actions, ActionDescriptor, Actions};
pub use args::{resolve_class_args, resolve_instance_args, Arg, CallArgs, ErrorFn, SuccessFn};
pub use codec::{build_query_string, encode_uri_query, encode_uri_segment};
pub use errors::{ArgumentError, PageFetchError, ResourceError};
pub use live::{ActionResponse, Collection, Instance, Live, Record};
pub use params::{extract_params, lookup, ParamDefault, ParamDefaults, Params};
pub use path::{RenderedUrl, Route};
pub use resource::{ResourceClass, ResourceClassBuilder, PAGINATION_LIMIT};
pub use response::{Page, ResponseBody};
