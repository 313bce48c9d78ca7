//! # drf-resource
//!
//! Live, identity-stable REST resources for Django REST Framework style
//! backends: trailing-slash URLs, `:name` placeholders and paginated
//! `{count, next, previous, results}` list responses.
//!
//! ## Overview
//!
//! This crate provides:
//! - Resource classes built from a URL template, parameter defaults and named
//!   actions via [`ResourceClass`]
//! - The built-in `get`, `save`, `update`, `query`, `remove` and `delete`
//!   actions, with `save` switching from POST to PUT once a record has an `id`
//! - Live references ([`Instance`], [`Collection`]) returned synchronously and
//!   filled in when the response arrives
//! - Transparent pagination: `query` follows `next` links and reports success
//!   once, after the last page
//! - A pluggable [`Transport`](clients::Transport) with a reqwest-backed
//!   [`HttpTransport`](clients::HttpTransport)
//! - Type-safe transport configuration via [`TransportConfig`] and
//!   [`TransportConfigBuilder`]
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use drf_resource::{BaseUrl, ResourceClass, TransportConfig};
//! use drf_resource::clients::HttpTransport;
//!
//! let config = TransportConfig::builder()
//!     .base_url(BaseUrl::new("https://api.example.com").unwrap())
//!     .build()
//!     .unwrap();
//! let transport = Arc::new(HttpTransport::new(Some(&config)).unwrap());
//!
//! let users = ResourceClass::builder(transport, "/api/users/:id/")
//!     .param("id", "@id")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(users.template(), "/api/users/:id/");
//! ```
//!
//! ## Calling Actions
//!
//! ```rust,ignore
//! use drf_resource::rest::Arg;
//! use serde_json::json;
//!
//! // GET /api/users/1/
//! let user = users.call("get", vec![json!({"id": 1}).into()])?;
//!
//! // The reference exists right away and fills in later
//! let response = user.settled().await?;
//! let user = user.into_instance().unwrap();
//! println!("{}", user.get("username").unwrap());
//!
//! // PUT /api/users/1/ with the instance as payload
//! user.set("first_name", "Ada");
//! user.call("save", vec![])?.settled().await?;
//!
//! // GET /api/users/?is_staff=true, loading at most 50 users
//! let staff = users.call(
//!     "query",
//!     vec![
//!         json!({"is_staff": true, "paginationLimit": 50}).into(),
//!         Arg::success(|staff, _| println!("loaded {}", staff.to_value())),
//!         Arg::error(|e| eprintln!("failed: {e}")),
//!     ],
//! )?;
//! ```
//!
//! ## Custom Transports
//!
//! Resource classes never touch the network themselves. Anything
//! implementing [`Transport`](clients::Transport) can stand in for
//! [`HttpTransport`](clients::HttpTransport), such as an in-memory fake in
//! tests.
//!
//! ## Design Principles
//!
//! - **No global state**: Configuration is instance-based and passed explicitly
//! - **Fail-fast validation**: Newtypes and builders validate on construction
//! - **Thread-safe**: All types are `Send + Sync`
//! - **Async-first**: Requests run on the Tokio runtime the call is made from

pub mod clients;
pub mod config;
pub mod error;
pub mod rest;

// Re-export public types at crate root for convenience
pub use config::{BaseUrl, HeaderName, TransportConfig, TransportConfigBuilder};
pub use error::ConfigError;

// Re-export transport types
pub use clients::{
    HttpError, HttpMethod, HttpTransport, InvalidHttpRequestError, RequestConfig, Transport,
    TransportError, TransportResponse,
};

// Re-export resource types
pub use rest::{
    ActionDescriptor, ActionResponse, Arg, ArgumentError, Collection, Instance, Live,
    ParamDefault, ParamDefaults, ResourceClass, ResourceClassBuilder, ResourceError,
};
