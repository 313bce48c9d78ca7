//! Resource classes and action dispatch.
//!
//! A [`ResourceClass`] binds a URL template, parameter defaults and a set of
//! named actions to a [`Transport`]. Calling an action returns a [`Live`]
//! reference right away and performs the request on the current Tokio
//! runtime; the reference fills in when the response arrives.
//!
//! # Dispatch
//!
//! For every call:
//!
//! 1. The positional arguments are resolved into params, data and callbacks
//!    (see [`resolve_class_args`]).
//! 2. The live reference is allocated: a fresh [`Collection`] for array
//!    actions, otherwise the target instance or a new [`Instance`] seeded
//!    from the payload.
//! 3. The method is chosen (`save` switches from POST to PUT when the payload
//!    has an `id`).
//! 4. The class defaults, the action params and the call params are merged.
//!    `paginationLimit` is taken out of the result; it caps how many entries
//!    a paginated collection loads and is never sent. It may come from any
//!    of the three layers.
//! 5. The template is rendered and residual params become the query.
//! 6. The request is spawned and the reference returned.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use drf_resource::clients::HttpTransport;
//! use drf_resource::rest::{ActionDescriptor, Arg, ResourceClass};
//! use drf_resource::{BaseUrl, TransportConfig};
//! use drf_resource::clients::HttpMethod;
//! use serde_json::json;
//!
//! let config = TransportConfig::builder()
//!     .base_url(BaseUrl::new("https://api.example.com")?)
//!     .build()?;
//! let transport = Arc::new(HttpTransport::new(Some(&config))?);
//!
//! let users = ResourceClass::builder(transport, "/api/users/:id/")
//!     .param("id", "@id")
//!     .action(
//!         "activate",
//!         ActionDescriptor::new(HttpMethod::Post).url("/api/users/:id/activate/"),
//!     )
//!     .build()?;
//!
//! // GET /api/users/?is_active=true, following every `next` link
//! let active = users.call("query", vec![json!({"is_active": true}).into()])?;
//! active.settled().await?;
//!
//! // POST /api/users/, then PUT /api/users/1/ once the server assigned an id
//! let user = users.call("save", vec![json!({"username": "ada"}).into()])?;
//! user.settled().await?;
//! let user = user.into_instance().unwrap();
//! user.set("email", "ada@example.com");
//! user.call("save", vec![])?.settled().await?;
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::clients::Transport;
use crate::error::ConfigError;
use crate::rest::action::{default_actions, ActionDescriptor, Actions};
use crate::rest::args::{resolve_class_args, resolve_instance_args, Arg, CallArgs};
use crate::rest::errors::ResourceError;
use crate::rest::live::{Collection, Instance, Live, Record};
use crate::rest::params::{extract_params, ParamDefault, ParamDefaults, Params};
use crate::rest::path::Route;
use crate::rest::response::Dispatch;

/// Call parameter holding the maximum number of entries to load.
pub const PAGINATION_LIMIT: &str = "paginationLimit";

struct ClassInner {
    route: Route,
    param_defaults: ParamDefaults,
    actions: Actions,
    transport: Arc<dyn Transport>,
}

/// A resource class: a template, defaults and actions over one transport.
///
/// Cloning is cheap; clones share the same configuration.
#[derive(Clone)]
pub struct ResourceClass {
    inner: Arc<ClassInner>,
}

// Verify ResourceClass is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ResourceClass>();
};

impl ResourceClass {
    /// Creates a class whose actions are the built-in ones overridden and
    /// extended by `actions`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyTemplate`] for an empty template and
    /// [`ConfigError::EmptyActionName`] for an action with an empty name.
    pub fn create(
        transport: Arc<dyn Transport>,
        template: impl Into<String>,
        param_defaults: ParamDefaults,
        actions: Actions,
    ) -> Result<Self, ConfigError> {
        let template = template.into();
        if template.trim().is_empty() {
            return Err(ConfigError::EmptyTemplate);
        }
        if actions.keys().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::EmptyActionName);
        }

        let mut merged = default_actions();
        merged.extend(actions);

        Ok(Self {
            inner: Arc::new(ClassInner {
                route: Route::new(template),
                param_defaults,
                actions: merged,
                transport,
            }),
        })
    }

    /// Creates a builder for a class over `transport` and `template`.
    #[must_use]
    pub fn builder(transport: Arc<dyn Transport>, template: impl Into<String>) -> ResourceClassBuilder {
        ResourceClassBuilder::new(transport, template)
    }

    /// Returns the URL template.
    #[must_use]
    pub fn template(&self) -> &str {
        self.inner.route.template()
    }

    /// Returns the class-level parameter defaults.
    #[must_use]
    pub fn param_defaults(&self) -> &ParamDefaults {
        &self.inner.param_defaults
    }

    /// Returns all actions, built-in ones included.
    #[must_use]
    pub fn actions(&self) -> &Actions {
        &self.inner.actions
    }

    /// Returns the action `name`.
    #[must_use]
    pub fn action(&self, name: &str) -> Option<&ActionDescriptor> {
        self.inner.actions.get(name)
    }

    /// Returns the transport requests are sent through.
    #[must_use]
    pub fn transport(&self) -> &dyn Transport {
        self.inner.transport.as_ref()
    }

    /// Wraps `record` as an instance of this class without any request.
    #[must_use]
    pub fn instance(&self, record: Record) -> Instance {
        Instance::new(self.clone(), record)
    }

    /// Creates a class sharing template, actions and transport, with
    /// `extra` layered over the parameter defaults.
    #[must_use]
    pub fn bind(&self, extra: ParamDefaults) -> Self {
        let mut param_defaults = self.inner.param_defaults.clone();
        param_defaults.extend(extra);

        Self {
            inner: Arc::new(ClassInner {
                route: self.inner.route.clone(),
                param_defaults,
                actions: self.inner.actions.clone(),
                transport: Arc::clone(&self.inner.transport),
            }),
        }
    }

    /// Calls the action `name`.
    ///
    /// Takes up to four arguments, `[params, data, success, error]`,
    /// resolved by [`resolve_class_args`].
    ///
    /// # Errors
    ///
    /// Returns, synchronously:
    /// - [`ResourceError::UnknownAction`] if no such action exists
    /// - [`ResourceError::Argument`] for arguments that do not resolve
    /// - [`ResourceError::Runtime`] outside a Tokio runtime
    ///
    /// Request failures are delivered to the error callback and to
    /// [`Live::settled`].
    pub fn call(&self, name: &str, args: Vec<Arg>) -> Result<Live, ResourceError> {
        let action = self.find(name)?;
        let call = resolve_class_args(args, action.has_body())?;
        self.dispatch(name, action, call, None)
    }

    /// Calls the action `name` with `target` as the live reference.
    pub(crate) fn call_on(
        &self,
        target: &Instance,
        name: &str,
        args: Vec<Arg>,
    ) -> Result<Live, ResourceError> {
        let action = self.find(name)?;
        let record = target.to_value();
        let defaults = extract_params(Some(&record), &ParamDefaults::new(), &self.inner.param_defaults);

        let mut call = resolve_instance_args(args, defaults)?;
        call.data = Some(record);
        self.dispatch(name, action, call, Some(target))
    }

    fn find(&self, name: &str) -> Result<&ActionDescriptor, ResourceError> {
        self.inner
            .actions
            .get(name)
            .ok_or_else(|| ResourceError::UnknownAction {
                name: name.to_string(),
            })
    }

    fn dispatch(
        &self,
        name: &str,
        action: &ActionDescriptor,
        call: CallArgs,
        target: Option<&Instance>,
    ) -> Result<Live, ResourceError> {
        let CallArgs {
            params,
            data,
            success,
            error,
        } = call;

        let live = if action.is_array {
            Live::Collection(Collection::new())
        } else if let Some(target) = target {
            Live::Instance(target.clone())
        } else {
            let record = match &data {
                Some(Value::Object(record)) => record.clone(),
                _ => Record::new(),
            };
            Live::Instance(self.instance(record))
        };

        let method = action.effective_method(data.as_ref());

        let mut merged = extract_params(data.as_ref(), &action.params, &self.inner.param_defaults);
        merged.extend(params);
        let limit = take_pagination_limit(&mut merged);

        let rendered = self
            .inner
            .route
            .render(&merged, data.as_ref(), action.url.as_deref());
        let body = if method.has_body() { data } else { None };
        let config = action.request_config(method, rendered, body);

        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| ResourceError::Runtime(e.to_string()))?;

        let generation = live.lifecycle().begin();
        tracing::debug!(action = name, method = %method, url = %config.url, "Dispatching action");

        handle.spawn(
            Dispatch {
                action: name.to_string(),
                class: self.clone(),
                live: live.clone(),
                generation,
                config,
                limit,
                success,
                error,
            }
            .run(),
        );

        Ok(live)
    }
}

/// Removes `paginationLimit` from `params`, returning it when it is a
/// positive integer or numeric string.
fn take_pagination_limit(params: &mut Params) -> Option<usize> {
    let limit = match params.remove(PAGINATION_LIMIT)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    usize::try_from(limit).ok().filter(|limit| *limit > 0)
}

impl fmt::Debug for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceClass")
            .field("template", &self.template())
            .field("param_defaults", &self.inner.param_defaults)
            .field("actions", &self.inner.actions.keys().collect::<Vec<_>>())
            .field("transport", &self.inner.transport)
            .finish()
    }
}

/// Builder for [`ResourceClass`].
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use drf_resource::clients::{HttpMethod, HttpTransport};
/// use drf_resource::rest::{ActionDescriptor, ResourceClass};
///
/// let transport = Arc::new(HttpTransport::new(None).unwrap());
/// let articles = ResourceClass::builder(transport, "/api/articles/:slug/")
///     .param("slug", "@slug")
///     .action("recent", ActionDescriptor::new(HttpMethod::Get).url("/api/articles/recent/").array())
///     .build()
///     .unwrap();
///
/// assert!(articles.action("recent").unwrap().is_array);
/// assert!(articles.action("save").is_some());
/// ```
pub struct ResourceClassBuilder {
    transport: Arc<dyn Transport>,
    template: String,
    param_defaults: ParamDefaults,
    actions: Actions,
}

impl ResourceClassBuilder {
    fn new(transport: Arc<dyn Transport>, template: impl Into<String>) -> Self {
        Self {
            transport,
            template: template.into(),
            param_defaults: ParamDefaults::new(),
            actions: Actions::new(),
        }
    }

    /// Adds a class-level parameter default.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamDefault>) -> Self {
        self.param_defaults.insert(key.into(), value.into());
        self
    }

    /// Adds several parameter defaults.
    #[must_use]
    pub fn params(mut self, defaults: ParamDefaults) -> Self {
        self.param_defaults.extend(defaults);
        self
    }

    /// Adds or overrides an action.
    #[must_use]
    pub fn action(mut self, name: impl Into<String>, action: ActionDescriptor) -> Self {
        self.actions.insert(name.into(), action);
        self
    }

    /// Adds or overrides several actions.
    #[must_use]
    pub fn actions(mut self, actions: Actions) -> Self {
        self.actions.extend(actions);
        self
    }

    /// Builds the class.
    ///
    /// # Errors
    ///
    /// See [`ResourceClass::create`].
    pub fn build(self) -> Result<ResourceClass, ConfigError> {
        ResourceClass::create(self.transport, self.template, self.param_defaults, self.actions)
    }
}

impl fmt::Debug for ResourceClassBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceClassBuilder")
            .field("template", &self.template)
            .field("param_defaults", &self.param_defaults)
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
