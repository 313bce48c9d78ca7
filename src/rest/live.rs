//! Live references returned by action calls.
//!
//! Every action call returns a [`Live`] reference immediately and fills it in
//! when the response arrives. A reference is a shared handle: clones observe
//! the same storage, and the storage keeps its identity across updates, so a
//! reference handed to a view before the response arrives shows the loaded
//! data afterwards.
//!
//! - [`Instance`]: a single record (`Map<String, Value>`)
//! - [`Collection`]: an ordered list of [`Instance`]s
//!
//! Next to the data, each reference carries:
//!
//! - a resolved flag, `false` while a call is in flight;
//! - a settlement, awaited with [`Live::settled`], which yields the
//!   [`ActionResponse`] or the [`ResourceError`] of the latest call;
//! - for instances, the raw transport result via
//!   [`Instance::transport_response`].
//!
//! # Example
//!
//! ```rust,ignore
//! let user = users.call("get", vec![json!({"id": 1}).into()])?;
//! assert!(!user.is_resolved());
//!
//! let response = user.settled().await?;
//! assert!(response.resource.ptr_eq(&user));
//!
//! let user = user.into_instance().unwrap();
//! println!("{}", user.get("username").unwrap());
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tokio::sync::{watch, Mutex};

use crate::clients::{Headers, TransportError, TransportResponse};
use crate::rest::args::Arg;
use crate::rest::errors::ResourceError;
use crate::rest::resource::ResourceClass;

/// The fields of a single record.
pub type Record = Map<String, Value>;

/// The response half of a settlement; the reference is attached on read.
#[derive(Debug, Clone)]
pub(crate) struct ResponseParts {
    pub(crate) status: u16,
    pub(crate) headers: Headers,
    pub(crate) data: Value,
}

impl From<&TransportResponse> for ResponseParts {
    fn from(response: &TransportResponse) -> Self {
        Self {
            status: response.status,
            headers: response.headers.clone(),
            data: response.data.clone(),
        }
    }
}

type Settlement = Option<Result<ResponseParts, ResourceError>>;
type RawSettlement = Option<Result<TransportResponse, TransportError>>;

/// The successful outcome of an action call.
#[derive(Debug, Clone)]
pub struct ActionResponse {
    /// The HTTP status of the first response.
    pub status: u16,
    /// The headers of the first response.
    pub headers: Headers,
    /// The body of the first response.
    pub data: Value,
    /// The live reference the call populated.
    pub resource: Live,
}

/// Call bookkeeping shared by both kinds of reference.
///
/// Kept apart from the record so replacing it with a response can never
/// clobber it.
///
/// Every call takes a generation from [`Lifecycle::begin`]. Results of a call
/// that has since been superseded are never published.
pub(crate) struct Lifecycle {
    resolved: AtomicBool,
    in_flight: AtomicUsize,
    generation: AtomicU64,
    sequence: Arc<Mutex<()>>,
    settled: watch::Sender<Settlement>,
    raw: watch::Sender<RawSettlement>,
}

impl Lifecycle {
    fn new() -> Self {
        let (settled, _) = watch::channel(None);
        let (raw, _) = watch::channel(None);
        Self {
            resolved: AtomicBool::new(false),
            in_flight: AtomicUsize::new(0),
            generation: AtomicU64::new(0),
            sequence: Arc::new(Mutex::new(())),
            settled,
            raw,
        }
    }

    fn is_resolved(&self) -> bool {
        self.resolved.load(Ordering::Acquire)
    }

    /// Enters the pending state for a new call and returns its generation.
    pub(crate) fn begin(&self) -> u64 {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        self.resolved.store(false, Ordering::Release);

        // Bumped under both channel locks so a publish cannot interleave
        let mut generation = 0;
        self.settled.send_modify(|settled| {
            self.raw.send_modify(|raw| {
                generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
                *raw = None;
            });
            *settled = None;
        });
        generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }

    /// Ends one call. Returns `true` (and marks the reference resolved) when
    /// no other call is in flight.
    pub(crate) fn complete(&self) -> bool {
        let last = self.in_flight.fetch_sub(1, Ordering::AcqRel) == 1;
        if last {
            self.resolved.store(true, Ordering::Release);
        }
        last
    }

    /// Calls on one reference run one after another.
    pub(crate) fn sequence(&self) -> Arc<Mutex<()>> {
        Arc::clone(&self.sequence)
    }

    /// Publishes the outcome of call `generation` unless a later call began.
    pub(crate) fn publish(&self, generation: u64, outcome: Result<ResponseParts, ResourceError>) {
        self.settled.send_if_modified(|settled| {
            let current = self.is_current(generation);
            if current {
                *settled = Some(outcome);
            }
            current
        });
    }

    pub(crate) fn publish_transport(
        &self,
        generation: u64,
        result: &Result<TransportResponse, TransportError>,
    ) {
        self.raw.send_if_modified(|raw| {
            let current = self.is_current(generation);
            if current {
                *raw = Some(result.clone());
            }
            current
        });
    }

    async fn settlement(&self) -> Result<ResponseParts, ResourceError> {
        let mut rx = self.settled.subscribe();
        let settled = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|e| ResourceError::Runtime(e.to_string()))?
            .clone();
        settled.unwrap_or_else(|| Err(ResourceError::Runtime("settlement missing".to_string())))
    }

    async fn transport_settlement(&self) -> Result<TransportResponse, ResourceError> {
        let mut rx = self.raw.subscribe();
        let raw = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|e| ResourceError::Runtime(e.to_string()))?
            .clone();
        match raw {
            Some(result) => result.map_err(ResourceError::from),
            None => Err(ResourceError::Runtime("transport result missing".to_string())),
        }
    }
}

struct Shared<T> {
    value: RwLock<T>,
    lifecycle: Lifecycle,
}

impl<T> Shared<T> {
    fn new(value: T) -> Arc<Self> {
        Arc::new(Self {
            value: RwLock::new(value),
            lifecycle: Lifecycle::new(),
        })
    }
}

/// A live single record.
#[derive(Clone)]
pub struct Instance {
    class: ResourceClass,
    state: Arc<Shared<Record>>,
}

impl Instance {
    pub(crate) fn new(class: ResourceClass, record: Record) -> Self {
        Self {
            class,
            state: Shared::new(record),
        }
    }

    /// Returns the class this instance belongs to.
    #[must_use]
    pub const fn class(&self) -> &ResourceClass {
        &self.class
    }

    /// Returns a copy of the field `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.state.value.read().get(key).cloned()
    }

    /// Sets the field `key`, returning the previous value.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.state.value.write().insert(key.into(), value.into())
    }

    /// Removes the field `key`, returning its value.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.state.value.write().remove(key)
    }

    /// Returns a copy of all fields.
    #[must_use]
    pub fn snapshot(&self) -> Record {
        self.state.value.read().clone()
    }

    /// Returns the record as a JSON object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.snapshot())
    }

    /// Deserializes the current record into `T`.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error if the record does not fit `T`.
    pub fn to_typed<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_value())
    }

    /// Returns `true` once the latest call has settled.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.state.lifecycle.is_resolved()
    }

    /// Returns `true` if both handles point to the same storage.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Waits for the latest call on this instance to settle.
    ///
    /// An instance that has never been the target of a call waits for its
    /// first one.
    ///
    /// # Errors
    ///
    /// Returns the [`ResourceError`] the call failed with.
    pub async fn settled(&self) -> Result<ActionResponse, ResourceError> {
        let parts = self.state.lifecycle.settlement().await?;
        Ok(attach(parts, Live::Instance(self.clone())))
    }

    /// Waits for the raw transport result of the latest call's first request.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Transport`] if the transport rejected the
    /// request.
    pub async fn transport_response(&self) -> Result<TransportResponse, ResourceError> {
        self.state.lifecycle.transport_settlement().await
    }

    /// Calls the action `name` with this instance as target.
    ///
    /// Takes up to three arguments, `[params, success, error]`. Without a
    /// params argument the class defaults are resolved against this
    /// instance, so `@id` picks up the instance's own `id`. Actions that send
    /// a body send this instance.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::UnknownAction`], [`ResourceError::Argument`],
    /// or [`ResourceError::Runtime`] synchronously.
    pub fn call(&self, name: &str, args: Vec<Arg>) -> Result<Live, ResourceError> {
        self.class.call_on(self, name, args)
    }

    /// Replaces all fields with those of `record`.
    pub(crate) fn replace(&self, record: Record) {
        *self.state.value.write() = record;
    }

    pub(crate) fn lifecycle(&self) -> &Lifecycle {
        &self.state.lifecycle
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("record", &*self.state.value.read())
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl Serialize for Instance {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.state.value.read().serialize(serializer)
    }
}

/// A live list of records.
#[derive(Clone)]
pub struct Collection {
    state: Arc<Shared<Vec<Instance>>>,
}

impl Collection {
    pub(crate) fn new() -> Self {
        Self {
            state: Shared::new(Vec::new()),
        }
    }

    /// Returns the number of instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.value.read().len()
    }

    /// Returns `true` if the collection holds no instances.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.value.read().is_empty()
    }

    /// Returns the instance at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Instance> {
        self.state.value.read().get(index).cloned()
    }

    /// Returns handles to all instances.
    #[must_use]
    pub fn items(&self) -> Vec<Instance> {
        self.state.value.read().clone()
    }

    /// Returns the records as a JSON array.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Array(
            self.state
                .value
                .read()
                .iter()
                .map(Instance::to_value)
                .collect(),
        )
    }

    /// Deserializes every record into `T`.
    ///
    /// # Errors
    ///
    /// Returns the first deserialization error.
    pub fn to_typed<T: DeserializeOwned>(&self) -> Result<Vec<T>, serde_json::Error> {
        serde_json::from_value(self.to_value())
    }

    /// Returns `true` once the call that created this collection has settled.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.state.lifecycle.is_resolved()
    }

    /// Returns `true` if both handles point to the same storage.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Waits for the call that created this collection to settle, including
    /// every follow-up page.
    ///
    /// # Errors
    ///
    /// Returns the [`ResourceError`] the call failed with. Instances loaded
    /// before a failed follow-up page stay in the collection.
    pub async fn settled(&self) -> Result<ActionResponse, ResourceError> {
        let parts = self.state.lifecycle.settlement().await?;
        Ok(attach(parts, Live::Collection(self.clone())))
    }

    pub(crate) fn clear(&self) {
        self.state.value.write().clear();
    }

    pub(crate) fn extend(&self, items: impl IntoIterator<Item = Instance>) {
        self.state.value.write().extend(items);
    }

    pub(crate) fn lifecycle(&self) -> &Lifecycle {
        &self.state.lifecycle
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("items", &*self.state.value.read())
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl Serialize for Collection {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.state.value.read().serialize(serializer)
    }
}

fn attach(parts: ResponseParts, resource: Live) -> ActionResponse {
    ActionResponse {
        status: parts.status,
        headers: parts.headers,
        data: parts.data,
        resource,
    }
}

/// The reference returned by an action call.
#[derive(Debug, Clone)]
pub enum Live {
    /// Returned by non-array actions.
    Instance(Instance),
    /// Returned by array actions.
    Collection(Collection),
}

impl Live {
    /// Returns `true` once the latest call has settled.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.lifecycle().is_resolved()
    }

    /// Returns `true` if both handles point to the same storage.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Instance(a), Self::Instance(b)) => a.ptr_eq(b),
            (Self::Collection(a), Self::Collection(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Waits for the latest call to settle.
    ///
    /// # Errors
    ///
    /// Returns the [`ResourceError`] the call failed with.
    pub async fn settled(&self) -> Result<ActionResponse, ResourceError> {
        match self {
            Self::Instance(instance) => instance.settled().await,
            Self::Collection(collection) => collection.settled().await,
        }
    }

    /// Returns the instance, if this is one.
    #[must_use]
    pub const fn as_instance(&self) -> Option<&Instance> {
        match self {
            Self::Instance(instance) => Some(instance),
            Self::Collection(_) => None,
        }
    }

    /// Returns the collection, if this is one.
    #[must_use]
    pub const fn as_collection(&self) -> Option<&Collection> {
        match self {
            Self::Collection(collection) => Some(collection),
            Self::Instance(_) => None,
        }
    }

    /// Converts into the instance, if this is one.
    #[must_use]
    pub fn into_instance(self) -> Option<Instance> {
        match self {
            Self::Instance(instance) => Some(instance),
            Self::Collection(_) => None,
        }
    }

    /// Converts into the collection, if this is one.
    #[must_use]
    pub fn into_collection(self) -> Option<Collection> {
        match self {
            Self::Collection(collection) => Some(collection),
            Self::Instance(_) => None,
        }
    }

    /// Returns the current data as JSON.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Instance(instance) => instance.to_value(),
            Self::Collection(collection) => collection.to_value(),
        }
    }

    pub(crate) fn lifecycle(&self) -> &Lifecycle {
        match self {
            Self::Instance(instance) => instance.lifecycle(),
            Self::Collection(collection) => collection.lifecycle(),
        }
    }
}

impl From<Instance> for Live {
    fn from(instance: Instance) -> Self {
        Self::Instance(instance)
    }
}

impl From<Collection> for Live {
    fn from(collection: Collection) -> Self {
        Self::Collection(collection)
    }
}

impl Serialize for Live {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Instance(instance) => instance.serialize(serializer),
            Self::Collection(collection) => collection.serialize(serializer),
        }
    }
}

// Verify live references are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Instance>();
    assert_send_sync::<Collection>();
    assert_send_sync::<Live>();
    assert_send_sync::<ActionResponse>();
};
