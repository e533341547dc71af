//! Remote gateway abstraction
//!
//! The [`Gateway`] trait is the only way the engine talks to the remote
//! service. [`MockGateway`] keeps collections in memory and records every
//! call, for tests and offline experiments:
//!
//! ```
//! use declarative::{ConnectionContext, Gateway, MockGateway, Query};
//! use serde_json::json;
//!
//! let gateway = MockGateway::new();
//! gateway.seed("security/labels/citations", json!({"displayName": "GDPR"}));
//!
//! let ctx = ConnectionContext::default();
//! let found = gateway
//!     .list(&ctx, "security/labels/citations", &Query::eq("displayName", "gdpr"))
//!     .unwrap();
//! assert_eq!(found.len(), 1);
//! ```

use crate::context::ConnectionContext;
use crate::error::{Error, Result};
use crate::schema::{Discriminator, ResourceDescriptor};
use crate::types::same_text;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// JSON object sent to or received from the remote service
pub type Payload = serde_json::Map<String, Value>;

/// A remote object: opaque id plus its JSON properties
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteObject {
    pub id: String,
    pub properties: Payload,
}

impl RemoteObject {
    pub fn new(id: impl Into<String>, properties: Payload) -> Self {
        Self {
            id: id.into(),
            properties,
        }
    }

    /// Build from a JSON object carrying an `id` property
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Object(mut properties) = value else {
            return Err(Error::mapping("remote", "expected a JSON object"));
        };
        let id = match properties.remove("id") {
            Some(Value::String(id)) => id,
            _ => return Err(Error::mapping("remote", "object has no string id")),
        };
        Ok(Self { id, properties })
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(Value::as_str)
    }

    pub fn i64_field(&self, name: &str) -> Option<i64> {
        self.properties.get(name).and_then(Value::as_i64)
    }

    pub fn bool_field(&self, name: &str) -> Option<bool> {
        self.properties.get(name).and_then(Value::as_bool)
    }

    pub fn string_list_field(&self, name: &str) -> Option<Vec<String>> {
        let items = self.properties.get(name)?.as_array()?;
        Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect(),
        )
    }

    /// A string property the resource cannot be mapped without
    pub fn required_str(&self, descriptor: &ResourceDescriptor, name: &str) -> Result<&str> {
        self.str_field(name).ok_or_else(|| {
            Error::mapping(
                descriptor.type_name,
                format!("object {} has no string property {name}", self.id),
            )
        })
    }

    /// Whether this object carries the given type tag
    pub fn matches(&self, discriminator: &Discriminator) -> bool {
        self.str_field(discriminator.field)
            .is_some_and(|v| v.eq_ignore_ascii_case(discriminator.value))
    }
}

/// Server-side filter predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `field eq 'value'`
    Eq { field: String, value: String },
}

/// Parameters of a list call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub filter: Option<Filter>,
}

impl Query {
    /// Every object in the collection
    pub fn all() -> Self {
        Self::default()
    }

    /// Objects whose `field` equals `value`
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            filter: Some(Filter::Eq {
                field: field.into(),
                value: value.into(),
            }),
        }
    }
}

/// Backend trait for the remote management API
///
/// Implementations block until the call completes. Errors should use the
/// engine's taxonomy so that callers can tell authorization problems from
/// transport failures.
pub trait Gateway: Send + Sync {
    /// List objects of a collection, optionally filtered
    fn list(
        &self,
        ctx: &ConnectionContext,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<RemoteObject>>;

    /// Create an object, returning it as stored
    fn create(
        &self,
        ctx: &ConnectionContext,
        collection: &str,
        payload: &Payload,
    ) -> Result<RemoteObject>;

    /// Patch an existing object
    fn update(
        &self,
        ctx: &ConnectionContext,
        collection: &str,
        id: &str,
        payload: &Payload,
    ) -> Result<()>;

    /// Delete an existing object
    fn delete(&self, ctx: &ConnectionContext, collection: &str, id: &str) -> Result<()>;
}

/// A recorded gateway call
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    List {
        collection: String,
        filter: Option<Filter>,
    },
    Create {
        collection: String,
        payload: Payload,
    },
    Update {
        collection: String,
        id: String,
        payload: Payload,
    },
    Delete {
        collection: String,
        id: String,
    },
}

impl GatewayCall {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::List { .. })
    }
}

#[derive(Debug, Default)]
struct MockState {
    collections: HashMap<String, Vec<RemoteObject>>,
    calls: Vec<GatewayCall>,
    next_id: u64,
    list_failure: Option<fn() -> Error>,
    write_failure: Option<fn() -> Error>,
}

impl MockState {
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("00000000-0000-0000-0000-{:012}", self.next_id)
    }
}

/// In-memory gateway for testing without network access.
///
/// Clones share the same storage, so a test can keep a handle for
/// inspection while the engine holds another.
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    state: Arc<Mutex<MockState>>,
}

impl MockGateway {
    /// Create a new empty mock gateway
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store an object in a collection, assigning an id when it has none
    pub fn seed(&self, collection: &str, value: Value) -> RemoteObject {
        let mut state = self.state();
        let mut properties = match value {
            Value::Object(map) => map,
            _ => Payload::new(),
        };
        let id = match properties.remove("id") {
            Some(Value::String(id)) => id,
            _ => state.allocate_id(),
        };
        let object = RemoteObject::new(id, properties);
        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(object.clone());
        object
    }

    /// Snapshot of a collection's objects
    pub fn objects(&self, collection: &str) -> Vec<RemoteObject> {
        self.state()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state().calls.clone()
    }

    /// Number of create/update/delete calls received so far
    pub fn mutation_count(&self) -> usize {
        self.state().calls.iter().filter(|c| c.is_mutation()).count()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Make every list call fail with the produced error
    pub fn fail_list_with(&self, error: fn() -> Error) {
        self.state().list_failure = Some(error);
    }

    /// Make every create/update/delete call fail with the produced error
    pub fn fail_writes_with(&self, error: fn() -> Error) {
        self.state().write_failure = Some(error);
    }

    /// Stop injecting failures
    pub fn recover(&self) {
        let mut state = self.state();
        state.list_failure = None;
        state.write_failure = None;
    }
}

fn not_found(id: &str) -> Error {
    Error::Api {
        status: 404,
        body: format!("object {id} not found"),
    }
}

impl Gateway for MockGateway {
    fn list(
        &self,
        _ctx: &ConnectionContext,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<RemoteObject>> {
        let mut state = self.state();
        state.calls.push(GatewayCall::List {
            collection: collection.to_string(),
            filter: query.filter.clone(),
        });
        if let Some(failure) = state.list_failure {
            return Err(failure());
        }

        let objects = state.collections.get(collection).cloned().unwrap_or_default();
        let filtered = match &query.filter {
            None => objects,
            Some(Filter::Eq { field, value }) => objects
                .into_iter()
                .filter(|o| {
                    let actual = if field == "id" {
                        Some(o.id.as_str())
                    } else {
                        o.str_field(field)
                    };
                    actual.is_some_and(|a| same_text(a, value))
                })
                .collect(),
        };
        Ok(filtered)
    }

    fn create(
        &self,
        _ctx: &ConnectionContext,
        collection: &str,
        payload: &Payload,
    ) -> Result<RemoteObject> {
        let mut state = self.state();
        state.calls.push(GatewayCall::Create {
            collection: collection.to_string(),
            payload: payload.clone(),
        });
        if let Some(failure) = state.write_failure {
            return Err(failure());
        }

        let id = state.allocate_id();
        let object = RemoteObject::new(id, payload.clone());
        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(object.clone());
        Ok(object)
    }

    fn update(
        &self,
        _ctx: &ConnectionContext,
        collection: &str,
        id: &str,
        payload: &Payload,
    ) -> Result<()> {
        let mut state = self.state();
        state.calls.push(GatewayCall::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            payload: payload.clone(),
        });
        if let Some(failure) = state.write_failure {
            return Err(failure());
        }

        let object = state
            .collections
            .get_mut(collection)
            .and_then(|objects| objects.iter_mut().find(|o| o.id == id))
            .ok_or_else(|| not_found(id))?;
        for (key, value) in payload {
            object.properties.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn delete(&self, _ctx: &ConnectionContext, collection: &str, id: &str) -> Result<()> {
        let mut state = self.state();
        state.calls.push(GatewayCall::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        });
        if let Some(failure) = state.write_failure {
            return Err(failure());
        }

        let objects = state
            .collections
            .get_mut(collection)
            .ok_or_else(|| not_found(id))?;
        let before = objects.len();
        objects.retain(|o| o.id != id);
        if objects.len() == before {
            return Err(not_found(id));
        }
        Ok(())
    }
}
