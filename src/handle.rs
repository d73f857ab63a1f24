//! Handle bound to a single namespace.

use crate::error::{Result, StoreError};
use crate::store::{Namespace, Registry, Update};
use crate::subscriptions::{Callback, Dispatch, Subscription};
use crate::types::Value;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::rc::Rc;

/// Read, write and subscribe within one namespace.
///
/// Obtained from [`Registry::store`]. Clones share the same namespace.
#[derive(Clone)]
pub struct NamespacedStore {
    registry: Registry,
    ns: Rc<Namespace>,
}

impl NamespacedStore {
    pub(crate) fn new(registry: Registry, ns: Rc<Namespace>) -> Self {
        Self { registry, ns }
    }

    pub fn namespace(&self) -> &str {
        &self.ns.name
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Number of root replacements and effective writes so far.
    pub fn version(&self) -> u64 {
        self.ns.version()
    }

    // --- Reads ---

    /// The whole namespace root.
    pub fn root(&self) -> Value {
        self.ns.root()
    }

    /// The value at `path`, or `PathNotFound`.
    pub fn get(&self, path: &str) -> Result<Value> {
        self.ns.get(&self.registry.parse(path)?)
    }

    /// The value at `path`, deserialized into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.get(path)?;
        serde_json::from_value(value.to_json())
            .map_err(|e| StoreError::Deserialization(e.to_string()))
    }

    // --- Writes ---

    /// Write a literal or updater result at `path`.
    ///
    /// Subscribers at `path` and its ancestors, then always-on subscribers,
    /// have been called by the time this returns.
    pub fn set<'a>(&self, path: &str, update: impl Into<Update<'a>>) -> Result<Dispatch> {
        let path = self.registry.parse(path)?;
        self.ns.set(&path, update.into(), self.registry.config())
    }

    pub fn set_value(&self, path: &str, value: impl Into<Value>) -> Result<Dispatch> {
        self.set(path, Update::Literal(value.into()))
    }

    /// Replace the value at `path` with `f(current)`.
    pub fn update<F>(&self, path: &str, f: F) -> Result<Dispatch>
    where
        F: FnOnce(&Value) -> Value,
    {
        self.set(path, Update::with(f))
    }

    /// Serialize `value` and write it at `path`.
    pub fn set_serialized<T: Serialize>(&self, path: &str, value: &T) -> Result<Dispatch> {
        let json = serde_json::to_value(value)?;
        self.set_value(path, Value::from(json))
    }

    /// Replace the whole root; every subscriber is notified.
    pub fn set_root<'a>(&self, update: impl Into<Update<'a>>) -> Dispatch {
        self.ns.set_root(update.into(), self.registry.config())
    }

    // --- Subscriptions ---

    /// Call `callback` after every write at `path`, below it, or to the root.
    pub fn subscribe<F>(&self, path: &str, callback: F) -> Result<Subscription>
    where
        F: Fn() + 'static,
    {
        self.subscribe_callback(Some(path), Rc::new(callback))
    }

    /// Call `callback` after every write to this namespace.
    pub fn subscribe_all<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + 'static,
    {
        self.ns.subscribe(None, Rc::new(callback))
    }

    /// Subscribe a shared callback; `None` subscribes to every write.
    pub fn subscribe_callback(&self, path: Option<&str>, callback: Callback) -> Result<Subscription> {
        let path = path.map(|raw| self.registry.parse(raw)).transpose()?;
        Ok(self.ns.subscribe(path, callback))
    }

    /// Live registrations in this namespace, always-on included.
    pub fn subscriber_count(&self) -> usize {
        self.ns.registration_count()
    }

    /// Listener nodes in this namespace, root included.
    pub fn listener_node_count(&self) -> usize {
        self.ns.listener_node_count()
    }
}

impl fmt::Debug for NamespacedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamespacedStore")
            .field("namespace", &self.namespace())
            .field("version", &self.version())
            .finish()
    }
}
