//! Registry tying namespaces, data and listeners together.

use crate::error::{Result, StoreError};
use crate::handle::NamespacedStore;
use crate::state::{DataStore, Path, PathCache};
use crate::subscriptions::{
    deliver, Callback, Dispatch, DuplicatePolicy, ListenerTree, Propagation, Subscription,
};
use crate::types::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::rc::Rc;
use tracing::{debug, trace};

/// Registry configuration.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Create empty objects for absent (or null) intermediates on write.
    /// When false, such writes fail with `PathNotFound`.
    pub auto_vivify: bool,

    /// Notify subscribers even when a write leaves the value's identity
    /// unchanged. Turning this off skips dispatch for such writes.
    pub notify_unchanged: bool,

    /// Behavior for the same callback registered twice at one path.
    pub duplicate_policy: DuplicatePolicy,

    /// Which subscribers a path write reaches.
    pub propagation: Propagation,

    /// Remove listener nodes once no callbacks remain beneath them.
    pub prune_empty_nodes: bool,

    /// Number of parsed paths kept in the path cache.
    pub path_cache_capacity: NonZeroUsize,
}

/// Default path cache size.
const DEFAULT_PATH_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(256) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            auto_vivify: true,
            notify_unchanged: true,
            duplicate_policy: DuplicatePolicy::default(),
            propagation: Propagation::default(),
            prune_empty_nodes: true,
            path_cache_capacity: DEFAULT_PATH_CACHE_CAPACITY,
        }
    }
}

/// The new value for a write: a literal, or a function of the current value.
pub enum Update<'a> {
    Literal(Value),
    /// Called once, synchronously, with the value currently at the path.
    Updater(Box<dyn FnOnce(&Value) -> Value + 'a>),
}

impl<'a> Update<'a> {
    pub fn with<F>(f: F) -> Self
    where
        F: FnOnce(&Value) -> Value + 'a,
    {
        Update::Updater(Box::new(f))
    }
}

impl From<Value> for Update<'_> {
    fn from(value: Value) -> Self {
        Update::Literal(value)
    }
}

impl fmt::Debug for Update<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Update::Updater(_) => f.write_str("Updater(..)"),
        }
    }
}

/// Lifecycle of a namespace. There is no way back to `Uninitialized`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NamespaceState {
    Uninitialized,
    Active,
}

/// Everything one namespace owns.
pub(crate) struct Namespace {
    pub(crate) name: Rc<str>,
    data: RefCell<DataStore>,
    listeners: Rc<RefCell<ListenerTree>>,
}

impl Namespace {
    fn new(name: Rc<str>, initial: Value, config: &StoreConfig) -> Self {
        Self {
            data: RefCell::new(DataStore::new(Rc::clone(&name), initial)),
            listeners: Rc::new(RefCell::new(ListenerTree::new(
                config.duplicate_policy,
                config.prune_empty_nodes,
            ))),
            name,
        }
    }

    pub(crate) fn root(&self) -> Value {
        self.data.borrow().root()
    }

    pub(crate) fn version(&self) -> u64 {
        self.data.borrow().version()
    }

    pub(crate) fn get(&self, path: &Path) -> Result<Value> {
        self.data.borrow().get(path)
    }

    /// Write at `path`, then notify. No borrow is held while the updater or
    /// any callback runs.
    pub(crate) fn set(&self, path: &Path, update: Update<'_>, config: &StoreConfig) -> Result<Dispatch> {
        let value = match update {
            Update::Literal(value) => value,
            Update::Updater(f) => {
                let current = self
                    .data
                    .borrow()
                    .current_for_update(path, config.auto_vivify)?;
                f(&current)
            }
        };

        let changed = self
            .data
            .borrow_mut()
            .write(path, value, config.auto_vivify)?;
        if !changed && !config.notify_unchanged {
            trace!(namespace = %self.name, path = %path, "write left value unchanged");
            return Ok(Dispatch::default());
        }

        let plan = self
            .listeners
            .borrow()
            .plan(Some(path.segments()), config.propagation);
        trace!(namespace = %self.name, path = %path, callbacks = plan.len(), "dispatching");
        Ok(deliver(&self.name, plan))
    }

    /// Replace the whole root and notify every subscriber.
    pub(crate) fn set_root(&self, update: Update<'_>, config: &StoreConfig) -> Dispatch {
        let value = match update {
            Update::Literal(value) => value,
            Update::Updater(f) => {
                let current = self.root();
                f(&current)
            }
        };

        let changed = self.data.borrow_mut().replace(value);
        debug!(namespace = %self.name, changed, "root replaced");
        if !changed && !config.notify_unchanged {
            return Dispatch::default();
        }

        let plan = self.listeners.borrow().plan(None, config.propagation);
        deliver(&self.name, plan)
    }

    /// Overwrite the root without notifying anyone.
    pub(crate) fn replace(&self, value: Value) {
        self.data.borrow_mut().replace(value);
    }

    pub(crate) fn subscribe(&self, path: Option<Path>, callback: Callback) -> Subscription {
        let id = self
            .listeners
            .borrow_mut()
            .add(path.as_ref().map(Path::segments), callback);
        Subscription {
            id,
            path,
            tree: Rc::downgrade(&self.listeners),
            active: Cell::new(true),
        }
    }

    pub(crate) fn listener_node_count(&self) -> usize {
        self.listeners.borrow().node_count()
    }

    pub(crate) fn registration_count(&self) -> usize {
        self.listeners.borrow().registration_count()
    }
}

struct RegistryInner {
    config: StoreConfig,
    namespaces: RefCell<HashMap<Rc<str>, Rc<Namespace>>>,
    paths: RefCell<PathCache>,
}

/// Map from namespace name to its data and listeners.
///
/// A registry is an explicit value: construct one per application (or per
/// test) and hand out clones, which share state. Namespaces are created on
/// first reference and live as long as the registry. Different registries,
/// and different namespaces within one registry, never interact.
///
/// Single-threaded: the registry is neither `Send` nor `Sync`.
#[derive(Clone)]
pub struct Registry {
    inner: Rc<RegistryInner>,
}

impl Registry {
    /// Create a registry with default configuration.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        let paths = PathCache::new(config.path_cache_capacity);
        Self {
            inner: Rc::new(RegistryInner {
                config,
                namespaces: RefCell::new(HashMap::new()),
                paths: RefCell::new(paths),
            }),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Get a handle to `namespace`, creating it with `initial` if needed.
    ///
    /// If the namespace already exists, `initial` is ignored.
    pub fn store(&self, namespace: &str, initial: impl Into<Value>) -> Result<NamespacedStore> {
        let initial = initial.into();
        let ns = self.namespace(namespace, move || initial)?;
        Ok(NamespacedStore::new(self.clone(), ns))
    }

    pub fn state(&self, namespace: &str) -> NamespaceState {
        if self.lookup(namespace).is_some() {
            NamespaceState::Active
        } else {
            NamespaceState::Uninitialized
        }
    }

    /// Names of all active namespaces, sorted.
    pub fn namespaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .namespaces
            .borrow()
            .keys()
            .map(|name| name.to_string())
            .collect();
        names.sort();
        names
    }

    // --- Data ---

    /// The whole root of `namespace`.
    pub fn root(&self, namespace: &str) -> Result<Value> {
        Ok(self.namespace(namespace, Value::empty_object)?.root())
    }

    /// The value at `path` in `namespace`.
    pub fn get(&self, namespace: &str, path: &str) -> Result<Value> {
        let ns = self.namespace(namespace, Value::empty_object)?;
        ns.get(&self.parse(path)?)
    }

    /// Write at `path` and notify subscribers on that path and its ancestors.
    pub fn set<'a>(
        &self,
        namespace: &str,
        path: &str,
        update: impl Into<Update<'a>>,
    ) -> Result<Dispatch> {
        let ns = self.namespace(namespace, Value::empty_object)?;
        let path = self.parse(path)?;
        ns.set(&path, update.into(), &self.inner.config)
    }

    /// Replace the root of `namespace` and notify every subscriber.
    pub fn set_root<'a>(&self, namespace: &str, update: impl Into<Update<'a>>) -> Result<Dispatch> {
        let ns = self.namespace(namespace, Value::empty_object)?;
        Ok(ns.set_root(update.into(), &self.inner.config))
    }

    /// Initialize or force-overwrite the root of `namespace`.
    ///
    /// Does not resolve paths and does not notify.
    pub fn replace(&self, namespace: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        match self.lookup(namespace) {
            Some(ns) => {
                debug!(namespace, "root force-replaced");
                ns.replace(value);
            }
            None => {
                self.namespace(namespace, move || value)?;
            }
        }
        Ok(())
    }

    // --- Subscriptions ---

    /// Subscribe to writes at `path` or any path below it.
    pub fn subscribe<F>(&self, namespace: &str, path: &str, callback: F) -> Result<Subscription>
    where
        F: Fn() + 'static,
    {
        self.subscribe_callback(namespace, Some(path), Rc::new(callback))
    }

    /// Subscribe to every write in `namespace`.
    pub fn subscribe_all<F>(&self, namespace: &str, callback: F) -> Result<Subscription>
    where
        F: Fn() + 'static,
    {
        self.subscribe_callback(namespace, None, Rc::new(callback))
    }

    /// Subscribe a shared callback. Identity matters for `DuplicatePolicy`.
    pub fn subscribe_callback(
        &self,
        namespace: &str,
        path: Option<&str>,
        callback: Callback,
    ) -> Result<Subscription> {
        let ns = self.namespace(namespace, Value::empty_object)?;
        let path = path.map(|raw| self.parse(raw)).transpose()?;
        Ok(ns.subscribe(path, callback))
    }

    // --- Internal ---

    pub(crate) fn parse(&self, raw: &str) -> Result<Path> {
        self.inner.paths.borrow_mut().resolve(raw)
    }

    fn lookup(&self, namespace: &str) -> Option<Rc<Namespace>> {
        self.inner.namespaces.borrow().get(namespace).cloned()
    }

    /// Look up `name`, creating it from `init` on first reference.
    fn namespace<F>(&self, name: &str, init: F) -> Result<Rc<Namespace>>
    where
        F: FnOnce() -> Value,
    {
        if name.is_empty() {
            return Err(StoreError::InvalidNamespace);
        }
        if let Some(ns) = self.lookup(name) {
            return Ok(ns);
        }

        let name: Rc<str> = Rc::from(name);
        let initial = init();
        debug!(namespace = %name, kind = initial.kind(), "namespace created");
        let ns = Rc::new(Namespace::new(Rc::clone(&name), initial, &self.inner.config));
        self.inner
            .namespaces
            .borrow_mut()
            .insert(name, Rc::clone(&ns));
        Ok(ns)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.inner.config)
            .field("namespaces", &self.namespaces())
            .finish()
    }
}
