//! Per-namespace value tree.

use super::operations::{navigate, resolve_for_write, write_path, Miss, MissKind};
use super::path::Path;
use crate::error::{Result, StoreError};
use crate::types::Value;
use std::rc::Rc;

/// The data half of a namespace: its current root and a change counter.
pub struct DataStore {
    namespace: Rc<str>,
    root: Value,
    /// Incremented on every change to the root's identity.
    version: u64,
}

impl DataStore {
    pub fn new(namespace: Rc<str>, initial: Value) -> Self {
        Self {
            namespace,
            root: initial,
            version: 0,
        }
    }

    /// The current root. Cheap: containers are shared.
    pub fn root(&self) -> Value {
        self.root.clone()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Read the value at `path`. Intermediates are never created.
    pub fn get(&self, path: &Path) -> Result<Value> {
        navigate(&self.root, path.segments())
            .cloned()
            .ok_or_else(|| StoreError::path_not_found(&self.namespace, path.to_dotted()))
    }

    /// The current value an updater should see.
    ///
    /// A slot the write would create reads as `Null`. A write that is bound
    /// to fail reports its error here, before any updater runs.
    pub fn current_for_update(&self, path: &Path, auto_vivify: bool) -> Result<Value> {
        resolve_for_write(&self.root, path.segments(), auto_vivify)
            .map_err(|miss| self.miss_error(path, miss))
    }

    /// Write `value` at `path`. Returns whether the tree changed.
    pub fn write(&mut self, path: &Path, value: Value, auto_vivify: bool) -> Result<bool> {
        match write_path(&self.root, path.segments(), value, auto_vivify) {
            Ok(Some(new_root)) => {
                self.root = new_root;
                self.version += 1;
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(miss) => Err(self.miss_error(path, miss)),
        }
    }

    fn miss_error(&self, path: &Path, miss: Miss) -> StoreError {
        let prefix = path.segments()[..miss.prefix_len].join(".");
        match miss.kind {
            MissKind::Absent => StoreError::path_not_found(&self.namespace, prefix),
            MissKind::NotContainer => StoreError::not_container(&self.namespace, prefix),
        }
    }

    /// Replace the whole root. Returns whether its identity changed.
    pub fn replace(&mut self, value: Value) -> bool {
        if self.root.same(&value) {
            return false;
        }
        self.root = value;
        self.version += 1;
        true
    }
}
