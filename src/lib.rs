//! # Path Store
//!
//! A namespaced, path-addressable store with structural sharing and
//! fine-grained change notification, meant to back reactive UI state
//! without deep-equality diffing.
//!
//! ## Core Concepts
//!
//! - **Namespaces**: Isolated value trees inside a [`Registry`], created on
//!   first reference
//! - **Paths**: Dot-delimited addresses such as `user.profile.name`
//! - **Structural sharing**: A write copies only the containers on the path
//!   to the changed leaf; every sibling subtree keeps its identity
//! - **Listener tree**: Subscribers are notified for writes at their path or
//!   below it, deepest first, then always-on subscribers
//!
//! ## Example
//!
//! ```
//! use pathstore::{Registry, Value};
//! use serde_json::json;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let registry = Registry::new();
//! let store = registry
//!     .store("counter", Value::from(json!({"value": 0, "meta": {"label": "x"}})))
//!     .unwrap();
//!
//! let tally = Rc::new(Cell::new(0));
//! let seen = Rc::clone(&tally);
//! let sub = store.subscribe("value", move || seen.set(seen.get() + 1)).unwrap();
//!
//! store
//!     .update("value", |v| Value::from(v.as_i64().unwrap_or(0) + 1))
//!     .unwrap();
//! assert_eq!(tally.get(), 1);
//! assert_eq!(store.get("value").unwrap(), Value::Int(1));
//!
//! sub.unsubscribe();
//! ```

pub mod error;
pub mod handle;
pub mod state;
pub mod store;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use error::{Result, StoreError};
pub use handle::NamespacedStore;
pub use state::{shallow_copy, Path};
pub use store::{NamespaceState, Registry, StoreConfig, Update};
pub use subscriptions::{
    Callback, Dispatch, DuplicatePolicy, Propagation, Subscription, SubscriptionId,
};
pub use types::{Pattern, Value};
