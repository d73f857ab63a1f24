//! Change notification for namespaces.
//!
//! Each namespace owns a listener tree whose nodes mirror the paths that
//! have been subscribed to, plus an always-on set for path-less
//! subscriptions:
//! - A write at `a.b.c` reaches subscribers at `a.b.c`, `a.b`, `a` (deepest
//!   first) and then the always-on set
//! - Deeper subscribers such as `a.b.c.d` are not reached unless
//!   `Propagation::Subtree` is configured
//! - Replacing a namespace root reaches every subscriber
//!
//! Delivery is synchronous and panics in one callback do not stop the rest.
//!
//! # Example
//!
//! ```ignore
//! let sub = store.subscribe("user.name", || println!("name changed"))?;
//! store.set_value("user.name", "ada")?;
//! sub.unsubscribe();
//! ```

mod manager;
mod types;

pub use manager::{deliver, ListenerTree, Pending};
pub use types::{Callback, Dispatch, DuplicatePolicy, Propagation, Subscription, SubscriptionId};
