//! Subscription types for change notification.

use super::manager::ListenerTree;
use crate::state::Path;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// A zero-argument change callback.
///
/// Callbacks carry no payload: a subscriber reads the store again to see
/// what changed. Identity (`Rc::ptr_eq`) is what `DuplicatePolicy` uses.
pub type Callback = Rc<dyn Fn()>;

/// Unique identifier for a registration within one namespace.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

/// What happens when the same callback is registered twice at one path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// List semantics: each registration fires.
    #[default]
    Accumulate,
    /// Set semantics: a callback fires at most once per dispatch. Repeat
    /// registrations are counted so each handle removes only its own share.
    Deduplicate,
}

/// Which subscribers a write at path P reaches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Propagation {
    /// P and every ancestor of P, deepest first.
    #[default]
    Ancestors,
    /// Subscribers strictly below P first (deepest first), then P and its
    /// ancestors. Useful when whole subtrees get replaced.
    Subtree,
}

/// Outcome of delivering one change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Dispatch {
    /// Callbacks that returned normally.
    pub invoked: usize,
    /// Callbacks that panicked. Their panic was contained.
    pub panicked: usize,
}

impl Dispatch {
    /// Total callbacks attempted.
    pub fn total(&self) -> usize {
        self.invoked + self.panicked
    }
}

/// Handle to a registration.
///
/// Calling [`unsubscribe`](Subscription::unsubscribe) removes exactly the
/// registration this handle created. It is idempotent and never panics.
/// Dropping the handle without calling it leaves the callback registered.
#[must_use = "dropping a Subscription keeps the callback registered"]
pub struct Subscription {
    pub(crate) id: SubscriptionId,
    pub(crate) path: Option<Path>,
    pub(crate) tree: Weak<RefCell<ListenerTree>>,
    pub(crate) active: Cell<bool>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// The subscribed path, or `None` for an always-on subscription.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Remove the registration. Subsequent calls do nothing.
    pub fn unsubscribe(&self) {
        if !self.active.replace(false) {
            return;
        }
        let Some(tree) = self.tree.upgrade() else {
            return;
        };
        match tree.try_borrow_mut() {
            Ok(mut tree) => {
                tree.remove(self.path.as_ref().map(Path::segments), self.id);
            }
            Err(_) => {
                // Only reachable if the tree is borrowed further up this
                // stack, which the dispatcher never does while calling out.
                self.active.set(true);
                tracing::warn!(id = self.id.0, "listener tree busy, unsubscribe not applied");
            }
        };
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("active", &self.active.get())
            .finish()
    }
}
