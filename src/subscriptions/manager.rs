//! Listener tree and notification dispatch.

use super::types::{Callback, Dispatch, DuplicatePolicy, Propagation, SubscriptionId};
use std::any::Any;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use tracing::warn;

/// A callback registered at one node.
struct Registration {
    id: SubscriptionId,
    callback: Callback,
    /// Handles sharing this registration. Above 1 only with `Deduplicate`.
    refs: usize,
    /// Cleared when the registration is removed.
    alive: Rc<Cell<bool>>,
}

/// A callback scheduled by [`ListenerTree::plan`].
///
/// Skipped at delivery time if its registration was removed after planning,
/// for example by a callback that ran earlier in the same dispatch.
pub struct Pending {
    callback: Callback,
    alive: Rc<Cell<bool>>,
}

impl Pending {
    pub fn is_live(&self) -> bool {
        self.alive.get()
    }
}

/// One node per subscribed path prefix.
#[derive(Default)]
struct ListenerNode {
    registrations: Vec<Registration>,
    children: BTreeMap<String, ListenerNode>,
    /// Registrations in this node and all descendants.
    live: usize,
}

/// Per-namespace tree of listener nodes, shaped like the set of subscribed
/// paths, plus the always-on set that hears every write.
pub struct ListenerTree {
    root: ListenerNode,
    always_on: Vec<Registration>,
    policy: DuplicatePolicy,
    prune: bool,
    next_id: u64,
}

impl ListenerTree {
    pub fn new(policy: DuplicatePolicy, prune: bool) -> Self {
        Self {
            root: ListenerNode::default(),
            always_on: Vec::new(),
            policy,
            prune,
            next_id: 1,
        }
    }

    /// Register `callback` at `path`, or in the always-on set for `None`.
    ///
    /// Nodes along the path are created as needed.
    pub fn add(&mut self, path: Option<&[String]>, callback: Callback) -> SubscriptionId {
        match path {
            None => register(&mut self.always_on, callback, self.policy, &mut self.next_id).0,
            Some(segments) => {
                add_at(&mut self.root, segments, callback, self.policy, &mut self.next_id).0
            }
        }
    }

    /// Drop one reference to registration `id` at `path`.
    ///
    /// Returns true if the registration itself went away. Unknown ids and
    /// paths are ignored.
    pub fn remove(&mut self, path: Option<&[String]>, id: SubscriptionId) -> bool {
        match path {
            None => unregister(&mut self.always_on, id),
            Some(segments) => remove_at(&mut self.root, segments, id, self.prune),
        }
    }

    /// Callbacks to run for a write at `path`, in delivery order.
    ///
    /// For `Some(path)`: the node at `path`, then each shorter prefix down to
    /// the root (with `Propagation::Subtree`, subscribers below `path` come
    /// first). For `None` (the whole root was replaced): every node, deeper
    /// nodes before their parents. The always-on set comes last either way.
    pub fn plan(&self, path: Option<&[String]>, propagation: Propagation) -> Vec<Pending> {
        let mut out = Vec::new();

        match path {
            None => collect_subtree(&self.root, &mut out),
            Some(segments) => {
                let mut node = &self.root;
                let mut chain = vec![node];
                for segment in segments {
                    match node.children.get(segment) {
                        Some(child) => {
                            node = child;
                            chain.push(child);
                        }
                        None => break,
                    }
                }

                let reached = chain.len() == segments.len() + 1;
                if reached && propagation == Propagation::Subtree {
                    for child in node.children.values() {
                        collect_subtree(child, &mut out);
                    }
                }

                for node in chain.iter().rev() {
                    collect_own(&node.registrations, &mut out);
                }
            }
        }

        collect_own(&self.always_on, &mut out);

        if self.policy == DuplicatePolicy::Deduplicate {
            let mut unique: Vec<Pending> = Vec::with_capacity(out.len());
            for pending in out {
                if !unique
                    .iter()
                    .any(|seen| Rc::ptr_eq(&seen.callback, &pending.callback))
                {
                    unique.push(pending);
                }
            }
            return unique;
        }

        out
    }

    /// Number of listener nodes, root included.
    pub fn node_count(&self) -> usize {
        fn count(node: &ListenerNode) -> usize {
            1 + node.children.values().map(count).sum::<usize>()
        }
        count(&self.root)
    }

    /// Number of live registrations, always-on included.
    pub fn registration_count(&self) -> usize {
        self.root.live + self.always_on.len()
    }
}

// --- Registration lists ---

fn register(
    list: &mut Vec<Registration>,
    callback: Callback,
    policy: DuplicatePolicy,
    next_id: &mut u64,
) -> (SubscriptionId, bool) {
    if policy == DuplicatePolicy::Deduplicate {
        if let Some(existing) = list
            .iter_mut()
            .find(|r| Rc::ptr_eq(&r.callback, &callback))
        {
            existing.refs += 1;
            return (existing.id, false);
        }
    }

    let id = SubscriptionId(*next_id);
    *next_id += 1;
    list.push(Registration {
        id,
        callback,
        refs: 1,
        alive: Rc::new(Cell::new(true)),
    });
    (id, true)
}

fn unregister(list: &mut Vec<Registration>, id: SubscriptionId) -> bool {
    let Some(index) = list.iter().position(|r| r.id == id) else {
        return false;
    };
    list[index].refs -= 1;
    if list[index].refs > 0 {
        return false;
    }
    list.remove(index).alive.set(false);
    true
}

// --- Tree walks ---

fn add_at(
    node: &mut ListenerNode,
    segments: &[String],
    callback: Callback,
    policy: DuplicatePolicy,
    next_id: &mut u64,
) -> (SubscriptionId, bool) {
    let (id, added) = match segments.split_first() {
        None => register(&mut node.registrations, callback, policy, next_id),
        Some((segment, rest)) => {
            let child = node.children.entry(segment.clone()).or_default();
            add_at(child, rest, callback, policy, next_id)
        }
    };
    if added {
        node.live += 1;
    }
    (id, added)
}

fn remove_at(node: &mut ListenerNode, segments: &[String], id: SubscriptionId, prune: bool) -> bool {
    let dropped = match segments.split_first() {
        None => unregister(&mut node.registrations, id),
        Some((segment, rest)) => {
            let Some(child) = node.children.get_mut(segment) else {
                return false;
            };
            let dropped = remove_at(child, rest, id, prune);
            if dropped && prune && child.live == 0 {
                node.children.remove(segment);
            }
            dropped
        }
    };
    if dropped {
        node.live -= 1;
    }
    dropped
}

fn collect_own(list: &[Registration], out: &mut Vec<Pending>) {
    out.extend(list.iter().map(|r| Pending {
        callback: Rc::clone(&r.callback),
        alive: Rc::clone(&r.alive),
    }));
}

/// Post-order: children (in key order) before the node itself.
fn collect_subtree(node: &ListenerNode, out: &mut Vec<Pending>) {
    if node.live == 0 {
        return;
    }
    for child in node.children.values() {
        collect_subtree(child, out);
    }
    collect_own(&node.registrations, out);
}

// --- Delivery ---

/// Run `plan` in order, containing panics.
///
/// A panicking callback is logged and counted; the rest still run. No store
/// state is borrowed while callbacks execute, so they may read, write,
/// subscribe and unsubscribe freely. Entries unsubscribed by an earlier
/// callback are skipped.
pub fn deliver(namespace: &str, plan: Vec<Pending>) -> Dispatch {
    let mut outcome = Dispatch::default();
    for pending in plan {
        if !pending.is_live() {
            continue;
        }
        let callback = &pending.callback;
        match panic::catch_unwind(AssertUnwindSafe(|| callback())) {
            Ok(()) => outcome.invoked += 1,
            Err(payload) => {
                outcome.panicked += 1;
                warn!(
                    namespace,
                    reason = panic_message(payload.as_ref()),
                    "subscriber panicked; continuing dispatch"
                );
            }
        }
    }
    outcome
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
