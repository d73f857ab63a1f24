//! Namespace data: the value tree and the path machinery that addresses it.
//!
//! Writes never mutate a tree in place. A write at `a.b.c` rebuilds the
//! containers at the root, `a` and `a.b` as shallow copies and leaves every
//! other subtree shared with the previous root, so identity comparison is
//! enough to tell what changed.

mod copy;
mod data;
mod operations;
mod path;

pub use copy::shallow_copy;
pub use data::DataStore;
pub use operations::{navigate, navigate_parent, resolve_for_write, write_path, Miss, MissKind};
pub use path::{split, Path, PathCache};
