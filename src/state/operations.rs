//! Navigation and structural-sharing writes over a value tree.

use super::copy::shallow_copy;
use crate::types::{parse_index, Value};
use std::rc::Rc;

/// Why a write could not reach its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissKind {
    /// A segment was absent (or an array index out of range).
    Absent,
    /// A value on the way down cannot hold children.
    NotContainer,
}

/// A failed write, with the length of the offending path prefix.
///
/// For `Absent` the prefix ends at the missing segment; for `NotContainer`
/// it ends at the value that could not be descended into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Miss {
    pub kind: MissKind,
    pub prefix_len: usize,
}

/// Resolve a path for reading. Never creates anything.
pub fn navigate<'a>(root: &'a Value, segments: &[String]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(root, |node, segment| node.child(segment))
}

/// Resolve the container holding the last segment.
///
/// Returns `None` if any intermediate is absent or the holder is not a
/// container.
pub fn navigate_parent<'a>(root: &'a Value, segments: &[String]) -> Option<&'a Value> {
    let (_, parents) = segments.split_last()?;
    navigate(root, parents).filter(|node| node.is_container())
}

/// The value a write at `segments` would replace, without writing anything.
///
/// Fails with the same `Miss` as [`write_path`] would. A slot that does not
/// exist yet, including one under intermediates the write would vivify,
/// reads as `Null`.
pub fn resolve_for_write(root: &Value, segments: &[String], auto_vivify: bool) -> Result<Value, Miss> {
    let mut node = root;
    for (depth, segment) in segments.iter().enumerate() {
        if !node.is_container() {
            return Err(Miss {
                kind: MissKind::NotContainer,
                prefix_len: depth,
            });
        }

        let child = node.child(segment);
        if let (None, Value::Array(items)) = (child, node) {
            // Only an append slot can be created in an array.
            if parse_index(segment) != Some(items.len()) {
                return Err(Miss {
                    kind: MissKind::Absent,
                    prefix_len: depth + 1,
                });
            }
        }

        if depth + 1 == segments.len() {
            return Ok(child.cloned().unwrap_or_default());
        }

        match child {
            Some(Value::Null) | None if auto_vivify => return Ok(Value::Null),
            Some(Value::Null) | None => {
                return Err(Miss {
                    kind: MissKind::Absent,
                    prefix_len: depth + 1,
                })
            }
            Some(child) => node = child,
        }
    }
    Ok(root.clone())
}

/// Write `value` at `segments` below `root`.
///
/// Returns `Ok(None)` when the existing leaf is the same value (nothing is
/// copied). Otherwise returns the new root: every container on the path is
/// replaced by a shallow copy, while every sibling subtree keeps its
/// identity. With `auto_vivify`, absent or null intermediates become empty
/// objects.
pub fn write_path(
    root: &Value,
    segments: &[String],
    value: Value,
    auto_vivify: bool,
) -> Result<Option<Value>, Miss> {
    write_in(root, segments, 0, value, auto_vivify)
}

fn write_in(
    container: &Value,
    segments: &[String],
    depth: usize,
    value: Value,
    auto_vivify: bool,
) -> Result<Option<Value>, Miss> {
    let Some((segment, rest)) = segments[depth..].split_first() else {
        return Ok(Some(value));
    };

    if !container.is_container() {
        return Err(Miss {
            kind: MissKind::NotContainer,
            prefix_len: depth,
        });
    }

    if rest.is_empty() {
        if let Some(existing) = container.child(segment) {
            if existing.same(&value) {
                return Ok(None);
            }
        }
        return with_child(container, segment, value, depth).map(Some);
    }

    let child = match container.child(segment) {
        Some(Value::Null) | None if auto_vivify => Value::empty_object(),
        Some(Value::Null) | None => {
            return Err(Miss {
                kind: MissKind::Absent,
                prefix_len: depth + 1,
            })
        }
        Some(child) => child.clone(),
    };

    match write_in(&child, segments, depth + 1, value, auto_vivify)? {
        None => Ok(None),
        Some(new_child) => with_child(container, segment, new_child, depth).map(Some),
    }
}

/// A shallow copy of `container` with one slot rebound.
fn with_child(container: &Value, segment: &str, value: Value, depth: usize) -> Result<Value, Miss> {
    let absent = Miss {
        kind: MissKind::Absent,
        prefix_len: depth + 1,
    };
    match shallow_copy(container) {
        Value::Object(mut map) => {
            Rc::make_mut(&mut map).insert(segment.to_string(), value);
            Ok(Value::Object(map))
        }
        Value::Array(mut items) => {
            let index = parse_index(segment).ok_or(absent)?;
            let items_mut = Rc::make_mut(&mut items);
            if index < items_mut.len() {
                items_mut[index] = value;
            } else if index == items_mut.len() {
                items_mut.push(value);
            } else {
                return Err(absent);
            }
            Ok(Value::Array(items))
        }
        _ => Err(Miss {
            kind: MissKind::NotContainer,
            prefix_len: depth,
        }),
    }
}
