//! Dot-delimited path parsing and caching.

use crate::error::{Result, StoreError};
use lru::LruCache;
use std::fmt;
use std::num::NonZeroUsize;
use std::rc::Rc;

/// A parsed, non-empty path: ordered segments addressing a node inside a
/// namespace's value tree.
///
/// Cloning is cheap; segments are shared.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Path(Rc<[String]>);

impl Path {
    /// Parse a dotted string like `user.profile.name`.
    ///
    /// Empty input and empty segments (`a..b`, `.a`, `a.`) are rejected.
    pub fn parse(input: &str) -> Result<Self> {
        Ok(Path(split(input)?.into()))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no segments. Parsed paths always have at least one.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The final segment.
    pub fn leaf(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or("")
    }

    /// Format back to a dotted string.
    pub fn to_dotted(&self) -> String {
        self.0.join(".")
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({})", self.to_dotted())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_dotted())
    }
}

/// Split a dotted path into its segments.
pub fn split(input: &str) -> Result<Vec<String>> {
    if input.is_empty() {
        return Err(StoreError::InvalidPath(input.to_string()));
    }
    let segments: Vec<String> = input.split('.').map(str::to_string).collect();
    if segments.iter().any(String::is_empty) {
        return Err(StoreError::InvalidPath(input.to_string()));
    }
    Ok(segments)
}

/// Bounded cache of parsed paths, keyed by the raw string.
pub struct PathCache {
    entries: LruCache<String, Path>,
}

impl PathCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Parse `raw`, reusing a cached result when available.
    ///
    /// Invalid paths are not cached.
    pub fn resolve(&mut self, raw: &str) -> Result<Path> {
        if let Some(path) = self.entries.get(raw) {
            return Ok(path.clone());
        }
        let path = Path::parse(raw)?;
        self.entries.put(raw.to_string(), path.clone());
        Ok(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
