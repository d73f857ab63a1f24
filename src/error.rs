//! Error types for the path store.

use thiserror::Error;

/// Main error type for store operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("Path not found in namespace {namespace}: {path}")]
    PathNotFound { namespace: String, path: String },

    #[error("Invalid namespace: namespace name must not be empty")]
    InvalidNamespace,

    #[error("Invalid path: {0:?}")]
    InvalidPath(String),

    /// An intermediate segment resolved to a value that cannot hold children.
    #[error("Not a container in namespace {namespace}: {path}")]
    NotContainer { namespace: String, path: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl StoreError {
    pub(crate) fn path_not_found(namespace: &str, path: impl Into<String>) -> Self {
        StoreError::PathNotFound {
            namespace: namespace.to_string(),
            path: path.into(),
        }
    }

    pub(crate) fn not_container(namespace: &str, path: impl Into<String>) -> Self {
        StoreError::NotContainer {
            namespace: namespace.to_string(),
            path: path.into(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
