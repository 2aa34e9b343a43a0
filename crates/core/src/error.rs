//! Error types for pathbind
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! - [`StoreError`]: failures raised by a store collaborator
//! - [`BindError`]: the binding layer's taxonomy, surfaced to render passes

use crate::json::{JsonPath, JsonPathError, LimitError, PathParseError};
use thiserror::Error;

/// Result type alias for binding operations
pub type Result<T> = std::result::Result<T, BindError>;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by a store
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    /// Path string failed the store's path grammar
    #[error("invalid path '{path}': {source}")]
    InvalidPath {
        /// The offending path text
        path: String,
        /// Parse failure
        #[source]
        source: PathParseError,
    },

    /// Mutation could not be applied at the path
    #[error("cannot mutate {path}: {source}")]
    Mutation {
        /// Target path
        path: JsonPath,
        /// Underlying path operation failure
        #[source]
        source: JsonPathError,
    },

    /// Operation requires an existing value at the path
    #[error("no value at {path}")]
    Missing {
        /// Target path
        path: JsonPath,
    },

    /// Path or value exceeds a structural limit
    #[error("limit exceeded: {0}")]
    Limit(#[from] LimitError),

    /// Value at the path has the wrong shape for the operation
    #[error("{path} holds {found}, expected {expected}")]
    WrongType {
        /// Target path
        path: JsonPath,
        /// Expected type
        expected: &'static str,
        /// Found type
        found: &'static str,
    },
}

/// Error taxonomy of the binding layer
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BindError {
    /// Malformed or unvalidatable path. Caller bug, never retried.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// The offending path text
        path: String,
        /// Why validation failed
        reason: String,
    },

    /// Entity absent and creation not requested
    #[error("path not found: {path}")]
    PathNotFound {
        /// The path that resolved to nothing
        path: JsonPath,
    },

    /// A callback fired against a disposed binding instance
    ///
    /// Internal only: listener adapters and timer callbacks swallow it.
    #[error("stale subscription for {path}")]
    StaleSubscription {
        /// Bound path of the disposed instance
        path: JsonPath,
    },

    /// The store rejected an operation
    #[error("store error: {0}")]
    Store(StoreError),

    /// Configuration could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),
}

impl BindError {
    /// Construct an `InvalidPath` error
    pub fn invalid_path(path: impl Into<String>, reason: impl ToString) -> Self {
        BindError::InvalidPath {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error is the internal stale-callback guard
    pub fn is_stale(&self) -> bool {
        matches!(self, BindError::StaleSubscription { .. })
    }
}

impl From<StoreError> for BindError {
    // Invalid paths keep their own variant so callers see one taxonomy.
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidPath { path, source } => BindError::InvalidPath {
                path,
                reason: source.to_string(),
            },
            other => BindError::Store(other),
        }
    }
}
