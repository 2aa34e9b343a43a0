//! Store collaborator contract
//!
//! This module defines the [`Store`] trait the binding layer is written
//! against. Anything that can hold a path-addressable value tree and report
//! per-path changes can stand behind it; `pathbind-store` ships the
//! in-memory reference implementation.

use crate::entity::Entity;
use crate::error::{StoreError, StoreResult};
use crate::event::{Listener, ListenerId};
use crate::json::{is_rooted, JsonPath, JsonValue};

/// One listen path or an ordered list of them
///
/// Each entry is absolute (`$.header`) or relative to the binding's base
/// path (`subText`, `.subText`, `[0]`, `$every`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenSpec {
    /// A single path
    One(String),
    /// An ordered list of paths
    Many(Vec<String>),
}

impl ListenSpec {
    /// Entries in declaration order
    pub fn entries(&self) -> Vec<&str> {
        match self {
            ListenSpec::One(p) => vec![p.as_str()],
            ListenSpec::Many(ps) => ps.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for ListenSpec {
    fn from(p: &str) -> Self {
        ListenSpec::One(p.to_string())
    }
}

impl From<String> for ListenSpec {
    fn from(p: String) -> Self {
        ListenSpec::One(p)
    }
}

impl From<Vec<&str>> for ListenSpec {
    fn from(ps: Vec<&str>) -> Self {
        ListenSpec::Many(ps.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for ListenSpec {
    fn from(ps: Vec<String>) -> Self {
        ListenSpec::Many(ps)
    }
}

/// Path-addressable, observable value tree
///
/// Thread safety: implementations are shared through `Arc` and must be
/// `Send + Sync`. Listeners must be invoked without holding any internal
/// lock, so a listener may read or mutate the store it observes.
pub trait Store: Send + Sync {
    /// Snapshot of the value at `path`, if any
    fn get(&self, path: &JsonPath) -> Option<Entity>;

    /// Replace the value at `path`, creating intermediate containers
    ///
    /// The value is moved in, so the store never aliases caller memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot hold a value (type mismatch,
    /// index out of bounds, wildcard) or a limit is exceeded.
    fn set(&self, path: &JsonPath, value: JsonValue) -> StoreResult<()>;

    /// Remove the value at `path`, returning it if it existed
    ///
    /// # Errors
    ///
    /// Returns an error if traversal hits a type mismatch.
    fn delete(&self, path: &JsonPath) -> StoreResult<Option<JsonValue>>;

    /// Merge `defaults` into the value at `path` only where fields are unset
    ///
    /// Returns whether anything was inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is invalid.
    fn apply_defaults(&self, path: &JsonPath, defaults: &JsonValue) -> StoreResult<bool>;

    /// Register `listener` on every path in `paths`
    fn on(&self, paths: &[JsonPath], listener: Listener) -> ListenerId;

    /// Remove the registration of `id` from every path in `paths`
    fn off(&self, paths: &[JsonPath], id: ListenerId);

    /// Parse `path` against the store's grammar
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidPath`] or [`StoreError::Limit`].
    fn parse_path(&self, path: &str) -> StoreResult<JsonPath> {
        let parsed: JsonPath = path.parse().map_err(|source| StoreError::InvalidPath {
            path: path.to_string(),
            source,
        })?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Whether `path` is valid in the store's grammar
    fn validate_path(&self, path: &str) -> bool {
        self.parse_path(path).is_ok()
    }

    /// Resolve each entry of `spec` against `base`
    ///
    /// Rooted entries (`$`, `$.x`, `$[0]`) are taken as-is; everything else
    /// is appended to `base`.
    ///
    /// # Errors
    ///
    /// Returns an error if any entry fails to parse.
    fn resolve_relative_path(&self, base: &JsonPath, spec: &ListenSpec) -> StoreResult<Vec<JsonPath>> {
        spec.entries()
            .into_iter()
            .map(|entry| {
                let parsed = self.parse_path(entry)?;
                if is_rooted(entry) {
                    Ok(parsed)
                } else {
                    let joined = base.join(&parsed);
                    joined.validate()?;
                    Ok(joined)
                }
            })
            .collect()
    }
}
