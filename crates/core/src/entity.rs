//! Materialized entity snapshots
//!
//! An [`Entity`] is the value a store holds at a path, paired with that
//! path. The path doubles as the entity's identity: two renders are bound to
//! "the same" entity exactly when their resolved paths compare equal.

use crate::json::{get_at_path, JsonPath, JsonValue};
use std::fmt;
use std::ops::Deref;

/// Value at a path, plus the path it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    path: JsonPath,
    value: JsonValue,
}

impl Entity {
    /// Pair a value with the path it lives at
    pub fn new(path: JsonPath, value: JsonValue) -> Self {
        Entity { path, value }
    }

    /// Identity token: the concrete path this entity was read from
    pub fn path(&self) -> &JsonPath {
        &self.path
    }

    /// The snapshot value
    pub fn value(&self) -> &JsonValue {
        &self.value
    }

    /// Consume into the snapshot value
    pub fn into_value(self) -> JsonValue {
        self.value
    }

    /// Whether `other` has the same identity (path), regardless of value
    pub fn same_identity(&self, other: &Entity) -> bool {
        self.path == other.path
    }

    /// Read a field relative to this entity
    pub fn field(&self, relative: &JsonPath) -> Option<&JsonValue> {
        get_at_path(&self.value, relative)
    }

    /// Absolute path of a child key, for mutating through the store
    pub fn child_path(&self, key: impl Into<String>) -> JsonPath {
        self.path.clone().key(key)
    }
}

impl Deref for Entity {
    type Target = JsonValue;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.path, self.value)
    }
}
