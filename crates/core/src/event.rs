//! Change notifications emitted by a store
//!
//! A store reports every mutation as a [`ChangeEvent`] delivered to the
//! [`Listener`]s registered on matching paths.

use crate::json::{JsonPath, JsonValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Kind of mutation that produced a [`ChangeEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    /// A value appeared where none existed
    Create,
    /// An existing value was replaced or mutated in place
    Update,
    /// A value was removed
    Delete,
}

impl ChangeAction {
    /// Classify a transition from `old` to `new`
    ///
    /// Returns `None` when nothing observable changed.
    pub fn classify(old: Option<&JsonValue>, new: Option<&JsonValue>) -> Option<ChangeAction> {
        match (old, new) {
            (None, None) => None,
            (None, Some(_)) => Some(ChangeAction::Create),
            (Some(_), None) => Some(ChangeAction::Delete),
            (Some(a), Some(b)) if a == b => None,
            (Some(_), Some(_)) => Some(ChangeAction::Update),
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeAction::Create => write!(f, "create"),
            ChangeAction::Update => write!(f, "update"),
            ChangeAction::Delete => write!(f, "delete"),
        }
    }
}

/// A single mutation as seen by one listener
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Concrete path that changed
    pub path: JsonPath,
    /// Value after the mutation (`None` after a delete)
    pub new_value: Option<JsonValue>,
    /// Value before the mutation (`None` before a create)
    pub old_value: Option<JsonValue>,
    /// Kind of mutation
    pub action: ChangeAction,
}

impl ChangeEvent {
    /// Whether this event removed its path
    pub fn is_delete(&self) -> bool {
        self.action == ChangeAction::Delete
    }
}

/// Opaque handle identifying a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Wrap a raw id (stores allocate these)
    pub const fn new(raw: u64) -> Self {
        ListenerId(raw)
    }

    /// Raw id value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Callback invoked for each matching mutation
pub type Listener = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;
