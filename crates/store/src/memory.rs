//! In-memory reactive document store
//!
//! MemoryStore keeps a single JSON document behind a `parking_lot::RwLock`
//! and notifies listeners after every mutation. Listeners are invoked after
//! both the document lock and the registry lock are released, so a listener
//! may read or mutate the store it observes.

use crate::registry::{ListenerRegistry, Mutation};
use parking_lot::{Mutex, RwLock};
use pathbind_core::{
    delete_at_path, get_at_path, get_at_path_mut, merge_defaults, set_at_path, ChangeAction,
    ChangeEvent, Entity, JsonPath, JsonValue, Listener, ListenerId, PathSegment, Store,
    StoreError, StoreResult,
};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// In-memory store holding one JSON document
///
/// Thread-safe through `parking_lot::RwLock` and `AtomicU64`.
/// Every successful mutation bumps [`MemoryStore::version`].
pub struct MemoryStore {
    /// The document
    root: RwLock<JsonValue>,
    /// Registered listeners
    registry: Mutex<ListenerRegistry>,
    /// Mutation counter
    version: AtomicU64,
}

impl MemoryStore {
    /// Create a store holding an empty object
    pub fn new() -> Self {
        Self::with_state(JsonValue::object())
    }

    /// Create a store holding `initial`
    pub fn with_state(initial: impl Into<JsonValue>) -> Self {
        Self {
            root: RwLock::new(initial.into()),
            registry: Mutex::new(ListenerRegistry::new()),
            version: AtomicU64::new(0),
        }
    }

    /// Deep copy of the whole document
    pub fn snapshot(&self) -> JsonValue {
        self.root.read().clone()
    }

    /// Number of mutations applied so far
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Number of live listeners
    pub fn listener_count(&self) -> usize {
        self.registry.lock().listener_count()
    }

    /// Number of listeners registered exactly at `path`
    pub fn registrations_at(&self, path: &JsonPath) -> usize {
        self.registry.lock().registrations_at(path)
    }

    /// Append `value` to the array at `path`, returning its index
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Missing`] if nothing is at `path` and
    /// [`StoreError::WrongType`] if the value there is not an array.
    pub fn push(&self, path: &JsonPath, value: impl Into<JsonValue>) -> StoreResult<usize> {
        let value = value.into();
        value.validate_depth()?;

        let (index, new_value) = {
            let mut root = self.root.write();
            let target = get_at_path_mut(&mut root, path)
                .ok_or_else(|| StoreError::Missing { path: path.clone() })?;
            let arr = match target.as_inner_mut() {
                serde_json::Value::Array(arr) => arr,
                other => {
                    return Err(StoreError::WrongType {
                        path: path.clone(),
                        expected: "array",
                        found: type_name(other),
                    })
                }
            };
            let index = arr.len();
            arr.push(value.clone().into_inner());
            (index, value)
        };

        self.dispatch(Mutation::at_path(ChangeEvent {
            path: path.clone().index(index),
            new_value: Some(new_value),
            old_value: None,
            action: ChangeAction::Create,
        }));
        Ok(index)
    }

    /// Mutate the value at `path` in place
    ///
    /// Listeners see one update carrying the before and after values. If the
    /// closure leaves the value unchanged, nothing is dispatched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Missing`] if nothing is at `path`, or a limit
    /// error if the result nests too deeply (the change is rolled back).
    pub fn update<F>(&self, path: &JsonPath, f: F) -> StoreResult<()>
    where
        F: FnOnce(&mut JsonValue),
    {
        let (old_value, new_value) = {
            let mut root = self.root.write();
            let target = get_at_path_mut(&mut root, path)
                .ok_or_else(|| StoreError::Missing { path: path.clone() })?;
            let old_value = target.clone();
            f(target);
            if let Err(e) = target.validate_depth() {
                *target = old_value;
                return Err(e.into());
            }
            (old_value, target.clone())
        };

        if ChangeAction::classify(Some(&old_value), Some(&new_value)).is_none() {
            trace!(target: "pathbind::store", path = %path, "Update left value unchanged");
            return Ok(());
        }
        self.dispatch(Mutation::at_path(ChangeEvent {
            path: path.clone(),
            new_value: Some(new_value),
            old_value: Some(old_value),
            action: ChangeAction::Update,
        }));
        Ok(())
    }

    fn next_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Deliver a mutation to its listeners
    ///
    /// Must be called with no store lock held.
    fn dispatch(&self, mutation: Mutation) {
        let version = self.next_version();
        let hits = self.registry.lock().collect(&mutation);
        debug!(
            target: "pathbind::store",
            path = %mutation.primary.path,
            action = %mutation.primary.action,
            version,
            listeners = hits.len(),
            "Mutation applied"
        );
        for (listener, event) in hits {
            listener(&event);
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("version", &self.version())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl Store for MemoryStore {
    fn get(&self, path: &JsonPath) -> Option<Entity> {
        let root = self.root.read();
        get_at_path(&root, path).map(|value| Entity::new(path.clone(), value.clone()))
    }

    fn set(&self, path: &JsonPath, value: JsonValue) -> StoreResult<()> {
        path.validate()?;
        value.validate_depth()?;

        let old_value = {
            let mut root = self.root.write();
            let old = set_at_path(&mut root, path, value.clone()).map_err(|source| {
                StoreError::Mutation {
                    path: path.clone(),
                    source,
                }
            })?;
            // The document may now exceed the nesting limit through its prefix.
            if let Err(e) = root.validate_depth() {
                match &old {
                    Some(previous) => {
                        let _ = set_at_path(&mut root, path, previous.clone());
                    }
                    None => {
                        let _ = delete_at_path(&mut root, path);
                    }
                }
                return Err(e.into());
            }
            old
        };

        let Some(action) = ChangeAction::classify(old_value.as_ref(), Some(&value)) else {
            trace!(target: "pathbind::store", path = %path, "Set left value unchanged");
            return Ok(());
        };
        self.dispatch(Mutation::at_path(ChangeEvent {
            path: path.clone(),
            new_value: Some(value),
            old_value,
            action,
        }));
        Ok(())
    }

    fn delete(&self, path: &JsonPath) -> StoreResult<Option<JsonValue>> {
        let removes_element = matches!(
            path.last_segment(),
            Some(PathSegment::Index(_))
        );

        let (removed, mutation_scope) = {
            let mut root = self.root.write();
            let parent_path = path.parent();
            let parent_before = match (&parent_path, removes_element) {
                (Some(parent), true) => get_at_path(&root, parent).cloned(),
                _ => None,
            };
            let removed = delete_at_path(&mut root, path).map_err(|source| {
                StoreError::Mutation {
                    path: path.clone(),
                    source,
                }
            })?;
            let scope = match (parent_path, parent_before) {
                (Some(parent), Some(before)) if removed.is_some() => {
                    let after = get_at_path(&root, &parent).cloned();
                    Some((parent, before, after))
                }
                _ => None,
            };
            (removed, scope)
        };

        let Some(old_value) = removed else {
            return Ok(None);
        };

        let primary = ChangeEvent {
            path: path.clone(),
            new_value: None,
            old_value: Some(old_value.clone()),
            action: ChangeAction::Delete,
        };
        let mutation = match mutation_scope {
            // Removing an array element shifts every later sibling.
            Some((scope, before, after)) => Mutation {
                primary,
                scope,
                scope_old: Some(before),
                scope_new: after,
            },
            None => Mutation::at_path(primary),
        };
        self.dispatch(mutation);
        Ok(Some(old_value))
    }

    fn apply_defaults(&self, path: &JsonPath, defaults: &JsonValue) -> StoreResult<bool> {
        path.validate()?;

        let created = {
            let mut root = self.root.write();
            let Some(target) = get_at_path_mut(&mut root, path) else {
                return Ok(false);
            };
            let before = target.clone();
            let added = merge_defaults(target, defaults);
            if let Err(e) = target.validate_depth() {
                *target = before;
                return Err(e.into());
            }
            let target: &JsonValue = target;
            added
                .into_iter()
                .filter_map(|relative| {
                    get_at_path(target, &relative)
                        .cloned()
                        .map(|value| (path.join(&relative), value))
                })
                .collect::<Vec<_>>()
        };

        let changed = !created.is_empty();
        for (field_path, value) in created {
            self.dispatch(Mutation::at_path(ChangeEvent {
                path: field_path,
                new_value: Some(value),
                old_value: None,
                action: ChangeAction::Create,
            }));
        }
        Ok(changed)
    }

    fn on(&self, paths: &[JsonPath], listener: Listener) -> ListenerId {
        let id = self.registry.lock().register(paths, listener);
        trace!(target: "pathbind::store", %id, paths = paths.len(), "Listener registered");
        id
    }

    fn off(&self, paths: &[JsonPath], id: ListenerId) {
        let removed = self.registry.lock().unregister(paths, id);
        trace!(target: "pathbind::store", %id, removed, "Listener removed");
    }
}

fn type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
