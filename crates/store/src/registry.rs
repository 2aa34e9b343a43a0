//! Listener registry: path -> listener index
//!
//! Maps each registered listen path to the listeners on it, and resolves a
//! mutation into the per-listener events it produces. A listener that is
//! registered on several paths still receives at most one event per mutation.

use pathbind_core::{get_at_path, ChangeAction, ChangeEvent, JsonPath, JsonValue, Listener, ListenerId};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// A mutation as seen by the registry
///
/// `primary` is the event at the mutated path. `scope` is the subtree whose
/// before/after values decide which listeners registered *beneath* the
/// mutated path also changed: the mutated path itself, or its parent array
/// when removing an element shifts its siblings.
#[derive(Debug, Clone)]
pub struct Mutation {
    /// Event at the mutated path
    pub primary: ChangeEvent,
    /// Root of the affected subtree
    pub scope: JsonPath,
    /// Subtree before the mutation
    pub scope_old: Option<JsonValue>,
    /// Subtree after the mutation
    pub scope_new: Option<JsonValue>,
}

impl Mutation {
    /// Mutation whose affected subtree is the mutated path itself
    pub fn at_path(primary: ChangeEvent) -> Self {
        Mutation {
            scope: primary.path.clone(),
            scope_old: primary.old_value.clone(),
            scope_new: primary.new_value.clone(),
            primary,
        }
    }

    /// Event for a listener registered at `path` beneath the scope
    fn sub_event(&self, path: &JsonPath) -> Option<ChangeEvent> {
        let relative = path.relative_to(&self.scope)?;
        let old_value = self
            .scope_old
            .as_ref()
            .and_then(|v| get_at_path(v, &relative))
            .cloned();
        let new_value = self
            .scope_new
            .as_ref()
            .and_then(|v| get_at_path(v, &relative))
            .cloned();
        let action = ChangeAction::classify(old_value.as_ref(), new_value.as_ref())?;
        Some(ChangeEvent {
            path: path.clone(),
            new_value,
            old_value,
            action,
        })
    }
}

/// Registered listeners, indexed by listen path
#[derive(Default)]
pub struct ListenerRegistry {
    by_path: FxHashMap<JsonPath, SmallVec<[ListenerId; 2]>>,
    listeners: FxHashMap<ListenerId, Listener>,
    next_id: u64,
}

impl ListenerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` on each of `paths`, returning its id
    pub fn register(&mut self, paths: &[JsonPath], listener: Listener) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId::new(self.next_id);
        for path in paths {
            let ids = self.by_path.entry(path.clone()).or_default();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        self.listeners.insert(id, listener);
        id
    }

    /// Remove `id` from each of `paths`
    ///
    /// The listener itself is dropped once no path references it.
    /// Returns how many registrations were removed.
    pub fn unregister(&mut self, paths: &[JsonPath], id: ListenerId) -> usize {
        let mut removed = 0;
        for path in paths {
            if let Some(ids) = self.by_path.get_mut(path) {
                let before = ids.len();
                ids.retain(|existing| *existing != id);
                removed += before - ids.len();
                if ids.is_empty() {
                    self.by_path.remove(path);
                }
            }
        }
        if !self.by_path.values().any(|ids| ids.contains(&id)) {
            self.listeners.remove(&id);
        }
        removed
    }

    /// Number of live listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Number of listeners registered exactly at `path`
    pub fn registrations_at(&self, path: &JsonPath) -> usize {
        self.by_path.get(path).map_or(0, |ids| ids.len())
    }

    /// Resolve a mutation into `(listener, event)` pairs in registration order
    pub fn collect(&self, mutation: &Mutation) -> Vec<(Listener, ChangeEvent)> {
        let primary_path = &mutation.primary.path;
        let primary_parent = primary_path.parent();

        // Per listener: (is_primary, event). Primary beats a subtree event.
        let mut chosen: BTreeMap<ListenerId, (bool, ChangeEvent)> = BTreeMap::new();

        for (listen_path, ids) in &self.by_path {
            let candidate = match listen_path.wildcard_base() {
                Some(base) if primary_parent.as_ref() == Some(&base) => {
                    Some((true, mutation.primary.clone()))
                }
                Some(base) if mutation.scope.is_ancestor_of(&base) => {
                    mutation.sub_event(&base).map(|e| (false, e))
                }
                Some(_) => None,
                None if listen_path == primary_path => Some((true, mutation.primary.clone())),
                None if mutation.scope.is_strict_ancestor_of(listen_path) => {
                    mutation.sub_event(listen_path).map(|e| (false, e))
                }
                None => None,
            };

            let Some((is_primary, event)) = candidate else {
                continue;
            };

            for id in ids {
                match chosen.get(id) {
                    Some((true, _)) => {}
                    Some((false, _)) if !is_primary => {}
                    _ => {
                        chosen.insert(*id, (is_primary, event.clone()));
                    }
                }
            }
        }

        chosen
            .into_iter()
            .filter_map(|(id, (_, event))| self.listeners.get(&id).map(|l| (l.clone(), event)))
            .collect()
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("paths", &self.by_path.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
