//! Entity materialization
//!
//! Reads the entity a binding renders, creating it from a template or filling
//! in template fields it lacks. Templates are copied into the store, and the
//! returned entity is a copy of what the store holds, so neither side can
//! alias the other.

use pathbind_core::{BindError, Entity, JsonPath, JsonValue, Result, Store};
use tracing::trace;

/// Materialize the entity at `path`
///
/// - absent and `create_if_missing` is false: `Ok(None)`
/// - absent and `create_if_missing`: a copy of `initial_value` (or an empty
///   object) is stored and returned
/// - present with an `initial_value`: fields missing on the entity are
///   filled from it, never overwriting an existing one
///
/// # Errors
///
/// Returns [`BindError::InvalidPath`] for a malformed or wildcard path, and
/// [`BindError::Store`] if the store rejects the write.
pub fn materialize(
    store: &dyn Store,
    path: &str,
    initial_value: Option<&JsonValue>,
    create_if_missing: bool,
) -> Result<Option<Entity>> {
    let path = parse_bound_path(store, path)?;
    materialize_at(store, &path, initial_value, create_if_missing)
}

/// Like [`materialize`], but absence is an error
///
/// # Errors
///
/// Returns [`BindError::PathNotFound`] when no entity can be produced.
pub fn require_entity(
    store: &dyn Store,
    path: &str,
    initial_value: Option<&JsonValue>,
    create_if_missing: bool,
) -> Result<Entity> {
    let path = parse_bound_path(store, path)?;
    materialize_at(store, &path, initial_value, create_if_missing)?
        .ok_or(BindError::PathNotFound { path })
}

/// Materialize at an already parsed path
pub fn materialize_at(
    store: &dyn Store,
    path: &JsonPath,
    initial_value: Option<&JsonValue>,
    create_if_missing: bool,
) -> Result<Option<Entity>> {
    match store.get(path) {
        Some(entity) => {
            let Some(defaults) = initial_value else {
                return Ok(Some(entity));
            };
            if store.apply_defaults(path, defaults)? {
                trace!(target: "pathbind::binding", path = %path, "Merged template defaults");
                Ok(store.get(path))
            } else {
                Ok(Some(entity))
            }
        }
        None if create_if_missing => {
            let template = initial_value.cloned().unwrap_or_else(JsonValue::object);
            store.set(path, template)?;
            trace!(target: "pathbind::binding", path = %path, "Created entity from template");
            Ok(store.get(path))
        }
        None => Ok(None),
    }
}

fn parse_bound_path(store: &dyn Store, path: &str) -> Result<JsonPath> {
    let parsed = store.parse_path(path)?;
    if parsed.has_wildcard() {
        return Err(BindError::invalid_path(
            path,
            "a bound path cannot contain a wildcard",
        ));
    }
    Ok(parsed)
}
