//! Listen-path resolution
//!
//! Turns a binding's base path and optional listen spec into the concrete
//! list of paths its coalescer registers on. Pure: nothing is registered here.

use pathbind_core::{BindError, JsonPath, ListenSpec, Result, Store};

/// Resolve the listen paths for `base`
///
/// Without a spec the result is `[base, base.$every]`. Entries of a spec are
/// resolved through [`Store::resolve_relative_path`]; duplicates are dropped,
/// keeping the first occurrence.
///
/// # Errors
///
/// Returns [`BindError::InvalidPath`] if `base` is not a valid concrete path
/// or an entry fails to parse.
pub fn resolve_listen_paths(
    store: &dyn Store,
    base: &JsonPath,
    spec: Option<&ListenSpec>,
) -> Result<Vec<JsonPath>> {
    resolve_listen_paths_with(store, base, spec, true)
}

/// Like [`resolve_listen_paths`], choosing whether the default set includes children
pub fn resolve_listen_paths_with(
    store: &dyn Store,
    base: &JsonPath,
    spec: Option<&ListenSpec>,
    include_children: bool,
) -> Result<Vec<JsonPath>> {
    if base.has_wildcard() {
        return Err(BindError::invalid_path(
            base.to_string(),
            "a base path cannot contain a wildcard",
        ));
    }
    base.validate()
        .map_err(|e| BindError::invalid_path(base.to_string(), e))?;

    let resolved = match spec {
        Some(spec) => store.resolve_relative_path(base, spec)?,
        None if include_children => vec![base.clone(), base.clone().every()],
        None => vec![base.clone()],
    };

    let mut unique: Vec<JsonPath> = Vec::with_capacity(resolved.len());
    for path in resolved {
        if !unique.contains(&path) {
            unique.push(path);
        }
    }
    Ok(unique)
}
