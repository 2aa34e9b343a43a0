//! Deletion watcher
//!
//! Listens on the exact bound path and tears the subscription down as soon
//! as the store reports that path deleted, so no listener outlives the
//! entity it was bound to.

use crate::binding::Subscription;
use pathbind_core::{ChangeEvent, JsonPath, Listener};
use std::sync::Weak;
use tracing::debug;

/// Watches one bound path for deletion
#[derive(Debug, Clone)]
pub struct DeletionWatcher {
    path: JsonPath,
    subscription: Weak<Subscription>,
}

impl DeletionWatcher {
    /// Watch `path` on behalf of `subscription`
    pub fn new(path: JsonPath, subscription: Weak<Subscription>) -> Self {
        Self { path, subscription }
    }

    /// Path being watched
    pub fn path(&self) -> &JsonPath {
        &self.path
    }

    /// React to one change event; returns true if it tore the subscription down
    pub fn on_event(&self, event: &ChangeEvent) -> bool {
        if !event.is_delete() || event.path != self.path {
            return false;
        }
        let Some(subscription) = self.subscription.upgrade() else {
            return false;
        };
        if subscription.is_disposed() {
            return false;
        }
        debug!(target: "pathbind::binding", path = %self.path, "Bound entity deleted");
        subscription.teardown()
    }

    /// Store listener wrapping this watcher
    pub fn into_listener(self) -> Listener {
        std::sync::Arc::new(move |event: &ChangeEvent| {
            self.on_event(event);
        })
    }
}
