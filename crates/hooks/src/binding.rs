//! Binding lifecycle
//!
//! A [`Binding`] is the per-component-instance half of the sync layer. Each
//! render pass materializes the bound entity and makes sure exactly one
//! [`Subscription`] (coalescer listener plus deletion watcher) is registered
//! for the entity's path. When the path changes, or the previous subscription
//! was torn down upstream, the old one is torn down and a fresh one replaces
//! it before the render returns.
//!
//! # Lifecycle
//!
//! ```text
//! render ──► materialize ──► same path & live? ──yes──► current render value
//!                                  │ no
//!                                  ▼
//!                    teardown old ─► resolve listen paths ─► subscribe
//!                                  ─► seed render state ─► fresh entity
//! ```
//!
//! Teardown is idempotent: unmount, drop, deletion and identity change may
//! all race to tear down one subscription; only the first call unregisters.

use crate::coalescer::Coalescer;
use crate::config::BindingConfig;
use crate::deletion::DeletionWatcher;
use crate::host::RenderSink;
use crate::instance::{BindingInstanceState, CoalescerState};
use crate::materialize::require_entity;
use crate::resolver::resolve_listen_paths_with;
use crate::timer::TimerQueue;
use parking_lot::Mutex;
use pathbind_core::{Entity, JsonPath, JsonValue, ListenSpec, ListenerId, Result, Store};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Arguments of one render pass
#[derive(Debug, Clone, PartialEq)]
pub struct BindOptions {
    /// Path of the bound entity, absolute or relative to the root
    pub path: String,
    /// Template used to create the entity or fill its missing fields
    pub initial_value: Option<JsonValue>,
    /// Paths to listen on instead of `[path, path.$every]`
    pub listen: Option<ListenSpec>,
    /// Overrides [`BindingConfig::create_if_missing`]
    pub create_if_missing: Option<bool>,
}

impl BindOptions {
    /// Bind `path` with no template and the default listen set
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            initial_value: None,
            listen: None,
            create_if_missing: None,
        }
    }

    /// Set the template
    pub fn initial_value(mut self, value: impl Into<JsonValue>) -> Self {
        self.initial_value = Some(value.into());
        self
    }

    /// Set the listen spec
    pub fn listen(mut self, spec: impl Into<ListenSpec>) -> Self {
        self.listen = Some(spec.into());
        self
    }

    /// Create the entity from the template if it is absent
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = Some(create);
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct Registrations {
    listener: ListenerId,
    deletion: ListenerId,
}

/// One registered coalescer/deletion-watcher pair
pub struct Subscription {
    path: JsonPath,
    listen_paths: Vec<JsonPath>,
    store: Arc<dyn Store>,
    coalescer: Arc<Coalescer>,
    state: Arc<Mutex<BindingInstanceState>>,
    registrations: Mutex<Option<Registrations>>,
}

impl Subscription {
    /// Register a fresh coalescer on `listen_paths` and a deletion watcher on `path`
    pub fn establish(
        store: Arc<dyn Store>,
        sink: Arc<dyn RenderSink>,
        timers: Arc<TimerQueue>,
        path: JsonPath,
        listen_paths: Vec<JsonPath>,
        min_interval: Duration,
    ) -> Arc<Self> {
        let state = Arc::new(Mutex::new(BindingInstanceState::new()));
        let coalescer = Arc::new(Coalescer::new(
            path.clone(),
            Arc::clone(&store),
            sink,
            timers,
            min_interval,
            Arc::clone(&state),
        ));

        let subscription = Arc::new(Subscription {
            path: path.clone(),
            listen_paths,
            store,
            coalescer,
            state,
            registrations: Mutex::new(None),
        });

        // Coalescer first: on a delete it runs before the watcher tears down.
        let listener = subscription
            .store
            .on(&subscription.listen_paths, subscription.coalescer.listener());
        let watcher = DeletionWatcher::new(path.clone(), Arc::downgrade(&subscription));
        let deletion = subscription
            .store
            .on(std::slice::from_ref(&path), watcher.into_listener());
        *subscription.registrations.lock() = Some(Registrations { listener, deletion });

        debug!(
            target: "pathbind::binding",
            path = %path,
            listen = ?subscription.listen_paths.iter().map(JsonPath::to_string).collect::<Vec<_>>(),
            "Subscribed"
        );
        subscription
    }

    /// Bound path
    pub fn path(&self) -> &JsonPath {
        &self.path
    }

    /// Resolved listen paths
    pub fn listen_paths(&self) -> &[JsonPath] {
        &self.listen_paths
    }

    /// The coalescer fed by this subscription
    pub fn coalescer(&self) -> &Arc<Coalescer> {
        &self.coalescer
    }

    /// Current coalescer state
    pub fn state(&self) -> CoalescerState {
        self.state.lock().state()
    }

    /// Whether teardown has run
    pub fn is_disposed(&self) -> bool {
        self.state.lock().is_disposed
    }

    /// Unregister both listeners and cancel pending deliveries
    ///
    /// Returns true for the call that actually tore down; every later call
    /// is a no-op returning false.
    pub fn teardown(&self) -> bool {
        if !self.state.lock().dispose() {
            return false;
        }
        self.coalescer.cancel_timer();
        let registrations = self.registrations.lock().take();
        if let Some(r) = registrations {
            self.store.off(&self.listen_paths, r.listener);
            self.store.off(std::slice::from_ref(&self.path), r.deletion);
        }
        debug!(target: "pathbind::binding", path = %self.path, "Subscription torn down");
        true
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("path", &self.path)
            .field("listen_paths", &self.listen_paths)
            .field("state", &self.state())
            .finish()
    }
}

/// Binding of one component instance to the store
pub struct Binding {
    store: Arc<dyn Store>,
    timers: Arc<TimerQueue>,
    config: BindingConfig,
    sink: Arc<dyn RenderSink>,
    subscription: Option<Arc<Subscription>>,
    listen: Option<ListenSpec>,
}

impl Binding {
    /// Unsubscribed binding writing into `sink`
    pub fn new(
        store: Arc<dyn Store>,
        timers: Arc<TimerQueue>,
        config: BindingConfig,
        sink: Arc<dyn RenderSink>,
    ) -> Self {
        Self {
            store,
            timers,
            config,
            sink,
            subscription: None,
            listen: None,
        }
    }

    /// Run one render pass
    ///
    /// Returns the fresh entity when a new subscription was established,
    /// otherwise the value last written to the render state.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::InvalidPath`](pathbind_core::BindError::InvalidPath)
    /// for a malformed path and
    /// [`BindError::PathNotFound`](pathbind_core::BindError::PathNotFound)
    /// when the entity is absent and creation was not requested.
    pub fn render(&mut self, options: &BindOptions) -> Result<Entity> {
        let create = options
            .create_if_missing
            .unwrap_or(self.config.create_if_missing);
        let entity = require_entity(
            self.store.as_ref(),
            &options.path,
            options.initial_value.as_ref(),
            create,
        )?;

        let reuse = matches!(
            &self.subscription,
            Some(sub) if !sub.is_disposed() && sub.path() == entity.path()
        );
        if reuse {
            return Ok(self.sink.current().unwrap_or(entity));
        }

        if let Some(previous) = self.subscription.take() {
            if previous.teardown() {
                debug!(
                    target: "pathbind::binding",
                    from = %previous.path(),
                    to = %entity.path(),
                    "Bound path changed"
                );
            }
        }

        self.listen = options.listen.clone();
        self.subscribe(entity.path())?;
        self.sink.seed(entity.clone());
        Ok(entity)
    }

    /// Post-mount effect: subscribe if not subscribed
    ///
    /// A no-op before the first render and while a live subscription exists.
    pub fn mount(&mut self) -> Result<()> {
        if self.is_subscribed() {
            return Ok(());
        }
        let Some(current) = self.sink.current() else {
            return Ok(());
        };
        self.subscribe(current.path())
    }

    /// Tear down the active subscription, if any
    pub fn unmount(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.teardown();
        }
    }

    /// Whether a live subscription is registered
    pub fn is_subscribed(&self) -> bool {
        self.subscription
            .as_ref()
            .map_or(false, |sub| !sub.is_disposed())
    }

    /// The most recent subscription, live or disposed
    pub fn subscription(&self) -> Option<&Arc<Subscription>> {
        self.subscription.as_ref()
    }

    /// State of the most recent subscription's coalescer
    pub fn coalescer_state(&self) -> Option<CoalescerState> {
        self.subscription.as_ref().map(|sub| sub.state())
    }

    /// The render sink this binding writes into
    pub fn sink(&self) -> &Arc<dyn RenderSink> {
        &self.sink
    }

    /// The store this binding observes
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    fn subscribe(&mut self, path: &JsonPath) -> Result<()> {
        let listen_paths = resolve_listen_paths_with(
            self.store.as_ref(),
            path,
            self.listen.as_ref(),
            self.config.default_listen_children,
        )?;
        self.subscription = Some(Subscription::establish(
            Arc::clone(&self.store),
            Arc::clone(&self.sink),
            Arc::clone(&self.timers),
            path.clone(),
            listen_paths,
            self.config.min_update_interval(),
        ));
        Ok(())
    }
}

impl Drop for Binding {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("subscription", &self.subscription)
            .field("config", &self.config)
            .finish()
    }
}
