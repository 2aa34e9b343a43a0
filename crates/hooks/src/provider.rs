//! State provider: one store, one timer queue, many bindings
//!
//! The provider is what an application creates once at its root. It builds
//! the store from an optional initial state and hands out bindings that all
//! share that store, the timer queue and the binding configuration.

use crate::binding::{BindOptions, Binding};
use crate::config::BindingConfig;
use crate::host::{RenderSink, RenderState};
use crate::timer::TimerQueue;
use pathbind_core::{Clock, Entity, JsonValue, MonotonicClock, Result};
use pathbind_store::MemoryStore;
use std::sync::Arc;
use tracing::debug;

/// Shared context for every binding of one application
#[derive(Debug)]
pub struct StateProvider {
    store: Arc<MemoryStore>,
    timers: Arc<TimerQueue>,
    config: BindingConfig,
}

impl StateProvider {
    /// Provider over a store holding `initial_state` (an empty object if `None`)
    pub fn new(initial_state: Option<JsonValue>) -> Self {
        Self::with_clock(initial_state, Arc::new(MonotonicClock::new()))
    }

    /// Provider whose timers read `clock`
    pub fn with_clock(initial_state: Option<JsonValue>, clock: Arc<dyn Clock>) -> Self {
        let store = match initial_state {
            Some(state) => MemoryStore::with_state(state),
            None => MemoryStore::new(),
        };
        debug!(target: "pathbind::binding", "State provider created");
        Self {
            store: Arc::new(store),
            timers: Arc::new(TimerQueue::new(clock)),
            config: BindingConfig::default(),
        }
    }

    /// Replace the binding configuration used by bindings created afterwards
    pub fn with_config(mut self, config: BindingConfig) -> Self {
        self.config = config;
        self
    }

    /// The shared store
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// The timer queue the host must pump
    pub fn timers(&self) -> &Arc<TimerQueue> {
        &self.timers
    }

    /// Binding configuration
    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    /// New binding with its own [`RenderState`]
    pub fn create_binding(&self) -> (Binding, Arc<RenderState>) {
        let render = RenderState::new();
        let binding = self.create_binding_with_sink(render.clone());
        (binding, render)
    }

    /// New binding writing into a host-provided sink
    pub fn create_binding_with_sink(&self, sink: Arc<dyn RenderSink>) -> Binding {
        Binding::new(
            self.store.clone(),
            Arc::clone(&self.timers),
            self.config.clone(),
            sink,
        )
    }

    /// Render `binding` against this provider's store
    ///
    /// # Errors
    ///
    /// Same as [`Binding::render`].
    pub fn bind(&self, binding: &mut Binding, options: &BindOptions) -> Result<Entity> {
        binding.render(options)
    }

    /// Run due timers, returning how many fired
    pub fn pump(&self) -> usize {
        self.timers.run_due()
    }
}

impl Default for StateProvider {
    fn default() -> Self {
        Self::new(None)
    }
}
