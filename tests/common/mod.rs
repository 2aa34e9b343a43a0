//! Shared test utilities for all integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from any suite's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use std::sync::{Arc, Once};
use std::time::Duration;

pub use pathbind::{
    BindError, BindOptions, Binding, BindingConfig, ChangeAction, ChangeEvent, Clock,
    CoalescerState, Entity, JsonPath, JsonValue, ListenSpec, ManualClock, MemoryStore,
    RenderSink, RenderState, StateProvider, Store,
};
pub use serde_json::json;

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route `tracing` output through the test harness (visible with --nocapture)
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .try_init();
    });
}

/// Parse a path, panicking on bad test input
pub fn path(s: &str) -> JsonPath {
    s.parse().expect("test path must parse")
}

// ============================================================================
// Harness - provider on a manual clock
// ============================================================================

/// Provider plus the manual clock driving its timers
pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub provider: StateProvider,
}

impl Harness {
    /// Harness over `initial` with the default configuration
    pub fn new(initial: serde_json::Value) -> Self {
        Self::with_config(initial, BindingConfig::default())
    }

    /// Harness over `initial` with `config`
    pub fn with_config(initial: serde_json::Value, config: BindingConfig) -> Self {
        init_tracing();
        let clock = Arc::new(ManualClock::new());
        let provider =
            StateProvider::with_clock(Some(initial.into()), clock.clone()).with_config(config);
        Self { clock, provider }
    }

    /// The shared store
    pub fn store(&self) -> &Arc<MemoryStore> {
        self.provider.store()
    }

    /// Move the clock forward and run every timer that became due
    pub fn advance_ms(&self, ms: u64) -> usize {
        self.clock.advance_ms(ms);
        self.provider.pump()
    }

    /// Replace the value at `p`
    pub fn set(&self, p: &str, value: serde_json::Value) {
        self.store().set(&path(p), value.into()).expect("set");
    }

    /// Delete the value at `p`
    pub fn delete(&self, p: &str) -> Option<JsonValue> {
        self.store().delete(&path(p)).expect("delete")
    }

    /// Snapshot of the value at `p`
    pub fn get(&self, p: &str) -> Option<JsonValue> {
        self.store().get(&path(p)).map(Entity::into_value)
    }

    /// Plain JSON at `p`, `Null` when absent
    pub fn value(&self, p: &str) -> serde_json::Value {
        self.get(p).map(JsonValue::into_inner).unwrap_or_default()
    }

    /// Mount a component rendering `options`
    pub fn mount(&self, options: BindOptions) -> TestComponent {
        let (binding, render) = self.provider.create_binding();
        let mut component = TestComponent {
            binding,
            render,
            options,
        };
        component.render().expect("first render");
        component.binding.mount().expect("mount");
        component
    }
}

// ============================================================================
// TestComponent - a host component driven by hand
// ============================================================================

/// A component instance: one binding, one render state, its current options
pub struct TestComponent {
    pub binding: Binding,
    pub render: Arc<RenderState>,
    pub options: BindOptions,
}

impl TestComponent {
    /// Run a render pass with the current options
    pub fn render(&mut self) -> Result<Entity, BindError> {
        self.binding.render(&self.options)
    }

    /// Re-render bound to a different path
    pub fn rebind(&mut self, p: &str) -> Result<Entity, BindError> {
        self.options.path = p.to_string();
        self.render()
    }

    /// Number of render-state replacements so far
    pub fn replacements(&self) -> u64 {
        self.render.replacements()
    }

    /// Value currently in the render state
    pub fn shown(&self) -> JsonValue {
        self.render
            .current()
            .map(Entity::into_value)
            .unwrap_or_default()
    }

    /// Plain JSON currently in the render state
    pub fn shown_json(&self) -> serde_json::Value {
        self.shown().into_inner()
    }

    /// Unmount effect
    pub fn unmount(&mut self) {
        self.binding.unmount();
    }
}
