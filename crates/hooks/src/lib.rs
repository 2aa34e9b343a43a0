//! Binding layer between UI components and a path-addressable store
//!
//! This crate keeps a component's render state in sync with the value at a
//! store path:
//! - resolver: base path + listen spec -> listen paths
//! - materialize: read, create or fill in the bound entity
//! - coalescer: at most one render-state replacement per interval
//! - deletion: tear down when the bound entity is deleted
//! - binding: per-instance subscribe/teardown across renders
//! - timer: deadline queue pumped by the host loop
//! - host: render-sink contract and the stock RenderState
//! - provider: StateProvider, the shared application context
//! - config: BindingConfig loaded from `pathbind.toml`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod binding;
pub mod coalescer;
pub mod config;
pub mod deletion;
pub mod host;
pub mod instance;
pub mod materialize;
pub mod provider;
pub mod resolver;
pub mod timer;

pub use binding::{BindOptions, Binding, Subscription};
pub use coalescer::Coalescer;
pub use config::{BindingConfig, CONFIG_FILE_NAME, DEFAULT_MIN_UPDATE_INTERVAL_MS};
pub use deletion::DeletionWatcher;
pub use host::{RenderSink, RenderState, ReplaceCallback};
pub use instance::{BindingInstanceState, CancellationToken, CoalescerState, PendingUpdate};
pub use materialize::{materialize, materialize_at, require_entity};
pub use provider::StateProvider;
pub use resolver::{resolve_listen_paths, resolve_listen_paths_with};
pub use timer::{TimerId, TimerQueue};
