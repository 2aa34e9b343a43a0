//! pathbind - keep component render state in sync with a path-addressed store
//!
//! A [`StateProvider`] owns one [`MemoryStore`] and one [`TimerQueue`]. Each
//! component instance gets a [`Binding`]; every render pass calls
//! [`Binding::render`] with the path it wants, and the binding makes sure a
//! single coalesced subscription follows that path until the component
//! unmounts, binds elsewhere, or the entity is deleted.
//!
//! # Quick Start
//!
//! ```ignore
//! use pathbind::{BindOptions, StateProvider, Store};
//! use serde_json::json;
//!
//! let provider = StateProvider::new(Some(json!({"header": {"text": "Hi"}}).into()));
//! let (mut binding, render) = provider.create_binding();
//!
//! let header = binding.render(&BindOptions::new("$.header"))?;
//! assert_eq!(header["text"], "Hi");
//!
//! provider.store().set(&"$.header.text".parse()?, "Hello".into())?;
//! provider.pump();
//! ```
//!
//! # Architecture
//!
//! - `pathbind-core`: JSON model, paths, events, the `Store` contract, clocks, errors
//! - `pathbind-store`: in-memory reference store and its listener registry
//! - `pathbind-hooks`: resolver, materializer, coalescer, deletion watcher, bindings

pub use pathbind_core::*;
pub use pathbind_hooks::*;
pub use pathbind_store::{ListenerRegistry, MemoryStore, Mutation};
