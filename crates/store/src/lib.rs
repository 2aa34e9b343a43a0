//! Reactive document storage for pathbind
//!
//! This crate implements the store collaborator the binding layer observes:
//! - MemoryStore: one JSON document behind a RwLock, with change dispatch
//! - ListenerRegistry: path-indexed listeners with per-mutation dedupe
//!
//! Mutations are applied under the document lock; listeners run after every
//! lock is released.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;
pub mod registry;

pub use memory::MemoryStore;
pub use registry::{ListenerRegistry, Mutation};
