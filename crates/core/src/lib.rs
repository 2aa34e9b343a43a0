//! Core types and traits for pathbind
//!
//! This crate defines the foundational types used throughout the system:
//! - JSON model: JsonValue, JsonPath, PathSegment and path operations
//! - Entity: a value snapshot paired with its identity path
//! - Events: ChangeEvent, ChangeAction, Listener, ListenerId
//! - Traits: the Store collaborator contract and ListenSpec
//! - Clock: monotonic time sources (system-backed and manual)
//! - Error: StoreError and the BindError taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod entity;
pub mod error;
pub mod event;
pub mod json;
pub mod traits;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use entity::Entity;
pub use error::{BindError, Result, StoreError, StoreResult};
pub use event::{ChangeAction, ChangeEvent, Listener, ListenerId};
pub use json::{
    delete_at_path, get_at_path, get_at_path_mut, is_rooted, merge_defaults, set_at_path,
    JsonPath, JsonPathError, JsonValue, LimitError, PathParseError, PathSegment, EVERY_TOKEN,
    MAX_NESTING_DEPTH, MAX_PATH_LENGTH, ROOT_TOKEN,
};
pub use traits::{ListenSpec, Store};
