#[path = "../common/mod.rs"]
mod common;

mod coalescing;
mod deletion;
mod lifecycle;
