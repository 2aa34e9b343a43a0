//! Per-subscription binding state
//!
//! [`BindingInstanceState`] is owned by exactly one subscription and shared
//! with its coalescer through `Arc<parking_lot::Mutex<_>>`. The lock is only
//! held for flag updates, never across a store or render-sink call.

use crate::timer::TimerId;
use pathbind_core::JsonValue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Shared cancellation flag captured by deferred callbacks
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// New, uncancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel every clone of this token
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether [`cancel`](Self::cancel) has been called on any clone
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Whether a deferred delivery is armed
///
/// `Armed` keeps the most recent old value seen while the timer waits. A
/// `None` old value (the path was just created) still counts as armed.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PendingUpdate {
    /// No delivery scheduled
    #[default]
    None,
    /// A timer will deliver
    Armed {
        /// Most recent old value seen in the window
        old_value: Option<JsonValue>,
    },
}

impl PendingUpdate {
    /// Whether a timer is armed
    pub fn is_armed(&self) -> bool {
        matches!(self, PendingUpdate::Armed { .. })
    }

    /// Clear the marker, returning the captured old value if one was armed
    pub fn take(&mut self) -> Option<Option<JsonValue>> {
        match std::mem::take(self) {
            PendingUpdate::None => None,
            PendingUpdate::Armed { old_value } => Some(old_value),
        }
    }
}

/// Observable state of a coalescer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoalescerState {
    /// Ready to deliver
    Idle,
    /// A deferred delivery is scheduled
    PendingTimer,
    /// Replacing the render state
    Applying,
    /// Torn down; terminal
    Disposed,
}

/// Mutable state of one binding instance
#[derive(Debug, Default)]
pub struct BindingInstanceState {
    /// Clock reading of the last accepted delivery
    pub last_update: Option<Duration>,
    /// Deferred delivery marker
    pub pending: PendingUpdate,
    /// Queue entry of the armed timer, if any
    pub timer: Option<TimerId>,
    /// Set while the render state is being replaced
    pub is_applying: bool,
    /// Set once on teardown, never cleared
    pub is_disposed: bool,
    /// Cancelled on teardown; captured by armed timers
    pub token: CancellationToken,
}

impl BindingInstanceState {
    /// Fresh state: idle, never delivered
    pub fn new() -> Self {
        Self::default()
    }

    /// Derived coalescer state
    pub fn state(&self) -> CoalescerState {
        if self.is_disposed {
            CoalescerState::Disposed
        } else if self.is_applying {
            CoalescerState::Applying
        } else if self.pending.is_armed() {
            CoalescerState::PendingTimer
        } else {
            CoalescerState::Idle
        }
    }

    /// Time since the last accepted delivery, `None` if there was none
    pub fn elapsed(&self, now: Duration) -> Option<Duration> {
        self.last_update.map(|t| now.saturating_sub(t))
    }

    /// Drop the armed delivery, returning its timer for the caller to cancel
    pub fn disarm(&mut self) -> Option<TimerId> {
        self.pending = PendingUpdate::None;
        self.timer.take()
    }

    /// Mark disposed and cancel armed timers
    ///
    /// Returns false if the state was already disposed.
    pub fn dispose(&mut self) -> bool {
        if self.is_disposed {
            return false;
        }
        self.is_disposed = true;
        self.pending = PendingUpdate::None;
        self.token.cancel();
        true
    }
}
