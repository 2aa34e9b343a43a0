//! Update coalescing between store notifications and the render state
//!
//! A coalescer delivers at most once per minimum interval. A notification
//! that arrives too early, or while a delivery is in progress, arms a single
//! timer for the rest of the window; later notifications in the same window
//! only overwrite the captured old value. Deliveries always read the freshest
//! value from the store, so the last mutation in a burst wins.
//!
//! An immediate delivery supersedes any armed timer whose deadline passed
//! before the queue was pumped; that timer is cancelled rather than left to
//! deliver the same value again.
//!
//! No lock is held while calling the store or the render sink: a sink that
//! re-renders synchronously may mutate the store and re-enter the coalescer,
//! which then sees `is_applying` and defers.

use crate::host::RenderSink;
use crate::instance::{BindingInstanceState, CoalescerState, PendingUpdate};
use crate::timer::{TimerId, TimerQueue};
use parking_lot::Mutex;
use pathbind_core::{BindError, ChangeEvent, JsonPath, JsonValue, Listener, Result, Store};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{trace, warn};

enum Decision {
    Apply(Option<TimerId>),
    Arm(Duration),
    Coalesced,
}

/// Debouncing filter in front of one binding's render state
pub struct Coalescer {
    path: JsonPath,
    store: Arc<dyn Store>,
    sink: Arc<dyn RenderSink>,
    timers: Arc<TimerQueue>,
    min_interval: Duration,
    state: Arc<Mutex<BindingInstanceState>>,
}

impl Coalescer {
    /// Coalescer delivering the value at `path` into `sink`
    pub fn new(
        path: JsonPath,
        store: Arc<dyn Store>,
        sink: Arc<dyn RenderSink>,
        timers: Arc<TimerQueue>,
        min_interval: Duration,
        state: Arc<Mutex<BindingInstanceState>>,
    ) -> Self {
        Self {
            path,
            store,
            sink,
            timers,
            min_interval,
            state,
        }
    }

    /// Bound path
    pub fn path(&self) -> &JsonPath {
        &self.path
    }

    /// Current state
    pub fn state(&self) -> CoalescerState {
        self.state.lock().state()
    }

    /// Handle one notification
    ///
    /// # Errors
    ///
    /// Returns [`BindError::StaleSubscription`] if the instance was disposed.
    pub fn handle(self: &Arc<Self>, old_value: Option<JsonValue>) -> Result<()> {
        let now = self.timers.now();

        let decision = {
            let mut state = self.state.lock();
            if state.is_disposed {
                return Err(BindError::StaleSubscription {
                    path: self.path.clone(),
                });
            }

            let elapsed = state.elapsed(now);
            let window_open = elapsed.map_or(true, |e| e >= self.min_interval);
            if !state.is_applying && window_open {
                state.is_applying = true;
                Decision::Apply(state.disarm())
            } else {
                let already_armed = state.pending.is_armed();
                state.pending = PendingUpdate::Armed { old_value };
                if already_armed {
                    Decision::Coalesced
                } else {
                    let delay = elapsed
                        .map_or(Duration::ZERO, |e| self.min_interval.saturating_sub(e));
                    Decision::Arm(delay)
                }
            }
        };

        match decision {
            Decision::Apply(superseded) => {
                if let Some(id) = superseded {
                    self.timers.cancel(id);
                }
                self.apply()
            }
            Decision::Arm(delay) => {
                self.arm(delay);
                Ok(())
            }
            Decision::Coalesced => {
                trace!(target: "pathbind::coalescer", path = %self.path, "Notification coalesced");
                Ok(())
            }
        }
    }

    /// Store listener feeding this coalescer
    ///
    /// Holds the coalescer weakly; stale callbacks are logged and dropped.
    pub fn listener(self: &Arc<Self>) -> Listener {
        let weak = Arc::downgrade(self);
        let path = self.path.clone();
        Arc::new(move |event: &ChangeEvent| match weak.upgrade() {
            Some(coalescer) => coalescer.report(coalescer.handle(event.old_value.clone())),
            None => trace!(target: "pathbind::coalescer", path = %path, "Notification after drop"),
        })
    }

    fn apply(&self) -> Result<()> {
        let fresh = self.store.get(&self.path);

        let Some(entity) = fresh else {
            self.state.lock().is_applying = false;
            trace!(target: "pathbind::coalescer", path = %self.path, "Bound path vanished");
            return Ok(());
        };

        self.sink.replace(entity);

        let delivered_at = self.timers.now();
        let mut state = self.state.lock();
        state.is_applying = false;
        state.last_update = Some(delivered_at);
        trace!(target: "pathbind::coalescer", path = %self.path, ?delivered_at, "Delivered");
        Ok(())
    }

    fn arm(self: &Arc<Self>, delay: Duration) {
        let token = self.state.lock().token.clone();
        let weak: Weak<Self> = Arc::downgrade(self);
        let path = self.path.clone();

        let id = self.timers.schedule(delay, move || {
            if token.is_cancelled() {
                trace!(target: "pathbind::coalescer", path = %path, "Timer fired after teardown");
                return;
            }
            let Some(coalescer) = weak.upgrade() else {
                return;
            };
            let captured = {
                let mut state = coalescer.state.lock();
                state.timer = None;
                state.pending.take()
            };
            if let Some(old_value) = captured {
                coalescer.report(coalescer.handle(old_value));
            }
        });

        let mut state = self.state.lock();
        if state.pending.is_armed() && !state.is_disposed {
            state.timer = Some(id);
            drop(state);
            trace!(target: "pathbind::coalescer", path = %self.path, ?delay, %id, "Delivery deferred");
        } else {
            // Superseded or torn down between deciding and scheduling.
            drop(state);
            self.timers.cancel(id);
        }
    }

    /// Cancel the armed timer, if any
    ///
    /// Returns true if a queued timer was removed.
    pub fn cancel_timer(&self) -> bool {
        let armed = self.state.lock().disarm();
        armed.map_or(false, |id| self.timers.cancel(id))
    }

    fn report(&self, outcome: Result<()>) {
        match outcome {
            Ok(()) => {}
            Err(e) if e.is_stale() => {
                trace!(target: "pathbind::coalescer", path = %self.path, "Stale callback ignored");
            }
            Err(e) => {
                warn!(
                    target: "pathbind::coalescer",
                    path = %self.path,
                    error = %e,
                    "Delivery failed"
                );
            }
        }
    }
}

impl std::fmt::Debug for Coalescer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coalescer")
            .field("path", &self.path)
            .field("min_interval", &self.min_interval)
            .field("state", &self.state())
            .finish()
    }
}
