//! Deadline-ordered timer queue pumped by the host event loop.
//!
//! Coalesced updates are deferred by scheduling a callback on a [`TimerQueue`].
//! The queue never spawns threads: the host calls [`TimerQueue::run_due`] from
//! its loop, and due callbacks run on that thread in deadline order.

use parking_lot::Mutex;
use pathbind_core::Clock;
use rustc_hash::FxHashSet;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, trace};

/// Handle to a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Raw sequence number
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

struct TimerEntry {
    deadline: Duration,
    sequence: u64,
    callback: Box<dyn FnOnce() + Send>,
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.sequence == other.sequence
    }
}

// Earliest deadline first, then lower sequence (older) first
impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then(other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Default)]
struct TimerHeap {
    heap: BinaryHeap<TimerEntry>,
    cancelled: FxHashSet<u64>,
}

impl TimerHeap {
    /// Pop the next live entry that is due at `now` and was scheduled before `cutoff`
    fn pop_due(&mut self, now: Duration, cutoff: u64) -> Option<TimerEntry> {
        loop {
            let next = self.heap.peek()?;
            if next.deadline > now {
                return None;
            }
            if next.sequence >= cutoff {
                // Scheduled by a callback during this pump; runs next time.
                return None;
            }
            let entry = self.heap.pop()?;
            if !self.cancelled.remove(&entry.sequence) {
                return Some(entry);
            }
        }
    }
}

/// Timer queue driven by a [`Clock`]
///
/// Thread-safe through `parking_lot::Mutex`; callbacks always run with the
/// queue unlocked, so a callback may schedule or cancel timers.
pub struct TimerQueue {
    clock: Arc<dyn Clock>,
    inner: Mutex<TimerHeap>,
    sequence: AtomicU64,
}

impl TimerQueue {
    /// Create an empty queue reading time from `clock`
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            inner: Mutex::new(TimerHeap::default()),
            sequence: AtomicU64::new(0),
        }
    }

    /// The clock deadlines are measured against
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Current reading of the queue's clock
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Run `callback` once `delay` has elapsed
    pub fn schedule(&self, delay: Duration, callback: impl FnOnce() + Send + 'static) -> TimerId {
        let sequence = self.sequence.fetch_add(1, AtomicOrdering::Relaxed);
        let deadline = self.clock.now().saturating_add(delay);
        self.inner.lock().heap.push(TimerEntry {
            deadline,
            sequence,
            callback: Box::new(callback),
        });
        trace!(target: "pathbind::timer", id = sequence, ?deadline, "Timer scheduled");
        TimerId(sequence)
    }

    /// Cancel a timer that has not fired yet
    ///
    /// Returns false if the timer already ran, was already cancelled, or is unknown.
    pub fn cancel(&self, id: TimerId) -> bool {
        let mut inner = self.inner.lock();
        let pending = inner.heap.iter().any(|e| e.sequence == id.0);
        if pending {
            inner.cancelled.insert(id.0)
        } else {
            false
        }
    }

    /// Number of timers waiting to fire
    pub fn pending(&self) -> usize {
        let inner = self.inner.lock();
        inner.heap.len() - inner.cancelled.len()
    }

    /// Deadline of the earliest live timer
    pub fn next_deadline(&self) -> Option<Duration> {
        let inner = self.inner.lock();
        inner
            .heap
            .iter()
            .filter(|e| !inner.cancelled.contains(&e.sequence))
            .map(|e| e.deadline)
            .min()
    }

    /// Run every timer that is due, returning how many ran
    ///
    /// Timers scheduled by a callback during this call wait for the next
    /// call, even when already due. A panicking callback is logged and does
    /// not stop the pump.
    pub fn run_due(&self) -> usize {
        let now = self.clock.now();
        let cutoff = self.sequence.load(AtomicOrdering::Relaxed);
        let mut ran = 0;

        loop {
            let entry = {
                let mut inner = self.inner.lock();
                match inner.pop_due(now, cutoff) {
                    Some(entry) => entry,
                    None => break,
                }
            };

            trace!(target: "pathbind::timer", id = entry.sequence, "Timer fired");
            ran += 1;

            // Execute outside lock
            if let Err(e) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(entry.callback)) {
                error!(
                    target: "pathbind::timer",
                    id = entry.sequence,
                    "timer callback panicked: {:?}",
                    e.downcast_ref::<&str>().copied().unwrap_or("(non-string panic)")
                );
            }
        }

        ran
    }
}

impl fmt::Debug for TimerQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerQueue")
            .field("now", &self.clock.now())
            .field("pending", &self.pending())
            .finish()
    }
}
