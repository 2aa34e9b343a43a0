//! Render-state contract with the component host
//!
//! A binding writes into a [`RenderSink`]; the host reads the current value
//! and re-renders when it changes. [`RenderState`] is the stock sink: a cell
//! holding the last value, a replacement counter, a dirty flag and an
//! optional callback invoked synchronously on every replacement.

use parking_lot::Mutex;
use pathbind_core::Entity;
use std::fmt;
use std::sync::Arc;

/// Callback run after each replacement
pub type ReplaceCallback = Arc<dyn Fn(&Entity) + Send + Sync>;

/// Per-instance render state written by a binding
pub trait RenderSink: Send + Sync {
    /// Replace the value and request a re-render
    fn replace(&self, entity: Entity);

    /// Install the value produced by a render pass without requesting another
    fn seed(&self, entity: Entity);

    /// Value the next render should show
    fn current(&self) -> Option<Entity>;
}

#[derive(Default)]
struct RenderCell {
    current: Option<Entity>,
    replacements: u64,
    dirty: bool,
}

/// Stock [`RenderSink`]
#[derive(Default)]
pub struct RenderState {
    cell: Mutex<RenderCell>,
    on_replace: Mutex<Option<ReplaceCallback>>,
}

impl RenderState {
    /// Empty render state
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register the host's synchronous re-render hook
    pub fn set_on_replace(&self, callback: impl Fn(&Entity) + Send + Sync + 'static) {
        *self.on_replace.lock() = Some(Arc::new(callback));
    }

    /// Remove the re-render hook
    pub fn clear_on_replace(&self) {
        *self.on_replace.lock() = None;
    }

    /// Number of [`RenderSink::replace`] calls so far
    pub fn replacements(&self) -> u64 {
        self.cell.lock().replacements
    }

    /// Whether a replacement happened since the last [`take_dirty`](Self::take_dirty)
    pub fn is_dirty(&self) -> bool {
        self.cell.lock().dirty
    }

    /// Clear the dirty flag, returning its previous value
    pub fn take_dirty(&self) -> bool {
        std::mem::take(&mut self.cell.lock().dirty)
    }
}

impl RenderSink for RenderState {
    fn replace(&self, entity: Entity) {
        {
            let mut cell = self.cell.lock();
            cell.current = Some(entity.clone());
            cell.replacements += 1;
            cell.dirty = true;
        }
        // Both locks are released before the host runs.
        let callback = self.on_replace.lock().clone();
        if let Some(callback) = callback {
            callback(&entity);
        }
    }

    fn seed(&self, entity: Entity) {
        self.cell.lock().current = Some(entity);
    }

    fn current(&self) -> Option<Entity> {
        self.cell.lock().current.clone()
    }
}

impl fmt::Debug for RenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell = self.cell.lock();
        f.debug_struct("RenderState")
            .field("current", &cell.current)
            .field("replacements", &cell.replacements)
            .field("dirty", &cell.dirty)
            .finish()
    }
}
