#![forbid(unsafe_code)]

//! Collaborator contracts and ledger status broadcasts.
//!
//! The engine never renders and never owns a UI; after mutating pixels it
//! asks the host [`Renderer`] for a repaint, and after every ledger change
//! it hands the host [`EventSink`] a fresh [`HistoryStatus`] so toolbars and
//! panels can refresh.

/// Snapshot of the ledger for UI display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryStatus {
    /// Whether an undo step is available.
    pub can_undo: bool,
    /// Whether a redo step is available.
    pub can_redo: bool,
    /// Entries on the undo stack.
    pub undo_count: usize,
    /// Entries on the redo stack.
    pub redo_count: usize,
    /// Memory held by history entries, in MiB.
    pub memory_usage_mb: f64,
    /// Configured memory budget, in MiB (`0.0` when unlimited).
    pub max_memory_mb: f64,
}

/// Notifications broadcast by the ledger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HistoryEvent {
    /// The ledger changed (push, undo, redo, eviction, cap change).
    HistoryChanged(HistoryStatus),
    /// Undo/redo rewrote layer state; dependent views must refresh.
    LayersRestored,
}

/// Receives ledger notifications. Implemented by the host shell.
pub trait EventSink {
    /// Deliver one event. Fire-and-forget; the ledger ignores failures.
    fn emit(&mut self, event: HistoryEvent);
}

/// Requests repaints after undo/redo mutate pixels.
pub trait Renderer {
    /// Schedule a repaint. Fire-and-forget.
    fn request_render(&mut self);
}

/// Event sink that drops everything. For detached or headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: HistoryEvent) {}
}

/// Renderer that does nothing. For detached or headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn request_render(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_impls_are_inert() {
        let mut sink = NullSink;
        sink.emit(HistoryEvent::LayersRestored);
        let mut renderer = NullRenderer;
        renderer.request_render();
    }

    #[test]
    fn status_is_plain_data() {
        let status = HistoryStatus {
            can_undo: true,
            can_redo: false,
            undo_count: 3,
            redo_count: 0,
            memory_usage_mb: 1.5,
            max_memory_mb: 64.0,
        };
        let copy = status;
        assert_eq!(copy, status);
    }
}
