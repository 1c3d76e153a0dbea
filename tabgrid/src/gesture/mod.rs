//! Pointer gestures on the header row: resize and reorder.
//!
//! A grid has one [`GestureController`]. Its [`DragState`] is a tagged union,
//! so a resize and a reorder can never be active together; entering a
//! gesture acquires the global pointer capture and leaving it (by any path)
//! releases it.

mod capture;
mod reorder;
mod resize;

pub use capture::{CaptureGuard, CaptureKind, CaptureToken, PointerCapture, RootListeners};
pub use reorder::ReorderGesture;
pub use resize::ResizeGesture;

use std::sync::Arc;

/// Transient per-grid gesture state. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Resizing(ResizeGesture),
    Reordering(ReorderGesture),
}

impl DragState {
    pub fn is_idle(&self) -> bool {
        matches!(self, DragState::Idle)
    }

    pub fn is_resizing(&self) -> bool {
        matches!(self, DragState::Resizing(_))
    }

    pub fn is_reordering(&self) -> bool {
        matches!(self, DragState::Reordering(_))
    }
}

/// Where on a header cell a press or drag started.
///
/// The resize handle, the sort label and the drag-handle icon each claim
/// their own press so they never start a competing gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderRegion {
    /// Anywhere else on the header; the native drag source.
    Body,
    /// The border strip that resizes the column.
    ResizeHandle,
    /// The clickable label that toggles sort.
    SortLabel,
    /// The grip icon. Its own press is swallowed; dragging still starts from
    /// the header as a whole.
    DragHandle,
}

/// Result of handling a header event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Event was ignored, try other handlers.
    Ignored,
    /// Event was consumed, stop propagation.
    Consumed,
    /// Event started a gesture; the host should route global pointer events
    /// to this grid until it ends.
    StartDrag,
}

impl EventResult {
    /// Check if the event was handled (consumed or started drag).
    pub fn is_handled(&self) -> bool {
        !matches!(self, EventResult::Ignored)
    }
}

/// Owns the drag state and the capture that goes with it.
#[derive(Debug, Default)]
pub struct GestureController {
    state: DragState,
    guard: Option<CaptureGuard>,
}

impl GestureController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Whether a header may start a native drag. False while resizing.
    pub fn draggable(&self) -> bool {
        !self.state.is_resizing()
    }

    /// Enter `Resizing`. A pending reorder drag is abandoned: resize takes
    /// precedence. Returns false if a resize is already in progress.
    pub fn begin_resize(
        &mut self,
        gesture: ResizeGesture,
        capture: Option<&Arc<dyn PointerCapture>>,
        table_id: &str,
    ) -> bool {
        if self.state.is_resizing() {
            return false;
        }
        self.end();
        self.guard =
            capture.map(|c| CaptureGuard::acquire(c.clone(), table_id, CaptureKind::Resize));
        self.state = DragState::Resizing(gesture);
        true
    }

    /// Enter `Reordering`. Refused while any gesture is active.
    pub fn begin_reorder(
        &mut self,
        gesture: ReorderGesture,
        capture: Option<&Arc<dyn PointerCapture>>,
        table_id: &str,
    ) -> bool {
        if !self.state.is_idle() {
            return false;
        }
        self.guard =
            capture.map(|c| CaptureGuard::acquire(c.clone(), table_id, CaptureKind::Reorder));
        self.state = DragState::Reordering(gesture);
        true
    }

    pub fn resizing(&self) -> Option<&ResizeGesture> {
        match &self.state {
            DragState::Resizing(gesture) => Some(gesture),
            _ => None,
        }
    }

    pub fn reordering(&self) -> Option<&ReorderGesture> {
        match &self.state {
            DragState::Reordering(gesture) => Some(gesture),
            _ => None,
        }
    }

    /// Return to `Idle`, releasing the capture. Returns the state that ended.
    pub fn end(&mut self) -> DragState {
        if let Some(guard) = self.guard.take() {
            guard.release();
        }
        std::mem::take(&mut self.state)
    }
}
