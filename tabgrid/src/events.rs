//! Events a grid emits to its host.
//!
//! The grid pushes events onto its queue as transitions happen; the host
//! drains the queue after each interaction (`Grid::drain_events`) and reacts:
//! saving the layout, refreshing a bulk-action toolbar, opening an editor.

use crate::layout::LayoutFragment;
use crate::view_state::SortSpec;

/// A grid event to be handled by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridEvent {
    /// Selection changed; carries the full selected id set, sorted.
    SelectionChange(Vec<String>),
    /// Column order, widths or visibility changed; carries the full layout.
    /// Hosts persist this with `LayoutPersistence::save`.
    LayoutChange(LayoutFragment),
    /// Sort column or direction changed.
    SortChange(SortSpec),
    /// Host should open an editor for this row id.
    Edit(String),
    /// Host should delete this row id.
    Delete(String),
}

impl GridEvent {
    pub fn is_layout_change(&self) -> bool {
        matches!(self, GridEvent::LayoutChange(_))
    }
}
