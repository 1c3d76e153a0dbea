//! Row selection state.
//!
//! Selection uses string ids so it stays stable when rows are reloaded,
//! filtered or re-sorted.

use std::collections::HashSet;

/// State of the header "select all" checkbox, computed against the rows
/// currently in view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectAllState {
    /// No visible row is selected (or nothing is visible).
    Unchecked,
    /// Some but not all visible rows are selected.
    Indeterminate,
    /// Every visible row is selected and at least one row is visible.
    Checked,
}

/// Id-based selection state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Currently selected ids
    selected: HashSet<String>,
    /// Last id toggled on or off
    anchor: Option<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all selected ids (sorted for deterministic ordering).
    pub fn selected(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.selected.iter().cloned().collect();
        ids.sort();
        ids
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    /// Clear all selection.
    /// Returns the ids that were deselected.
    pub fn clear(&mut self) -> Vec<String> {
        let removed: Vec<_> = self.selected.drain().collect();
        self.anchor = None;
        removed
    }

    /// Add an id. Returns true if it was not selected before.
    pub fn select(&mut self, id: &str) -> bool {
        self.anchor = Some(id.to_string());
        self.selected.insert(id.to_string())
    }

    /// Remove an id. Returns true if it was selected.
    pub fn deselect(&mut self, id: &str) -> bool {
        self.anchor = Some(id.to_string());
        self.selected.remove(id)
    }

    /// Toggle selection of an id.
    /// Returns (added, removed) ids.
    pub fn toggle(&mut self, id: &str) -> (Vec<String>, Vec<String>) {
        if self.deselect(id) {
            (vec![], vec![id.to_string()])
        } else {
            self.select(id);
            (vec![id.to_string()], vec![])
        }
    }

    /// Select all ids from the provided list.
    /// Returns the ids that were newly selected.
    pub fn select_all(&mut self, ids: &[String]) -> Vec<String> {
        let mut added = Vec::new();
        for id in ids {
            if self.selected.insert(id.clone()) {
                added.push(id.clone());
            }
        }
        added
    }

    /// Deselect exactly the provided ids, leaving everything else alone.
    /// Returns the ids that were removed.
    pub fn deselect_all(&mut self, ids: &[String]) -> Vec<String> {
        let removed: Vec<_> = ids
            .iter()
            .filter(|id| self.selected.remove(id.as_str()))
            .cloned()
            .collect();
        if self
            .anchor
            .as_ref()
            .is_some_and(|anchor| !self.selected.contains(anchor))
        {
            self.anchor = None;
        }
        removed
    }

    /// Drop every id not present in `existing`.
    /// Returns the ids that were dropped.
    pub fn retain(&mut self, existing: &HashSet<String>) -> Vec<String> {
        let stale: Vec<_> = self
            .selected
            .iter()
            .filter(|id| !existing.contains(*id))
            .cloned()
            .collect();
        for id in &stale {
            self.selected.remove(id);
        }
        if self
            .anchor
            .as_ref()
            .is_some_and(|anchor| !existing.contains(anchor))
        {
            self.anchor = None;
        }
        stale
    }

    /// Tri-state "select all" against the visible ids.
    pub fn select_all_state(&self, visible_ids: &[String]) -> SelectAllState {
        if visible_ids.is_empty() {
            return SelectAllState::Unchecked;
        }
        let count = visible_ids
            .iter()
            .filter(|id| self.selected.contains(id.as_str()))
            .count();
        if count == 0 {
            SelectAllState::Unchecked
        } else if count == visible_ids.len() {
            SelectAllState::Checked
        } else {
            SelectAllState::Indeterminate
        }
    }
}
