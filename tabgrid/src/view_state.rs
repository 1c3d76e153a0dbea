//! View state and its transitions.
//!
//! Every transition is a pure function of the old state and an action:
//! `ViewState::reduce` consumes the old state and returns the new one. The
//! `Grid` handle applies transitions under a single write lock, so no
//! intermediate state is ever observable.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::column::ColumnRegistry;
use crate::config::GridConfig;
use crate::layout::{Layout, LayoutFragment};
use crate::selection::Selection;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("asc"),
            SortDirection::Desc => f.write_str("desc"),
        }
    }
}

/// Current sort: a column key (or none) and a direction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: Option<String>,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn by(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: Some(key.into()),
            direction,
        }
    }
}

/// A state transition request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
    SetGlobalSearch(String),
    /// An empty value clears the filter.
    SetColumnFilter { key: String, value: String },
    /// New key sorts ascending; the same key flips direction.
    ToggleSort(String),
    SetColumnWidth { key: String, width: i64 },
    /// Move `source` into the slot `target` occupies.
    ReorderColumn { source: String, target: String },
    SetColumnVisible { key: String, visible: bool },
    SelectRow(String),
    DeselectRow(String),
    ToggleRow(String),
    SelectAll(Vec<String>),
    DeselectAll(Vec<String>),
    ClearSelection,
    /// Drop selected ids that no longer exist in the row source.
    RetainRows(HashSet<String>),
    /// Restore order, widths and visibility to the registry defaults.
    ResetLayout,
}

impl ViewAction {
    /// Whether applying this action should re-save the layout.
    pub fn requests_persistence(&self) -> bool {
        matches!(
            self,
            ViewAction::SetColumnWidth { .. }
                | ViewAction::ReorderColumn { .. }
                | ViewAction::SetColumnVisible { .. }
                | ViewAction::ResetLayout
        )
    }

    /// Whether applying this action can change the selection.
    pub fn touches_selection(&self) -> bool {
        matches!(
            self,
            ViewAction::SelectRow(_)
                | ViewAction::DeselectRow(_)
                | ViewAction::ToggleRow(_)
                | ViewAction::SelectAll(_)
                | ViewAction::DeselectAll(_)
                | ViewAction::ClearSelection
                | ViewAction::RetainRows(_)
        )
    }
}

/// Filters, sort, layout and selection for one table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewState {
    pub global_search: String,
    pub column_filters: BTreeMap<String, String>,
    pub sort: SortSpec,
    pub column_order: Vec<String>,
    pub column_widths: BTreeMap<String, u32>,
    pub visible_columns: BTreeMap<String, bool>,
    pub selection: Selection,
}

impl ViewState {
    /// Fresh state over a complete layout.
    pub fn from_layout(layout: Layout) -> Self {
        Self {
            column_order: layout.column_order,
            column_widths: layout.column_widths,
            visible_columns: layout.visible_columns,
            ..Self::default()
        }
    }

    /// The layout part of the state.
    pub fn layout(&self) -> Layout {
        Layout {
            column_order: self.column_order.clone(),
            column_widths: self.column_widths.clone(),
            visible_columns: self.visible_columns.clone(),
        }
    }

    /// The layout part as a storable fragment.
    pub fn layout_fragment(&self) -> LayoutFragment {
        self.layout().to_fragment()
    }

    pub fn width(&self, key: &str) -> Option<u32> {
        self.column_widths.get(key).copied()
    }

    pub fn is_visible(&self, key: &str) -> bool {
        self.visible_columns.get(key).copied().unwrap_or(false)
    }

    /// Visible keys in display order.
    pub fn visible_order(&self) -> Vec<String> {
        self.column_order
            .iter()
            .filter(|key| self.is_visible(key))
            .cloned()
            .collect()
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.selection.selected()
    }

    /// Apply one transition.
    pub fn reduce<R>(
        mut self,
        registry: &ColumnRegistry<R>,
        config: &GridConfig,
        action: ViewAction,
    ) -> ViewState {
        match action {
            ViewAction::SetGlobalSearch(text) => {
                self.global_search = text;
            }
            ViewAction::SetColumnFilter { key, value } => {
                if value.is_empty() {
                    self.column_filters.remove(&key);
                } else {
                    self.column_filters.insert(key, value);
                }
            }
            ViewAction::ToggleSort(key) => {
                if !registry.get(&key).is_some_and(|c| c.sortable) {
                    log::debug!("ignoring sort on non-sortable column '{}'", key);
                    return self;
                }
                if self.sort.key.as_deref() == Some(key.as_str()) {
                    self.sort.direction = self.sort.direction.flip();
                } else {
                    self.sort = SortSpec::by(key, SortDirection::Asc);
                }
            }
            ViewAction::SetColumnWidth { key, width } => {
                if registry.contains(&key) {
                    self.column_widths.insert(key, config.clamp_width(width));
                }
            }
            ViewAction::ReorderColumn { source, target } => {
                self.column_order = reorder(self.column_order, &source, &target);
            }
            ViewAction::SetColumnVisible { key, visible } => {
                if !registry.contains(&key) {
                    return self;
                }
                if !visible {
                    let others_visible = self
                        .visible_columns
                        .iter()
                        .any(|(k, v)| *v && *k != key);
                    if !others_visible {
                        log::warn!(
                            "cannot hide '{}': at least one column must remain visible",
                            key
                        );
                        return self;
                    }
                }
                self.visible_columns.insert(key, visible);
            }
            ViewAction::SelectRow(id) => {
                self.selection.select(&id);
            }
            ViewAction::DeselectRow(id) => {
                self.selection.deselect(&id);
            }
            ViewAction::ToggleRow(id) => {
                self.selection.toggle(&id);
            }
            ViewAction::SelectAll(ids) => {
                self.selection.select_all(&ids);
            }
            ViewAction::DeselectAll(ids) => {
                self.selection.deselect_all(&ids);
            }
            ViewAction::ClearSelection => {
                self.selection.clear();
            }
            ViewAction::RetainRows(existing) => {
                let dropped = self.selection.retain(&existing);
                if !dropped.is_empty() {
                    log::debug!("dropped {} stale selected id(s)", dropped.len());
                }
            }
            ViewAction::ResetLayout => {
                let defaults = registry.default_layout();
                self.column_order = defaults.column_order;
                self.column_widths = defaults.column_widths;
                self.visible_columns = defaults.visible_columns;
            }
        }
        self
    }
}

/// Remove `source` and reinsert it at the index `target` held before removal.
fn reorder(mut order: Vec<String>, source: &str, target: &str) -> Vec<String> {
    if source == target {
        return order;
    }
    let (Some(from), Some(to)) = (
        order.iter().position(|k| k == source),
        order.iter().position(|k| k == target),
    ) else {
        return order;
    };
    let moved = order.remove(from);
    order.insert(to.min(order.len()), moved);
    order
}
