//! Column layout (order, widths, visibility) and merging of saved layouts.
//!
//! A saved layout can be older than the current column model. Merging keeps
//! the user's choices for columns that still exist, drops keys that no longer
//! exist, and slots new columns in with their defaults so they are never
//! hidden or lost.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::column::ColumnRegistry;
use crate::config::GridConfig;

/// Suffix of the persisted column-width record.
pub const WIDTHS_SUFFIX: &str = "columnWidths";
/// Suffix of the persisted visibility record.
pub const VISIBILITY_SUFFIX: &str = "visibleColumns";
/// Suffix of the persisted order record.
pub const ORDER_SUFFIX: &str = "columnOrder";

/// Storage key of the width record for a table.
pub fn widths_key(table_id: &str) -> String {
    format!("{table_id}_{WIDTHS_SUFFIX}")
}

/// Storage key of the visibility record for a table.
pub fn visibility_key(table_id: &str) -> String {
    format!("{table_id}_{VISIBILITY_SUFFIX}")
}

/// Storage key of the order record for a table.
pub fn order_key(table_id: &str) -> String {
    format!("{table_id}_{ORDER_SUFFIX}")
}

/// A complete layout: every registry column has an order slot, a width and a
/// visibility flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub column_order: Vec<String>,
    pub column_widths: BTreeMap<String, u32>,
    pub visible_columns: BTreeMap<String, bool>,
}

impl Layout {
    /// Convert to a fragment with every part present.
    pub fn to_fragment(&self) -> LayoutFragment {
        LayoutFragment {
            column_widths: Some(self.column_widths.clone()),
            visible_columns: Some(self.visible_columns.clone()),
            column_order: Some(self.column_order.clone()),
        }
    }

    /// Visible keys in display order.
    pub fn visible_order(&self) -> Vec<String> {
        self.column_order
            .iter()
            .filter(|key| self.visible_columns.get(*key).copied().unwrap_or(true))
            .cloned()
            .collect()
    }
}

/// A partial layout, as loaded from or written to storage.
///
/// Each part is stored as an independent record, so each part can be
/// missing or unreadable on its own.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_widths: Option<BTreeMap<String, u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_columns: Option<BTreeMap<String, bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_order: Option<Vec<String>>,
}

impl LayoutFragment {
    pub fn is_empty(&self) -> bool {
        self.column_widths.is_none()
            && self.visible_columns.is_none()
            && self.column_order.is_none()
    }
}

/// Merge a saved fragment over the registry defaults.
///
/// - Saved order keys unknown to the registry, and repeated keys, are dropped.
/// - Registry keys absent from the saved order are inserted ahead of the
///   registry's trailing columns when it declares any, else appended.
/// - Missing widths and visibility flags take the registry defaults; saved
///   widths are clamped to the configured minimum.
pub fn merge_layout<R>(
    fragment: &LayoutFragment,
    registry: &ColumnRegistry<R>,
    config: &GridConfig,
) -> Layout {
    let defaults = registry.default_layout();

    let column_order = match &fragment.column_order {
        Some(saved) => merge_order(saved, registry),
        None => defaults.column_order,
    };

    let mut column_widths = defaults.column_widths;
    if let Some(saved) = &fragment.column_widths {
        for (key, width) in saved {
            if let Some(slot) = column_widths.get_mut(key) {
                *slot = config.clamp_width(*width as i64);
            }
        }
    }

    let mut visible_columns = defaults.visible_columns;
    if let Some(saved) = &fragment.visible_columns {
        for (key, visible) in saved {
            if let Some(slot) = visible_columns.get_mut(key) {
                *slot = *visible;
            }
        }
    }

    // A layout that hides everything is unusable; fall back to defaults.
    if !registry.is_empty() && !visible_columns.values().any(|v| *v) {
        log::warn!("saved layout hides every column, restoring default visibility");
        visible_columns = registry.default_layout().visible_columns;
    }

    Layout {
        column_order,
        column_widths,
        visible_columns,
    }
}

fn merge_order<R>(saved: &[String], registry: &ColumnRegistry<R>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(registry.len());
    let mut order: Vec<String> = saved
        .iter()
        .filter(|key| registry.contains(key) && seen.insert(key.as_str()))
        .cloned()
        .collect();

    let missing: Vec<String> = registry
        .keys()
        .filter(|key| !seen.contains(key))
        .map(str::to_string)
        .collect();
    if missing.is_empty() {
        return order;
    }

    log::debug!("merging {} new column(s) into saved order", missing.len());
    let trailing = registry.trailing_columns();
    if trailing > 0 && order.len() >= trailing {
        let at = order.len() - trailing;
        order.splice(at..at, missing);
    } else {
        order.extend(missing);
    }
    order
}
