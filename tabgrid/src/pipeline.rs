//! Filter/sort pipeline.
//!
//! `compute` is a pure function from (rows, view state, registry) to the
//! ordered, filtered rows plus footer aggregates. It is cheap enough to run
//! on every state change.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::str::FromStr;

use rust_decimal::Decimal;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::column::{Aggregate, ColumnDescriptor, ColumnRegistry, FilterKind};
use crate::format::format_aggregate;
use crate::row::{CellValue, GridRow};
use crate::selection::Selection;
use crate::view_state::{SortDirection, ViewState};

/// Footer summary for one aggregated column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateSummary {
    pub key: String,
    /// Sum over the filtered rows.
    pub total: Decimal,
    pub formatted: String,
    /// Sum over the filtered rows that are also selected, when any are.
    pub selected: Option<(Decimal, String)>,
}

impl AggregateSummary {
    /// Label and value the footer shows: the selected subtotal when there is
    /// one, else the total.
    pub fn footer(&self) -> (&'static str, &str) {
        match &self.selected {
            Some((_, formatted)) => ("Selected:", formatted),
            None => ("Total:", &self.formatted),
        }
    }
}

/// Output of the pipeline.
#[derive(Debug, Clone)]
pub struct GridView<R> {
    pub visible_rows: Vec<R>,
    pub aggregates: Vec<AggregateSummary>,
    /// Rows before filtering.
    pub total_rows: usize,
}

impl<R: GridRow> GridView<R> {
    pub fn matched_rows(&self) -> usize {
        self.visible_rows.len()
    }

    pub fn visible_ids(&self) -> Vec<String> {
        self.visible_rows.iter().map(GridRow::id).collect()
    }

    pub fn aggregate(&self, key: &str) -> Option<&AggregateSummary> {
        self.aggregates.iter().find(|a| a.key == key)
    }

    /// "Found X of Y entries" readout, shown while a search is active.
    pub fn summary(&self) -> String {
        format!("Found {} of {} entries", self.matched_rows(), self.total_rows)
    }
}

/// Run the pipeline.
pub fn compute<R: GridRow>(
    rows: &[R],
    state: &ViewState,
    registry: &ColumnRegistry<R>,
) -> GridView<R> {
    let mut visible: Vec<&R> = rows
        .iter()
        .filter(|row| matches_search(*row, &state.global_search, registry))
        .filter(|row| matches_filters(*row, state, registry))
        .collect();

    if let Some(column) = state.sort.key.as_deref().and_then(|key| registry.get(key)) {
        sort_rows(&mut visible, column, state.sort.direction);
    }

    let aggregates = aggregate(&visible, &state.selection, registry);

    GridView {
        visible_rows: visible.into_iter().cloned().collect(),
        aggregates,
        total_rows: rows.len(),
    }
}

/// Sorted unique non-empty values of a column, for dropdown filters.
pub fn distinct_values<R: GridRow>(rows: &[R], column: &ColumnDescriptor<R>) -> Vec<String> {
    rows.iter()
        .map(|row| column.value(row).display())
        .filter(|value| !value.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn matches_search<R: GridRow>(row: &R, search: &str, registry: &ColumnRegistry<R>) -> bool {
    if search.is_empty() {
        return true;
    }
    let needle = search.to_lowercase();
    registry
        .columns()
        .iter()
        .filter(|c| c.filterable)
        .any(|c| c.value(row).display().to_lowercase().contains(&needle))
}

fn matches_filters<R: GridRow>(row: &R, state: &ViewState, registry: &ColumnRegistry<R>) -> bool {
    state.column_filters.iter().all(|(key, value)| {
        if value.is_empty() {
            return true;
        }
        let Some(column) = registry.get(key) else {
            return true;
        };
        let cell = column.value(row).display();
        match column.filter_kind {
            FilterKind::Text => cell.to_lowercase().contains(&value.to_lowercase()),
            FilterKind::Dropdown => cell == *value,
            FilterKind::None => true,
        }
    })
}

fn sort_rows<R: GridRow>(rows: &mut [&R], column: &ColumnDescriptor<R>, direction: SortDirection) {
    // Stringify once per row, not once per comparison.
    let mut keyed: Vec<(String, &R)> = rows
        .iter()
        .map(|row| (column.value(row).display(), *row))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| {
        let ordering = locale_cmp(a, b);
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    for (slot, (_, row)) in rows.iter_mut().zip(keyed) {
        *slot = row;
    }
}

/// Locale-style string comparison.
///
/// Base letters decide first, with case and diacritics ignored, so "Éclair"
/// sorts between "apple" and "Zebra". Ties are broken by accents (unaccented
/// first) and then by case (lower case first):
/// "apple" < "banana" < "Banana" < "cherry".
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(base_letters(b))
        .then_with(|| lowercase(a).cmp(lowercase(b)))
        .then_with(|| b.cmp(a))
}

fn base_letters(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

fn lowercase(s: &str) -> impl Iterator<Item = char> + '_ {
    s.chars().flat_map(char::to_lowercase)
}

fn aggregate<R: GridRow>(
    rows: &[&R],
    selection: &Selection,
    registry: &ColumnRegistry<R>,
) -> Vec<AggregateSummary> {
    let selected: Vec<&R> = if selection.is_empty() {
        Vec::new()
    } else {
        rows.iter()
            .copied()
            .filter(|row| selection.is_selected(&row.id()))
            .collect()
    };

    registry
        .columns()
        .iter()
        .filter_map(|column| {
            let Aggregate::Sum(format) = column.aggregate?;
            let total = sum(rows.iter().copied(), column);
            let selected = (!selected.is_empty()).then(|| {
                let subtotal = sum(selected.iter().copied(), column);
                (subtotal, format_aggregate(subtotal, format))
            });
            Some(AggregateSummary {
                key: column.key.clone(),
                total,
                formatted: format_aggregate(total, format),
                selected,
            })
        })
        .collect()
}

/// Sum a column. A total beyond the `Decimal` range saturates at
/// `Decimal::MAX` or `Decimal::MIN`.
fn sum<'a, R: GridRow>(
    rows: impl Iterator<Item = &'a R>,
    column: &ColumnDescriptor<R>,
) -> Decimal {
    let mut total = Decimal::ZERO;
    for row in rows {
        let value = numeric(&column.value(row), &column.key);
        match total.checked_add(value) {
            Some(next) => total = next,
            None => {
                log::warn!("sum of '{}' is out of range, saturating", column.key);
                return saturated(value.is_sign_negative());
            }
        }
    }
    total
}

/// Numeric value of a cell; anything missing or unparseable counts as zero.
fn numeric(value: &CellValue, key: &str) -> Decimal {
    match value {
        CellValue::Number(n) => from_f64(*n, key),
        CellValue::Text(s) => {
            let s = s.trim();
            match Decimal::from_str(s) {
                Ok(d) => d,
                Err(_) => s.parse::<f64>().map_or(Decimal::ZERO, |n| from_f64(n, key)),
            }
        }
        CellValue::Null | CellValue::Bool(_) => Decimal::ZERO,
    }
}

fn from_f64(n: f64, key: &str) -> Decimal {
    if !n.is_finite() {
        return Decimal::ZERO;
    }
    if let Some(d) = Decimal::from_str(&n.to_string())
        .ok()
        .or_else(|| Decimal::from_f64_retain(n))
    {
        return d;
    }
    if n.abs() < 1.0 {
        // Too small to represent.
        return Decimal::ZERO;
    }
    log::warn!("value {} in '{}' is out of range, saturating", n, key);
    saturated(n.is_sign_negative())
}

fn saturated(negative: bool) -> Decimal {
    if negative { Decimal::MIN } else { Decimal::MAX }
}
