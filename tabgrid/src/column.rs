//! Column descriptors and the per-table column registry.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::layout::Layout;
use crate::row::{CellValue, GridRow};
use crate::view_state::ViewState;

/// Horizontal alignment for column content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// What a column holds. Drives default alignment only; the pipeline always
/// works on stringified values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnKind {
    #[default]
    Text,
    Number,
    Currency,
    Date,
    Boolean,
}

/// Which per-column filter input a column offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterKind {
    /// Case-insensitive substring match.
    #[default]
    Text,
    /// Exact match against one of the column's distinct values.
    Dropdown,
    /// No per-column filter.
    None,
}

/// How an aggregate total is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFormat {
    Currency,
    Number,
}

/// Footer aggregate for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Sum(AggregateFormat),
}

/// Derives a cell value from the rest of the row.
pub type ComputeFn<R> = Arc<dyn Fn(&R) -> CellValue + Send + Sync>;

/// Column configuration.
///
/// # Examples
///
/// ```ignore
/// let columns = vec![
///     ColumnDescriptor::new("shortcut", "Shortcut", 160).sortable().filterable(),
///     ColumnDescriptor::new("price", "Price", 120)
///         .kind(ColumnKind::Currency)
///         .aggregate(Aggregate::Sum(AggregateFormat::Currency)),
///     ColumnDescriptor::new("total", "Total", 120)
///         .computed(|row: &Item| (row.price * row.quantity).into()),
/// ];
/// ```
pub struct ColumnDescriptor<R> {
    /// Stable identifier, also used as the persistence key.
    pub key: String,
    pub label: String,
    pub sublabel: Option<String>,
    pub kind: ColumnKind,
    pub align: Alignment,
    pub sortable: bool,
    /// Whether the column takes part in global search.
    pub filterable: bool,
    pub filter_kind: FilterKind,
    pub default_width: u32,
    pub default_visible: bool,
    pub compute: Option<ComputeFn<R>>,
    pub aggregate: Option<Aggregate>,
}

impl<R> ColumnDescriptor<R> {
    /// Create a new column with explicit default width.
    pub fn new(key: impl Into<String>, label: impl Into<String>, default_width: u32) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            sublabel: None,
            kind: ColumnKind::Text,
            align: Alignment::Left,
            sortable: false,
            filterable: false,
            filter_kind: FilterKind::None,
            default_width,
            default_visible: true,
            compute: None,
            aggregate: None,
        }
    }

    pub fn sublabel(mut self, sublabel: impl Into<String>) -> Self {
        self.sublabel = Some(sublabel.into());
        self
    }

    /// Set the column kind. Numeric kinds are right-aligned.
    pub fn kind(mut self, kind: ColumnKind) -> Self {
        self.kind = kind;
        self.align = match kind {
            ColumnKind::Number | ColumnKind::Currency => Alignment::Right,
            ColumnKind::Boolean => Alignment::Center,
            ColumnKind::Text | ColumnKind::Date => Alignment::Left,
        };
        self
    }

    pub fn align(mut self, align: Alignment) -> Self {
        self.align = align;
        self
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// Include the column in global search and give it a text filter.
    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        if self.filter_kind == FilterKind::None {
            self.filter_kind = FilterKind::Text;
        }
        self
    }

    pub fn filter_kind(mut self, filter_kind: FilterKind) -> Self {
        self.filter_kind = filter_kind;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.default_visible = false;
        self
    }

    /// Derive the column's value from the row instead of a stored field.
    pub fn computed(mut self, compute: impl Fn(&R) -> CellValue + Send + Sync + 'static) -> Self {
        self.compute = Some(Arc::new(compute));
        self
    }

    pub fn aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = Some(aggregate);
        self
    }

    /// Whether this column's value is derived rather than stored.
    pub fn is_computed(&self) -> bool {
        self.compute.is_some()
    }

    /// Computed columns are never directly editable.
    pub fn is_editable(&self) -> bool {
        !self.is_computed()
    }
}

impl<R: GridRow> ColumnDescriptor<R> {
    /// The value this column shows for a row.
    pub fn value(&self, row: &R) -> CellValue {
        match &self.compute {
            Some(compute) => compute(row),
            None => row.field(&self.key),
        }
    }
}

impl<R> Clone for ColumnDescriptor<R> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            label: self.label.clone(),
            sublabel: self.sublabel.clone(),
            kind: self.kind,
            align: self.align,
            sortable: self.sortable,
            filterable: self.filterable,
            filter_kind: self.filter_kind,
            default_width: self.default_width,
            default_visible: self.default_visible,
            compute: self.compute.clone(),
            aggregate: self.aggregate,
        }
    }
}

impl<R> fmt::Debug for ColumnDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("kind", &self.kind)
            .field("sortable", &self.sortable)
            .field("filterable", &self.filterable)
            .field("filter_kind", &self.filter_kind)
            .field("default_width", &self.default_width)
            .field("default_visible", &self.default_visible)
            .field("computed", &self.is_computed())
            .field("aggregate", &self.aggregate)
            .finish()
    }
}

/// The column model of one table.
///
/// Built once per grid. Keys are unique; construction fails fast otherwise.
#[derive(Debug)]
pub struct ColumnRegistry<R> {
    columns: Vec<ColumnDescriptor<R>>,
    index: HashMap<String, usize>,
    /// Number of columns pinned at the end of the order (e.g. an actions
    /// column). New columns are inserted ahead of them when merging a saved
    /// layout.
    trailing_columns: usize,
}

impl<R> ColumnRegistry<R> {
    /// Build a registry, validating the descriptors.
    pub fn try_new(columns: Vec<ColumnDescriptor<R>>) -> Result<Self, ConfigError> {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            if column.key.is_empty() {
                return Err(ConfigError::EmptyKey { index: i });
            }
            if column.default_width == 0 {
                return Err(ConfigError::ZeroWidth {
                    key: column.key.clone(),
                });
            }
            if index.insert(column.key.clone(), i).is_some() {
                return Err(ConfigError::DuplicateKey {
                    key: column.key.clone(),
                });
            }
        }
        Ok(Self {
            columns,
            index,
            trailing_columns: 0,
        })
    }

    /// Build a registry, panicking on invalid descriptors.
    ///
    /// A broken column model is a programmer error; use [`try_new`](Self::try_new)
    /// when the descriptors come from outside the program.
    pub fn new(columns: Vec<ColumnDescriptor<R>>) -> Self {
        match Self::try_new(columns) {
            Ok(registry) => registry,
            Err(e) => panic!("invalid column registry: {e}"),
        }
    }

    /// Declare how many columns are pinned at the end of the order.
    pub fn with_trailing_columns(mut self, count: usize) -> Self {
        self.trailing_columns = count.min(self.columns.len());
        self
    }

    pub fn trailing_columns(&self) -> usize {
        self.trailing_columns
    }

    pub fn get(&self, key: &str) -> Option<&ColumnDescriptor<R>> {
        self.index.get(key).map(|&i| &self.columns[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> &[ColumnDescriptor<R>] {
        &self.columns
    }

    /// Keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Layout derived purely from the descriptors' defaults.
    pub fn default_layout(&self) -> Layout {
        Layout {
            column_order: self.keys().map(str::to_string).collect(),
            column_widths: self
                .columns
                .iter()
                .map(|c| (c.key.clone(), c.default_width))
                .collect::<BTreeMap<_, _>>(),
            visible_columns: self
                .columns
                .iter()
                .map(|c| (c.key.clone(), c.default_visible))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    /// View state with no filters, no sort, no selection and the default layout.
    pub fn default_view_state(&self) -> ViewState {
        ViewState::from_layout(self.default_layout())
    }
}
