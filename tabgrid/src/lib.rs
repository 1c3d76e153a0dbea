//! Interactive data grid engine
//!
//! Column registry, filter/sort pipeline, resizable and reorderable columns,
//! row selection with bulk actions, and JSON/CSV transfer. Rendering is left
//! to the host; layout persistence lives in `tabgrid-store`.

pub mod bulk;
pub mod column;
pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod gesture;
pub mod layout;
pub mod pipeline;
pub mod row;
pub mod selection;
pub mod transfer;
pub mod view_state;

mod grid;

pub use grid::*;

pub mod prelude {
    pub use crate::bulk::{AutoConfirm, BulkOutcome, ConfirmPrompt};
    pub use crate::column::{
        Aggregate, AggregateFormat, Alignment, ColumnDescriptor, ColumnKind, ColumnRegistry,
        FilterKind,
    };
    pub use crate::config::GridConfig;
    pub use crate::error::{BulkActionError, ConfigError, ImportError, TransferError};
    pub use crate::events::GridEvent;
    pub use crate::gesture::{DragState, EventResult, HeaderRegion, PointerCapture, RootListeners};
    pub use crate::grid::{Grid, GridId};
    pub use crate::layout::{Layout, LayoutFragment};
    pub use crate::pipeline::GridView;
    pub use crate::row::{CellValue, GridRow, Record};
    pub use crate::selection::SelectAllState;
    pub use crate::transfer::ExportFormat;
    pub use crate::view_state::{SortDirection, SortSpec, ViewAction};
}
