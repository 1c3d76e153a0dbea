//! The grid handle.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::bulk::{BulkOutcome, ConfirmPrompt, confirmation_message};
use crate::column::{ColumnDescriptor, ColumnRegistry};
use crate::config::GridConfig;
use crate::error::{BulkActionError, ImportError, TransferError};
use crate::events::GridEvent;
use crate::gesture::{
    DragState, EventResult, GestureController, HeaderRegion, PointerCapture, ReorderGesture,
    ResizeGesture,
};
use crate::layout::{Layout, LayoutFragment, merge_layout};
use crate::pipeline::{GridView, compute, distinct_values};
use crate::row::GridRow;
use crate::selection::SelectAllState;
use crate::transfer::{ExportFormat, export_csv, export_json, import_json};
use crate::view_state::{SortSpec, ViewAction, ViewState};

/// Unique identifier for a Grid instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridId(usize);

impl GridId {
    fn new() -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl fmt::Display for GridId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "__grid_{}", self.0)
    }
}

/// Internal state for the Grid.
struct GridInner<R: GridRow> {
    /// The full row source, in host order.
    rows: Vec<R>,
    /// Filters, sort, layout and selection.
    state: ViewState,
    /// Resize/reorder gesture and its capture.
    gestures: GestureController,
    /// Root event target for global listeners during gestures.
    capture: Option<Arc<dyn PointerCapture>>,
    /// Events waiting for the host.
    events: Vec<GridEvent>,
}

impl<R: GridRow> GridInner<R> {
    fn push_event(&mut self, event: GridEvent) {
        // Consecutive layout changes (a resize drag) collapse into the latest.
        if event.is_layout_change()
            && self.events.last().is_some_and(GridEvent::is_layout_change)
        {
            self.events.pop();
        }
        self.events.push(event);
    }

    /// Restrict a selection action to ids present in the row source.
    /// Returns `None` when nothing is left to do.
    fn known_selection(&self, action: ViewAction) -> Option<ViewAction> {
        let known: HashSet<String> = match &action {
            ViewAction::SelectRow(_) | ViewAction::ToggleRow(_) | ViewAction::SelectAll(_) => {
                self.rows.iter().map(GridRow::id).collect()
            }
            _ => return Some(action),
        };
        match action {
            ViewAction::SelectRow(id) | ViewAction::ToggleRow(id) if !known.contains(&id) => {
                log::debug!("ignoring selection of unknown row '{}'", id);
                None
            }
            ViewAction::SelectAll(ids) => Some(ViewAction::SelectAll(
                ids.into_iter().filter(|id| known.contains(id)).collect(),
            )),
            other => Some(other),
        }
    }
}

/// An interactive data grid over rows of type `R`.
///
/// `Grid<R>` combines:
/// - a column registry (supplied once, immutable)
/// - view state: global search, column filters, sort, layout, selection
/// - resize and reorder gestures with scoped global pointer capture
/// - an event queue the host drains after each interaction
///
/// The handle is cheap to clone; clones share state. Every operation takes
/// the write lock once, so transitions are atomic to observers.
pub struct Grid<R: GridRow> {
    /// Unique identifier.
    id: GridId,
    config: Arc<GridConfig>,
    registry: Arc<ColumnRegistry<R>>,
    /// Internal state.
    inner: Arc<RwLock<GridInner<R>>>,
    /// Dirty flag for re-render.
    dirty: Arc<AtomicBool>,
}

impl<R: GridRow> Clone for Grid<R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            config: self.config.clone(),
            registry: self.registry.clone(),
            inner: self.inner.clone(),
            dirty: self.dirty.clone(),
        }
    }
}

impl<R: GridRow> fmt::Debug for Grid<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("id", &self.id)
            .field("table_id", &self.config.table_id)
            .field("columns", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl<R: GridRow> Grid<R> {
    /// Create a grid with the registry's default layout.
    pub fn new(config: GridConfig, registry: ColumnRegistry<R>, rows: Vec<R>) -> Self {
        let layout = registry.default_layout();
        Self::with_layout(config, registry, rows, layout)
    }

    /// Create a grid seeded with a saved layout fragment, merged over the
    /// registry defaults.
    pub fn with_saved_layout(
        config: GridConfig,
        registry: ColumnRegistry<R>,
        rows: Vec<R>,
        fragment: &LayoutFragment,
    ) -> Self {
        let layout = merge_layout(fragment, &registry, &config);
        Self::with_layout(config, registry, rows, layout)
    }

    /// Create a grid with a complete layout.
    pub fn with_layout(
        config: GridConfig,
        registry: ColumnRegistry<R>,
        rows: Vec<R>,
        layout: Layout,
    ) -> Self {
        log::debug!(
            "grid '{}' created with {} column(s), {} row(s)",
            config.table_id,
            registry.len(),
            rows.len()
        );
        Self {
            id: GridId::new(),
            config: Arc::new(config),
            registry: Arc::new(registry),
            inner: Arc::new(RwLock::new(GridInner {
                rows,
                state: ViewState::from_layout(layout),
                gestures: GestureController::new(),
                capture: None,
                events: Vec::new(),
            })),
            dirty: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Route global listeners for gestures through this root target.
    pub fn with_pointer_capture(self, capture: Arc<dyn PointerCapture>) -> Self {
        if let Ok(mut guard) = self.inner.write() {
            guard.capture = Some(capture);
        }
        self
    }

    pub fn id(&self) -> GridId {
        self.id
    }

    pub fn table_id(&self) -> &str {
        &self.config.table_id
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn registry(&self) -> &ColumnRegistry<R> {
        &self.registry
    }

    /// Check and clear the re-render flag.
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::SeqCst)
    }

    /// Take all pending events.
    pub fn drain_events(&self) -> Vec<GridEvent> {
        self.inner
            .write()
            .map(|mut g| std::mem::take(&mut g.events))
            .unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Rows
    // -------------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.inner.read().map(|g| g.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All rows, in host order.
    pub fn rows(&self) -> Vec<R> {
        self.inner
            .read()
            .map(|g| g.rows.clone())
            .unwrap_or_default()
    }

    pub fn find_row(&self, id: &str) -> Option<R> {
        self.inner
            .read()
            .ok()
            .and_then(|g| g.rows.iter().find(|row| row.id() == id).cloned())
    }

    /// Replace the row source. Selected ids that no longer exist are
    /// dropped silently.
    pub fn set_rows(&self, rows: Vec<R>) {
        if let Ok(mut guard) = self.inner.write() {
            let existing: HashSet<String> = rows.iter().map(GridRow::id).collect();
            guard.rows = rows;
            self.apply(&mut guard, ViewAction::RetainRows(existing));
            self.dirty.store(true, Ordering::SeqCst);
        }
    }

    // -------------------------------------------------------------------------
    // View
    // -------------------------------------------------------------------------

    /// Filtered, sorted rows and aggregates for rendering.
    pub fn view(&self) -> GridView<R> {
        match self.inner.read() {
            Ok(g) => compute(&g.rows, &g.state, &self.registry),
            Err(_) => GridView {
                visible_rows: Vec::new(),
                aggregates: Vec::new(),
                total_rows: 0,
            },
        }
    }

    /// Snapshot of the view state.
    pub fn state(&self) -> ViewState {
        self.inner
            .read()
            .map(|g| g.state.clone())
            .unwrap_or_default()
    }

    pub fn layout(&self) -> Layout {
        self.inner
            .read()
            .map(|g| g.state.layout())
            .unwrap_or_else(|_| self.registry.default_layout())
    }

    /// Visible columns in display order, with their current widths.
    pub fn visible_columns(&self) -> Vec<(ColumnDescriptor<R>, u32)> {
        let Ok(g) = self.inner.read() else {
            return Vec::new();
        };
        g.state
            .visible_order()
            .iter()
            .filter_map(|key| {
                let column = self.registry.get(key)?;
                let width = g.state.width(key).unwrap_or(column.default_width);
                Some((column.clone(), width))
            })
            .collect()
    }

    /// Options for a dropdown filter over the full row source.
    pub fn filter_options(&self, key: &str) -> Vec<String> {
        let Some(column) = self.registry.get(key) else {
            return Vec::new();
        };
        self.inner
            .read()
            .map(|g| distinct_values(&g.rows, column))
            .unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    /// Apply a view action. Returns true if the state changed.
    pub fn dispatch(&self, action: ViewAction) -> bool {
        match self.inner.write() {
            Ok(mut guard) => self.apply(&mut guard, action),
            Err(_) => false,
        }
    }

    fn apply(&self, inner: &mut GridInner<R>, action: ViewAction) -> bool {
        let Some(action) = inner.known_selection(action) else {
            return false;
        };
        let persist = action.requests_persistence();
        let touches_selection = action.touches_selection();
        let before = std::mem::take(&mut inner.state);
        let after = before.clone().reduce(&self.registry, &self.config, action);
        if after == before {
            inner.state = after;
            return false;
        }

        if persist && after.layout() != before.layout() {
            inner.push_event(GridEvent::LayoutChange(after.layout_fragment()));
        }
        if touches_selection && after.selection.selected() != before.selection.selected() {
            inner.push_event(GridEvent::SelectionChange(after.selected_ids()));
        }
        if after.sort != before.sort {
            inner.push_event(GridEvent::SortChange(after.sort.clone()));
        }
        inner.state = after;
        self.dirty.store(true, Ordering::SeqCst);
        true
    }

    pub fn set_global_search(&self, text: impl Into<String>) -> bool {
        self.dispatch(ViewAction::SetGlobalSearch(text.into()))
    }

    pub fn set_column_filter(&self, key: impl Into<String>, value: impl Into<String>) -> bool {
        self.dispatch(ViewAction::SetColumnFilter {
            key: key.into(),
            value: value.into(),
        })
    }

    pub fn toggle_sort(&self, key: impl Into<String>) -> bool {
        self.dispatch(ViewAction::ToggleSort(key.into()))
    }

    pub fn sort(&self) -> SortSpec {
        self.inner
            .read()
            .map(|g| g.state.sort.clone())
            .unwrap_or_default()
    }

    pub fn set_column_width(&self, key: impl Into<String>, width: i64) -> bool {
        self.dispatch(ViewAction::SetColumnWidth {
            key: key.into(),
            width,
        })
    }

    pub fn reorder_column(&self, source: impl Into<String>, target: impl Into<String>) -> bool {
        self.dispatch(ViewAction::ReorderColumn {
            source: source.into(),
            target: target.into(),
        })
    }

    pub fn set_column_visible(&self, key: impl Into<String>, visible: bool) -> bool {
        self.dispatch(ViewAction::SetColumnVisible {
            key: key.into(),
            visible,
        })
    }

    /// Restore order, widths and visibility to the registry defaults.
    pub fn reset_layout(&self) -> bool {
        self.dispatch(ViewAction::ResetLayout)
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    pub fn select_row(&self, id: impl Into<String>) -> bool {
        self.dispatch(ViewAction::SelectRow(id.into()))
    }

    pub fn deselect_row(&self, id: impl Into<String>) -> bool {
        self.dispatch(ViewAction::DeselectRow(id.into()))
    }

    pub fn toggle_row(&self, id: impl Into<String>) -> bool {
        self.dispatch(ViewAction::ToggleRow(id.into()))
    }

    pub fn select_all(&self, ids: Vec<String>) -> bool {
        self.dispatch(ViewAction::SelectAll(ids))
    }

    pub fn clear_selection(&self) -> bool {
        self.dispatch(ViewAction::ClearSelection)
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.inner
            .read()
            .map(|g| g.state.selected_ids())
            .unwrap_or_default()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.inner
            .read()
            .map(|g| g.state.selection.is_selected(id))
            .unwrap_or(false)
    }

    /// Selected rows, in host order.
    pub fn selected_rows(&self) -> Vec<R> {
        self.inner
            .read()
            .map(|g| {
                g.rows
                    .iter()
                    .filter(|row| g.state.selection.is_selected(&row.id()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Header checkbox state against the current filtered view.
    pub fn select_all_state(&self) -> SelectAllState {
        let Ok(g) = self.inner.read() else {
            return SelectAllState::Unchecked;
        };
        let visible = compute(&g.rows, &g.state, &self.registry).visible_ids();
        g.state.selection.select_all_state(&visible)
    }

    /// Toggle the header checkbox: select exactly the visible rows, or
    /// deselect exactly the visible rows when all are already selected.
    /// Selections outside the current view are left alone.
    pub fn toggle_select_all(&self) -> SelectAllState {
        let Ok(mut guard) = self.inner.write() else {
            return SelectAllState::Unchecked;
        };
        let visible = compute(&guard.rows, &guard.state, &self.registry).visible_ids();
        let action = match guard.state.selection.select_all_state(&visible) {
            SelectAllState::Checked => ViewAction::DeselectAll(visible.clone()),
            SelectAllState::Unchecked | SelectAllState::Indeterminate => {
                ViewAction::SelectAll(visible.clone())
            }
        };
        self.apply(&mut guard, action);
        guard.state.selection.select_all_state(&visible)
    }

    // -------------------------------------------------------------------------
    // Row actions
    // -------------------------------------------------------------------------

    /// Ask the host to edit a row.
    pub fn request_edit(&self, id: impl Into<String>) {
        if let Ok(mut guard) = self.inner.write() {
            guard.push_event(GridEvent::Edit(id.into()));
        }
    }

    /// Ask the host to delete a row.
    pub fn request_delete(&self, id: impl Into<String>) {
        if let Ok(mut guard) = self.inner.write() {
            guard.push_event(GridEvent::Delete(id.into()));
        }
    }

    /// Run a destructive action over the selected rows.
    ///
    /// Asks for confirmation first; a declined prompt leaves everything as it
    /// was. Once the action has run the selection is cleared whether it
    /// succeeded or failed, since the dataset it referred to has changed.
    pub async fn run_bulk_action<F, Fut, T, E>(
        &self,
        verb: &str,
        prompt: &dyn ConfirmPrompt,
        action: F,
    ) -> Result<BulkOutcome<T>, BulkActionError<E>>
    where
        F: FnOnce(Vec<R>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + 'static,
    {
        let selected = self.selected_rows();
        if selected.is_empty() {
            return Err(BulkActionError::EmptySelection);
        }

        if !prompt.confirm(&confirmation_message(verb, selected.len())).await {
            log::debug!("bulk '{}' cancelled on '{}'", verb, self.config.table_id);
            return Ok(BulkOutcome::Cancelled);
        }

        log::info!(
            "bulk '{}' on {} row(s) of '{}'",
            verb,
            selected.len(),
            self.config.table_id
        );
        let result = action(selected).await;
        self.clear_selection();

        match result {
            Ok(value) => Ok(BulkOutcome::Completed(value)),
            Err(e) => {
                log::warn!("bulk '{}' failed on '{}': {}", verb, self.config.table_id, e);
                Err(BulkActionError::Action(e))
            }
        }
    }

    // -------------------------------------------------------------------------
    // Gestures
    // -------------------------------------------------------------------------

    pub fn drag_state(&self) -> DragState {
        self.inner
            .read()
            .map(|g| g.gestures.state().clone())
            .unwrap_or_default()
    }

    /// Whether headers may start a native drag right now.
    pub fn draggable(&self) -> bool {
        self.inner
            .read()
            .map(|g| g.gestures.draggable())
            .unwrap_or(false)
    }

    /// Pointer pressed on a header region.
    ///
    /// A press on the resize handle starts a resize from the column's current
    /// width. A press on the drag-handle icon is swallowed so it cannot start
    /// a competing gesture.
    pub fn on_header_press(&self, key: &str, region: HeaderRegion, pointer_x: i64) -> EventResult {
        if !self.registry.contains(key) {
            return EventResult::Ignored;
        }
        match region {
            HeaderRegion::ResizeHandle => {
                let Ok(mut guard) = self.inner.write() else {
                    return EventResult::Ignored;
                };
                let width = guard
                    .state
                    .width(key)
                    .or_else(|| self.registry.get(key).map(|c| c.default_width))
                    .unwrap_or(self.config.min_column_width);
                let capture = guard.capture.clone();
                let started = guard.gestures.begin_resize(
                    ResizeGesture::begin(key, pointer_x, width),
                    capture.as_ref(),
                    &self.config.table_id,
                );
                if started {
                    log::debug!("resize '{}' from width {}", key, width);
                    EventResult::StartDrag
                } else {
                    EventResult::Consumed
                }
            }
            HeaderRegion::DragHandle => EventResult::Consumed,
            HeaderRegion::SortLabel | HeaderRegion::Body => EventResult::Ignored,
        }
    }

    /// Pointer clicked on a header region. Only the sort label reacts.
    pub fn on_header_click(&self, key: &str, region: HeaderRegion) -> EventResult {
        if region != HeaderRegion::SortLabel {
            return EventResult::Ignored;
        }
        if !self.draggable() {
            // Releasing a resize over the label is not a click.
            return EventResult::Consumed;
        }
        if self.toggle_sort(key) {
            EventResult::Consumed
        } else {
            EventResult::Ignored
        }
    }

    /// Global pointer move. While resizing, applies the new width
    /// immediately and returns it.
    pub fn pointer_move(&self, pointer_x: i64) -> Option<u32> {
        let mut guard = self.inner.write().ok()?;
        let (key, width) = {
            let gesture = guard.gestures.resizing()?;
            (
                gesture.key.clone(),
                gesture.width_at(pointer_x, self.config.min_column_width),
            )
        };
        self.apply(
            &mut guard,
            ViewAction::SetColumnWidth {
                key,
                width: width as i64,
            },
        );
        Some(width)
    }

    /// Global pointer release. Ends a resize; returns true if one was active.
    pub fn pointer_up(&self) -> bool {
        let Ok(mut guard) = self.inner.write() else {
            return false;
        };
        if !guard.gestures.state().is_resizing() {
            return false;
        }
        if let DragState::Resizing(gesture) = guard.gestures.end() {
            log::debug!(
                "resize '{}' committed at {:?}",
                gesture.key,
                guard.state.width(&gesture.key)
            );
        }
        true
    }

    /// Native `dragstart` on a header. Refused while resizing, and from the
    /// resize handle or the sort label.
    pub fn drag_start(&self, key: &str, region: HeaderRegion) -> bool {
        if !matches!(region, HeaderRegion::Body | HeaderRegion::DragHandle)
            || !self.registry.contains(key)
        {
            return false;
        }
        let Ok(mut guard) = self.inner.write() else {
            return false;
        };
        let capture = guard.capture.clone();
        guard.gestures.begin_reorder(
            ReorderGesture::start(key),
            capture.as_ref(),
            &self.config.table_id,
        )
    }

    /// Native `dragover`. Always permits the drop; there is no preview.
    pub fn drag_over(&self, _target_key: &str) -> bool {
        true
    }

    /// Native `drop` on a header. Applies the reorder when the target
    /// differs from the source and always ends the drag. Returns true if the
    /// order changed.
    pub fn drop_on(&self, target_key: &str) -> bool {
        let Ok(mut guard) = self.inner.write() else {
            return false;
        };
        let movement = guard
            .gestures
            .reordering()
            .and_then(|gesture| gesture.drop_on(target_key));
        if guard.gestures.state().is_reordering() {
            guard.gestures.end();
        }
        match movement {
            Some((source, target)) => {
                self.apply(&mut guard, ViewAction::ReorderColumn { source, target })
            }
            None => false,
        }
    }

    /// Native `dragend`, fired with or without a successful drop.
    pub fn drag_end(&self) {
        if let Ok(mut guard) = self.inner.write()
            && guard.gestures.state().is_reordering()
        {
            guard.gestures.end();
        }
    }

    /// End any gesture and release its capture. Call when the host view is
    /// torn down; dropping the last handle does the same.
    pub fn teardown(&self) {
        if let Ok(mut guard) = self.inner.write() {
            guard.gestures.end();
        }
    }

    // -------------------------------------------------------------------------
    // Import / export
    // -------------------------------------------------------------------------

    /// Serialize the full dataset (not the filtered view).
    pub fn export(&self, format: ExportFormat) -> Result<String, TransferError>
    where
        R: Serialize,
    {
        let g = self.inner.read().map_err(|_| TransferError::Unavailable)?;
        match format {
            ExportFormat::Json => export_json(&g.rows),
            ExportFormat::Csv => Ok(export_csv(&g.rows, &self.registry, &g.state.column_order)),
        }
    }

    /// Replace the dataset from a JSON array. On error the current rows are
    /// kept. Returns the number of imported rows.
    pub fn import_json(&self, text: &str) -> Result<usize, ImportError>
    where
        R: DeserializeOwned,
    {
        let rows: Vec<R> = import_json(text)?;
        let count = rows.len();
        self.set_rows(rows);
        log::info!("imported {} row(s) into '{}'", count, self.config.table_id);
        Ok(count)
    }
}
