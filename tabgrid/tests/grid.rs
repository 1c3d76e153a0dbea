use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use tabgrid::bulk::{AutoConfirm, BulkOutcome, ConfirmPrompt};
use tabgrid::column::{ColumnDescriptor, ColumnRegistry};
use tabgrid::config::GridConfig;
use tabgrid::error::{BulkActionError, ImportError, TransferError};
use tabgrid::events::GridEvent;
use tabgrid::gesture::{
    CaptureKind, DragState, EventResult, HeaderRegion, PointerCapture, RootListeners,
};
use tabgrid::layout::LayoutFragment;
use tabgrid::row::{GridRow, Record};
use tabgrid::selection::SelectAllState;
use tabgrid::transfer::ExportFormat;
use tabgrid::view_state::{SortDirection, SortSpec};
use tabgrid::Grid;

fn registry() -> ColumnRegistry<Record> {
    ColumnRegistry::new(vec![
        ColumnDescriptor::new("shortcut", "Shortcut", 160).sortable().filterable(),
        ColumnDescriptor::new("command", "Command", 240).sortable().filterable(),
        ColumnDescriptor::new("audit", "Audit", 120),
        ColumnDescriptor::new("extra", "Extra", 100),
    ])
}

fn rows(count: usize) -> Vec<Record> {
    (1..=count)
        .map(|i| {
            let group = if i <= 3 { "alpha" } else { "beta" };
            Record::new()
                .with("id", i.to_string())
                .with("shortcut", format!("/{group}{i}"))
                .with("command", format!("Command {i}"))
        })
        .collect()
}

fn grid(count: usize) -> Grid<Record> {
    Grid::new(GridConfig::new("commands"), registry(), rows(count))
}

fn captured_grid(count: usize) -> (Grid<Record>, Arc<RootListeners>) {
    let listeners = Arc::new(RootListeners::new());
    let capture: Arc<dyn PointerCapture> = listeners.clone();
    (grid(count).with_pointer_capture(capture), listeners)
}

fn layout_events(events: &[GridEvent]) -> Vec<&LayoutFragment> {
    events
        .iter()
        .filter_map(|e| match e {
            GridEvent::LayoutChange(fragment) => Some(fragment),
            _ => None,
        })
        .collect()
}

// =============================================================================
// View
// =============================================================================

#[test]
fn test_global_search_end_to_end() {
    let grid = Grid::new(
        GridConfig::new("commands"),
        registry(),
        vec![
            Record::new().with("id", 1).with("shortcut", "/deploy").with("command", "Deploy"),
            Record::new().with("id", 2).with("shortcut", "/plan").with("command", "Planning"),
        ],
    );
    assert!(grid.set_global_search("dep"));
    let view = grid.view();
    assert_eq!(view.visible_ids(), vec!["1"]);
    // Filter changes are never persisted.
    assert!(grid.drain_events().is_empty());
}

#[test]
fn test_sort_emits_event() {
    let grid = grid(3);
    assert!(grid.toggle_sort("command"));
    assert!(grid.toggle_sort("command"));
    assert_eq!(grid.sort(), SortSpec::by("command", SortDirection::Desc));
    assert_eq!(grid.view().visible_ids(), vec!["3", "2", "1"]);

    let events = grid.drain_events();
    assert_eq!(
        events,
        vec![
            GridEvent::SortChange(SortSpec::by("command", SortDirection::Asc)),
            GridEvent::SortChange(SortSpec::by("command", SortDirection::Desc)),
        ]
    );
    assert!(!grid.toggle_sort("audit"));
}

#[test]
fn test_visible_columns_with_widths() {
    let grid = grid(1);
    grid.set_column_visible("audit", false);
    grid.set_column_width("extra", 75);
    let columns: Vec<(String, u32)> = grid
        .visible_columns()
        .into_iter()
        .map(|(c, w)| (c.key, w))
        .collect();
    assert_eq!(
        columns,
        vec![
            ("shortcut".to_string(), 160),
            ("command".to_string(), 240),
            ("extra".to_string(), 75),
        ]
    );
}

#[test]
fn test_saved_layout_seeds_state() {
    let fragment = LayoutFragment {
        column_order: Some(vec!["extra".into(), "shortcut".into()]),
        column_widths: Some(BTreeMap::from([("shortcut".to_string(), 10)])),
        visible_columns: None,
    };
    let grid = Grid::with_saved_layout(GridConfig::new("commands"), registry(), rows(1), &fragment);
    let layout = grid.layout();
    assert_eq!(layout.column_order, vec!["extra", "shortcut", "command", "audit"]);
    assert_eq!(layout.column_widths.get("shortcut"), Some(&50));
}

// =============================================================================
// Layout events
// =============================================================================

#[test]
fn test_layout_change_carries_full_layout() {
    let grid = grid(1);
    assert!(grid.set_column_width("command", -50));
    let events = grid.drain_events();
    let fragments = layout_events(&events);
    assert_eq!(fragments.len(), 1);
    let widths = fragments[0].column_widths.as_ref().unwrap();
    assert_eq!(widths.get("command"), Some(&50));
    assert_eq!(widths.get("shortcut"), Some(&160));
    assert!(fragments[0].column_order.is_some());
    assert!(fragments[0].visible_columns.is_some());
}

#[test]
fn test_no_event_when_nothing_changes() {
    let grid = grid(1);
    assert!(!grid.set_column_width("command", 240));
    assert!(!grid.reorder_column("audit", "audit"));
    assert!(grid.drain_events().is_empty());
    assert!(!grid.take_dirty());
}

#[test]
fn test_reset_layout() {
    let grid = grid(1);
    grid.reorder_column("audit", "shortcut");
    grid.set_column_width("audit", 300);
    assert!(grid.reset_layout());
    assert_eq!(grid.layout(), registry().default_layout());
}

// =============================================================================
// Resize gesture
// =============================================================================

#[test]
fn test_resize_gesture() {
    let (grid, listeners) = captured_grid(1);

    let result = grid.on_header_press("command", HeaderRegion::ResizeHandle, 500);
    assert_eq!(result, EventResult::StartDrag);
    assert!(grid.drag_state().is_resizing());
    assert_eq!(listeners.active_for("commands"), vec![CaptureKind::Resize]);

    assert_eq!(grid.pointer_move(560), Some(300));
    assert_eq!(grid.state().width("command"), Some(300));
    assert_eq!(grid.pointer_move(100), Some(50));
    assert_eq!(grid.state().width("command"), Some(50));

    assert!(grid.pointer_up());
    assert!(grid.drag_state().is_idle());
    assert_eq!(listeners.active(), 0);
    assert_eq!(grid.pointer_move(900), None);
    assert!(!grid.pointer_up());

    // Moves during one drag collapse into a single pending layout event.
    let events = grid.drain_events();
    let fragments = layout_events(&events);
    assert_eq!(fragments.len(), 1);
    assert_eq!(
        fragments[0].column_widths.as_ref().unwrap().get("command"),
        Some(&50)
    );
}

#[test]
fn test_resize_blocks_reorder() {
    let (grid, listeners) = captured_grid(1);
    grid.on_header_press("command", HeaderRegion::ResizeHandle, 0);
    assert!(!grid.draggable());
    assert!(!grid.drag_start("shortcut", HeaderRegion::Body));
    assert!(grid.drag_state().is_resizing());
    assert_eq!(listeners.active(), 1);
    grid.pointer_up();
    assert!(grid.draggable());
}

#[test]
fn test_resize_preempts_pending_drag() {
    let (grid, listeners) = captured_grid(1);
    assert!(grid.drag_start("shortcut", HeaderRegion::Body));
    assert_eq!(
        grid.on_header_press("command", HeaderRegion::ResizeHandle, 0),
        EventResult::StartDrag
    );
    assert_eq!(listeners.active_for("commands"), vec![CaptureKind::Resize]);
    // The abandoned drag cannot drop.
    assert!(!grid.drop_on("audit"));
    assert_eq!(grid.layout().column_order[0], "shortcut");
    grid.pointer_up();
    assert_eq!(listeners.active(), 0);
}

#[test]
fn test_header_regions() {
    let grid = grid(1);
    assert_eq!(grid.on_header_press("command", HeaderRegion::DragHandle, 0), EventResult::Consumed);
    assert_eq!(grid.on_header_press("command", HeaderRegion::Body, 0), EventResult::Ignored);
    assert_eq!(
        grid.on_header_press("missing", HeaderRegion::ResizeHandle, 0),
        EventResult::Ignored
    );
    assert!(grid.drag_state().is_idle());

    assert_eq!(grid.on_header_click("command", HeaderRegion::SortLabel), EventResult::Consumed);
    assert_eq!(grid.sort(), SortSpec::by("command", SortDirection::Asc));
    assert_eq!(grid.on_header_click("command", HeaderRegion::Body), EventResult::Ignored);
    assert_eq!(grid.on_header_click("audit", HeaderRegion::SortLabel), EventResult::Ignored);

    assert!(!grid.drag_start("command", HeaderRegion::ResizeHandle));
    assert!(!grid.drag_start("command", HeaderRegion::SortLabel));
}

#[test]
fn test_sort_click_ignored_while_resizing() {
    let grid = grid(1);
    grid.on_header_press("command", HeaderRegion::ResizeHandle, 0);
    assert_eq!(grid.on_header_click("command", HeaderRegion::SortLabel), EventResult::Consumed);
    assert_eq!(grid.sort().key, None);
}

#[test]
fn test_resize_without_capture() {
    let grid = grid(1);
    assert_eq!(
        grid.on_header_press("audit", HeaderRegion::ResizeHandle, 10),
        EventResult::StartDrag
    );
    assert_eq!(grid.pointer_move(40), Some(150));
    assert!(grid.pointer_up());
}

// =============================================================================
// Reorder gesture
// =============================================================================

#[test]
fn test_reorder_gesture() {
    let (grid, listeners) = captured_grid(1);
    assert!(grid.drag_start("audit", HeaderRegion::Body));
    assert_eq!(listeners.active_for("commands"), vec![CaptureKind::Reorder]);
    assert!(grid.drag_over("shortcut"));
    assert!(grid.drop_on("shortcut"));
    assert!(grid.drag_state().is_idle());
    assert_eq!(listeners.active(), 0);
    grid.drag_end();

    assert_eq!(grid.layout().column_order, vec!["audit", "shortcut", "command", "extra"]);
    assert_eq!(layout_events(&grid.drain_events()).len(), 1);
}

#[test]
fn test_drop_on_self_is_noop() {
    let (grid, listeners) = captured_grid(1);
    assert!(grid.drag_start("audit", HeaderRegion::DragHandle));
    assert!(!grid.drop_on("audit"));
    assert_eq!(grid.drag_state(), DragState::Idle);
    assert_eq!(listeners.active(), 0);
    assert!(grid.drain_events().is_empty());
}

#[test]
fn test_drag_end_without_drop() {
    let (grid, listeners) = captured_grid(1);
    assert!(grid.drag_start("audit", HeaderRegion::Body));
    assert!(!grid.drag_start("command", HeaderRegion::Body));
    grid.drag_end();
    assert!(grid.drag_state().is_idle());
    assert_eq!(listeners.active(), 0);
    assert_eq!(grid.layout(), registry().default_layout());
}

#[test]
fn test_teardown_mid_gesture_releases_capture() {
    let (grid, listeners) = captured_grid(1);
    grid.on_header_press("command", HeaderRegion::ResizeHandle, 0);
    assert_eq!(listeners.active(), 1);
    grid.teardown();
    assert_eq!(listeners.active(), 0);

    let clone = grid.clone();
    clone.drag_start("audit", HeaderRegion::Body);
    assert_eq!(listeners.active(), 1);
    drop(grid);
    assert_eq!(listeners.active(), 1);
    drop(clone);
    assert_eq!(listeners.active(), 0);
}

#[test]
fn test_gestures_are_scoped_per_table() {
    let listeners = Arc::new(RootListeners::new());
    let capture: Arc<dyn PointerCapture> = listeners.clone();
    let left = Grid::new(GridConfig::new("left"), registry(), rows(1))
        .with_pointer_capture(capture.clone());
    let right =
        Grid::new(GridConfig::new("right"), registry(), rows(1)).with_pointer_capture(capture);

    left.on_header_press("command", HeaderRegion::ResizeHandle, 0);
    assert!(right.draggable());
    assert!(right.drag_start("audit", HeaderRegion::Body));
    assert_eq!(listeners.active_for("left"), vec![CaptureKind::Resize]);
    assert_eq!(listeners.active_for("right"), vec![CaptureKind::Reorder]);
}

// =============================================================================
// Selection
// =============================================================================

#[test]
fn test_select_all_on_filtered_view() {
    let grid = grid(10);
    grid.select_row("9");
    grid.set_global_search("alpha");
    assert_eq!(grid.view().matched_rows(), 3);
    assert_eq!(grid.select_all_state(), SelectAllState::Unchecked);

    assert_eq!(grid.toggle_select_all(), SelectAllState::Checked);
    assert_eq!(grid.selected_ids(), vec!["1", "2", "3", "9"]);

    assert_eq!(grid.toggle_select_all(), SelectAllState::Unchecked);
    assert_eq!(grid.selected_ids(), vec!["9"]);
}

#[test]
fn test_select_all_indeterminate() {
    let grid = grid(10);
    grid.set_global_search("alpha");
    grid.toggle_row("2");
    assert_eq!(grid.select_all_state(), SelectAllState::Indeterminate);
    assert_eq!(grid.toggle_select_all(), SelectAllState::Checked);
    assert_eq!(grid.selected_ids(), vec!["1", "2", "3"]);
}

#[test]
fn test_selection_events() {
    let grid = grid(3);
    assert!(grid.toggle_row("2"));
    assert!(grid.select_row("1"));
    assert!(!grid.select_row("1"));
    assert!(grid.deselect_row("2"));

    assert_eq!(
        grid.drain_events(),
        vec![
            GridEvent::SelectionChange(vec!["2".into()]),
            GridEvent::SelectionChange(vec!["1".into(), "2".into()]),
            GridEvent::SelectionChange(vec!["1".into()]),
        ]
    );
}

#[test]
fn test_selection_ignores_unknown_rows() {
    let grid = grid(1);
    assert!(!grid.select_row("999"));
    assert!(!grid.toggle_row("999"));
    assert!(grid.selected_ids().is_empty());
    assert!(grid.drain_events().is_empty());

    assert!(grid.select_all(vec!["1".into(), "999".into()]));
    assert_eq!(grid.selected_ids(), vec!["1"]);
    assert_eq!(
        grid.drain_events(),
        vec![GridEvent::SelectionChange(vec!["1".into()])]
    );
}

#[test]
fn test_set_rows_drops_stale_selection() {
    let grid = grid(5);
    grid.select_all(vec!["1".into(), "4".into(), "5".into()]);
    grid.drain_events();

    grid.set_rows(rows(4));
    assert_eq!(grid.selected_ids(), vec!["1", "4"]);
    assert_eq!(
        grid.drain_events(),
        vec![GridEvent::SelectionChange(vec!["1".into(), "4".into()])]
    );
}

#[test]
fn test_selected_rows_in_host_order() {
    let grid = grid(5);
    grid.select_row("4");
    grid.select_row("2");
    let ids: Vec<String> = grid.selected_rows().iter().map(GridRow::id).collect();
    assert_eq!(ids, vec!["2", "4"]);
}

// =============================================================================
// Row actions
// =============================================================================

#[test]
fn test_row_action_requests() {
    let grid = grid(2);
    grid.request_edit("1");
    grid.request_delete("2");
    assert_eq!(
        grid.drain_events(),
        vec![GridEvent::Edit("1".into()), GridEvent::Delete("2".into())]
    );
    assert!(grid.drain_events().is_empty());
}

struct Decline;

#[async_trait]
impl ConfirmPrompt for Decline {
    async fn confirm(&self, message: &str) -> bool {
        assert_eq!(message, "Delete 2 selected entries?");
        false
    }
}

#[tokio::test]
async fn test_bulk_action_completes_and_clears() {
    let grid = grid(5);
    grid.select_row("2");
    grid.select_row("4");

    let outcome = grid
        .run_bulk_action("Delete", &AutoConfirm(true), |rows: Vec<Record>| async move {
            Ok::<_, io::Error>(rows.iter().map(GridRow::id).collect::<Vec<_>>())
        })
        .await
        .unwrap();

    assert_eq!(outcome, BulkOutcome::Completed(vec!["2".to_string(), "4".to_string()]));
    assert!(grid.selected_ids().is_empty());
}

#[tokio::test]
async fn test_bulk_action_cancelled_keeps_selection() {
    let grid = grid(5);
    grid.select_row("2");
    grid.select_row("4");

    let outcome = grid
        .run_bulk_action("Delete", &Decline, |_rows: Vec<Record>| async move {
            Err::<(), _>(io::Error::other("must not run"))
        })
        .await
        .unwrap();

    assert_eq!(outcome, BulkOutcome::Cancelled);
    assert_eq!(grid.selected_ids(), vec!["2", "4"]);
}

#[tokio::test]
async fn test_bulk_action_failure_still_clears() {
    let grid = grid(5);
    grid.select_row("3");

    let err = grid
        .run_bulk_action("Archive", &AutoConfirm(true), |_rows: Vec<Record>| async move {
            Err::<(), _>(io::Error::other("backend down"))
        })
        .await
        .unwrap_err();

    assert!(matches!(err, BulkActionError::Action(_)));
    assert!(grid.selected_ids().is_empty());
    assert!(!grid.is_empty());
}

#[tokio::test]
async fn test_bulk_action_requires_selection() {
    let grid = grid(5);
    let err = grid
        .run_bulk_action("Delete", &AutoConfirm(true), |_rows: Vec<Record>| async move {
            Ok::<(), io::Error>(())
        })
        .await
        .unwrap_err();
    assert!(matches!(err, BulkActionError::EmptySelection));
}

// =============================================================================
// Import / export
// =============================================================================

#[test]
fn test_import_replaces_rows_and_prunes_selection() {
    let grid = grid(3);
    grid.select_row("1");
    grid.select_row("3");

    let count = grid
        .import_json(r#"[{"id": "1", "shortcut": "/new"}, {"id": "7"}]"#)
        .unwrap();
    assert_eq!(count, 2);
    assert_eq!(grid.len(), 2);
    assert_eq!(grid.selected_ids(), vec!["1"]);
    assert_eq!(
        grid.find_row("1").and_then(|r| r.get("shortcut").cloned()),
        Some(serde_json::Value::from("/new"))
    );
}

#[test]
fn test_failed_import_leaves_rows_untouched() {
    let grid = grid(3);
    let before = grid.rows();
    let err = grid.import_json(r#"{"not": "an array"}"#).unwrap_err();
    assert!(matches!(err, ImportError::NotAnArray { .. }));
    assert_eq!(grid.rows(), before);
}

#[test]
fn test_export_covers_full_dataset() {
    let grid = grid(10);
    grid.set_global_search("alpha");
    grid.reorder_column("command", "shortcut");

    let csv = grid.export(ExportFormat::Csv).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some(r#""Command","Shortcut","Audit","Extra""#));
    assert_eq!(lines.next(), Some(r#""Command 1","/alpha1","","""#));
    assert_eq!(csv.lines().count(), 11);

    let json = grid.export(ExportFormat::Json).unwrap();
    let back: Vec<Record> = serde_json::from_str(&json).unwrap();
    assert_eq!(back.len(), 10);
}

#[test]
fn test_export_fails_when_state_is_poisoned() {
    let registry = ColumnRegistry::new(vec![
        ColumnDescriptor::new("shortcut", "Shortcut", 160),
        ColumnDescriptor::new("broken", "Broken", 80)
            .sortable()
            .computed(|_: &Record| panic!("compute failed")),
    ]);
    let grid = Grid::new(GridConfig::new("commands"), registry, rows(2));
    assert!(grid.toggle_sort("broken"));

    // Sorting runs under the write lock and panics there.
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        grid.toggle_select_all();
    }));
    assert!(result.is_err());

    assert!(matches!(
        grid.export(ExportFormat::Csv),
        Err(TransferError::Unavailable)
    ));
}
