mod paths;
mod prompt;

use std::collections::HashSet;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use simplelog::{Config, LevelFilter, WriteLogger};
use tabgrid::bulk::{AutoConfirm, BulkOutcome, ConfirmPrompt};
use tabgrid::column::{
    Aggregate, AggregateFormat, Alignment, ColumnDescriptor, ColumnKind, ColumnRegistry, FilterKind,
};
use tabgrid::config::GridConfig;
use tabgrid::error::{BulkActionError, ImportError, TransferError};
use tabgrid::events::GridEvent;
use tabgrid::gesture::{HeaderRegion, PointerCapture, RootListeners};
use tabgrid::row::{CellValue, GridRow, Record};
use tabgrid::transfer::{ExportFormat, export_file_name};
use tabgrid::Grid;
use tabgrid_store::{LayoutPersistence, MemoryStore, SqliteStore, StoreError};
use thiserror::Error;

use crate::paths::DemoPaths;
use crate::prompt::StdinPrompt;

const TABLE_ID: &str = "commands";

#[derive(Debug, Error)]
enum DemoError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("import error: {0}")]
    Import(#[from] ImportError),
    #[error("export error: {0}")]
    Transfer(#[from] TransferError),
    #[error("{0}")]
    Bulk(#[from] BulkActionError<io::Error>),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Scripted walk through a command-palette grid.
#[derive(Parser)]
#[command(name = "tabgrid-demo", about = "Interactive data grid demo")]
struct Options {
    /// Answer yes to every confirmation.
    #[arg(short, long)]
    yes: bool,

    /// Forget the saved layout before starting.
    #[arg(long)]
    reset: bool,

    /// Replace the sample rows with a JSON array from this file.
    #[arg(long, value_name = "FILE")]
    import: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let options = Options::parse();
    let paths = DemoPaths::resolve();
    if let Some(paths) = &paths {
        if let Err(e) = paths.create_dirs() {
            eprintln!("cannot create demo directories: {e}");
        }
        init_logging(&paths.next_log_file());
    }

    match run(options, paths.as_ref()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(path: &Path) {
    match File::create(path) {
        Ok(file) => {
            let _ = WriteLogger::init(LevelFilter::Debug, Config::default(), file);
        }
        Err(e) => eprintln!("logging disabled, cannot create {}: {}", path.display(), e),
    }
}

async fn open_persistence(paths: Option<&DemoPaths>) -> LayoutPersistence {
    if let Some(path) = paths.map(DemoPaths::layouts_db) {
        match SqliteStore::open(&path).await {
            Ok(store) => {
                log::info!("layouts stored in {}", path.display());
                return LayoutPersistence::new(store);
            }
            Err(e) => log::warn!("cannot open {}: {}; layouts will not persist", path.display(), e),
        }
    }
    LayoutPersistence::new(MemoryStore::new())
}

fn registry() -> ColumnRegistry<Record> {
    ColumnRegistry::new(vec![
        ColumnDescriptor::new("shortcut", "Shortcut", 120).sortable().filterable(),
        ColumnDescriptor::new("command", "Command", 200)
            .sublabel("what it runs")
            .sortable()
            .filterable(),
        ColumnDescriptor::new("category", "Category", 120)
            .sortable()
            .filter_kind(FilterKind::Dropdown),
        ColumnDescriptor::new("cost", "Cost", 96)
            .kind(ColumnKind::Currency)
            .sortable()
            .aggregate(Aggregate::Sum(AggregateFormat::Currency)),
        ColumnDescriptor::new("runs", "Runs", 72)
            .kind(ColumnKind::Number)
            .aggregate(Aggregate::Sum(AggregateFormat::Number)),
        ColumnDescriptor::new("spend", "Spend", 104)
            .kind(ColumnKind::Currency)
            .computed(|row: &Record| {
                let cost = row.get("cost").and_then(|v| v.as_f64()).unwrap_or(0.0);
                let runs = row.get("runs").and_then(|v| v.as_f64()).unwrap_or(0.0);
                CellValue::Number(cost * runs)
            })
            .aggregate(Aggregate::Sum(AggregateFormat::Currency)),
        ColumnDescriptor::new("edit", "", 56).align(Alignment::Center),
        ColumnDescriptor::new("delete", "", 56).align(Alignment::Center),
    ])
    .with_trailing_columns(2)
}

fn sample_rows() -> Vec<Record> {
    [
        ("1", "/deploy", "Deploy to production", "release", 1.25, 12),
        ("2", "/plan", "Planning poker", "team", 0.0, 4),
        ("3", "/rollback", "Roll back last deploy", "release", 2.5, 1),
        ("4", "/standup", "Daily standup notes", "team", 0.1, 40),
        ("5", "/audit", "Dependency audit", "security", 0.75, 6),
    ]
    .into_iter()
    .map(|(id, shortcut, command, category, cost, runs)| {
        Record::new()
            .with("id", id)
            .with("shortcut", shortcut)
            .with("command", command)
            .with("category", category)
            .with("cost", cost)
            .with("runs", runs)
    })
    .collect()
}

/// Plain-text rendering of the current view.
fn render(grid: &Grid<Record>) -> String {
    let columns = grid.visible_columns();
    let view = grid.view();
    let cell = |text: &str, width: u32, align: Alignment| {
        let chars = (width / 8).max(3) as usize;
        let text: String = text.chars().take(chars).collect();
        match align {
            Alignment::Left => format!("{text:<chars$}"),
            Alignment::Center => format!("{text:^chars$}"),
            Alignment::Right => format!("{text:>chars$}"),
        }
    };

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .map(|(c, w)| cell(&c.label, *w, Alignment::Left))
        .collect();
    out.push_str(&format!("   {}\n", header.join(" | ")));

    for row in &view.visible_rows {
        let mark = if grid.is_selected(&row.id()) { "[x]" } else { "[ ]" };
        let cells: Vec<String> = columns
            .iter()
            .map(|(c, w)| match c.key.as_str() {
                "edit" => cell("edit", *w, c.align),
                "delete" => cell("del", *w, c.align),
                _ => cell(&c.value(row).display(), *w, c.align),
            })
            .collect();
        out.push_str(&format!("{mark} {}\n", cells.join(" | ")));
    }

    let footer: Vec<String> = columns
        .iter()
        .map(|(c, w)| match view.aggregate(&c.key) {
            Some(summary) => {
                let (label, value) = summary.footer();
                cell(&format!("{label} {value}"), *w, Alignment::Right)
            }
            None => cell("", *w, Alignment::Left),
        })
        .collect();
    out.push_str(&format!("   {}\n", footer.join(" | ")));

    if !grid.state().global_search.is_empty() {
        out.push_str(&view.summary());
        out.push('\n');
    }
    out
}

/// Hand pending grid events to their consumers.
async fn flush_events(grid: &Grid<Record>, persistence: &LayoutPersistence) {
    for event in grid.drain_events() {
        match event {
            GridEvent::LayoutChange(fragment) => {
                if let Err(e) = persistence.save(grid.table_id(), &fragment).await {
                    log::warn!("failed to save layout for '{}': {}", grid.table_id(), e);
                }
            }
            GridEvent::SelectionChange(ids) => log::debug!("selection: {:?}", ids),
            GridEvent::SortChange(sort) => log::debug!("sort: {:?} {}", sort.key, sort.direction),
            GridEvent::Edit(id) => println!("(edit requested for row {id})"),
            GridEvent::Delete(id) => println!("(delete requested for row {id})"),
        }
    }
}

fn step(title: &str, grid: &Grid<Record>) {
    println!("\n== {title}");
    print!("{}", render(grid));
}

async fn run(options: Options, paths: Option<&DemoPaths>) -> Result<(), DemoError> {
    let persistence = open_persistence(paths).await;
    if options.reset {
        persistence.reset(TABLE_ID).await?;
    }

    let config = GridConfig::new(TABLE_ID).custom_action("refresh");
    let registry = registry();
    let layout = persistence.load(&registry, &config).await;

    let listeners = Arc::new(RootListeners::new());
    let capture: Arc<dyn PointerCapture> = listeners.clone();
    let grid =
        Grid::with_layout(config, registry, sample_rows(), layout).with_pointer_capture(capture);

    if let Some(path) = &options.import {
        let text = fs::read_to_string(path)?;
        let count = grid.import_json(&text)?;
        println!("imported {count} row(s) from {}", path.display());
    }

    println!("actions: {}", grid.config().custom_actions.join(", "));
    step("initial", &grid);

    grid.set_global_search("dep");
    step("search 'dep'", &grid);
    grid.set_global_search("");

    grid.set_column_filter("category", "release");
    step("category = release", &grid);
    grid.set_column_filter("category", "");

    grid.on_header_click("cost", HeaderRegion::SortLabel);
    grid.on_header_click("cost", HeaderRegion::SortLabel);
    step("sorted by cost, descending", &grid);
    flush_events(&grid, &persistence).await;

    grid.on_header_press("command", HeaderRegion::ResizeHandle, 400);
    for x in [420, 450, 480] {
        grid.pointer_move(x);
    }
    grid.pointer_up();
    step("command widened", &grid);
    flush_events(&grid, &persistence).await;

    if grid.drag_start("category", HeaderRegion::Body) {
        grid.drag_over("shortcut");
        grid.drop_on("shortcut");
    }
    grid.drag_end();
    step("category moved first", &grid);
    flush_events(&grid, &persistence).await;
    log::debug!("captures after gestures: {}", listeners.active());

    grid.set_global_search("/");
    grid.toggle_select_all();
    grid.set_global_search("");
    grid.deselect_row("1");
    step("selection", &grid);
    flush_events(&grid, &persistence).await;

    let prompt: Box<dyn ConfirmPrompt> = if options.yes {
        Box::new(AutoConfirm(true))
    } else {
        Box::new(StdinPrompt)
    };
    let target = grid.clone();
    let outcome = grid
        .run_bulk_action("Delete", prompt.as_ref(), |selected: Vec<Record>| async move {
            let doomed: HashSet<String> = selected.iter().map(GridRow::id).collect();
            let remaining: Vec<Record> = target
                .rows()
                .into_iter()
                .filter(|row| !doomed.contains(&row.id()))
                .collect();
            target.set_rows(remaining);
            Ok::<usize, io::Error>(doomed.len())
        })
        .await;
    match outcome {
        Ok(BulkOutcome::Completed(count)) => step(&format!("deleted {count} row(s)"), &grid),
        Ok(BulkOutcome::Cancelled) => step("delete cancelled", &grid),
        Err(BulkActionError::EmptySelection) => println!("\nnothing selected, skipping delete"),
        Err(e) => return Err(e.into()),
    }
    flush_events(&grid, &persistence).await;

    grid.request_edit("2");
    flush_events(&grid, &persistence).await;

    if let Some(dir) = paths.map(DemoPaths::export_dir) {
        fs::create_dir_all(&dir)?;
        let today = chrono::Local::now().date_naive();
        for format in [ExportFormat::Csv, ExportFormat::Json] {
            let path = dir.join(export_file_name(TABLE_ID, format, today));
            fs::write(&path, grid.export(format)?)?;
            println!("exported {} ({})", path.display(), format.mime_type());
        }
    }

    grid.teardown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_parse_flags() {
        let options =
            Options::try_parse_from(["tabgrid-demo", "-y", "--import", "rows.json"]).unwrap();
        assert!(options.yes);
        assert!(!options.reset);
        assert_eq!(options.import, Some(PathBuf::from("rows.json")));
    }

    #[test]
    fn test_options_reject_bad_arguments() {
        assert!(Options::try_parse_from(["tabgrid-demo", "--import"]).is_err());
        assert!(Options::try_parse_from(["tabgrid-demo", "--bogus"]).is_err());
    }
}
