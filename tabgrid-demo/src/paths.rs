//! Where the demo keeps its files.
//!
//! ```text
//! <data>/layouts.db
//! <cache>/logs/latest.log
//! <cache>/logs/<timestamp>.log
//! <cache>/exports/<table>-export-<date>.<ext>
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

const LATEST_LOG: &str = "latest.log";

/// Archived logs kept next to `latest.log`.
const KEEP_LOGS: usize = 5;

/// Resolved platform directories for the demo.
#[derive(Debug, Clone)]
pub struct DemoPaths {
    data: PathBuf,
    cache: PathBuf,
}

impl DemoPaths {
    /// Resolve the platform data and cache dirs. `None` when there is no home
    /// directory.
    pub fn resolve() -> Option<Self> {
        let dirs = ProjectDirs::from("dev", "tabgrid", "tabgrid-demo")?;
        Some(Self {
            data: dirs.data_dir().to_path_buf(),
            cache: dirs.cache_dir().to_path_buf(),
        })
    }

    pub fn layouts_db(&self) -> PathBuf {
        self.data.join("layouts.db")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.cache.join("logs")
    }

    pub fn export_dir(&self) -> PathBuf {
        self.cache.join("exports")
    }

    /// Create every directory the demo writes to.
    pub fn create_dirs(&self) -> io::Result<()> {
        fs::create_dir_all(&self.data)?;
        fs::create_dir_all(self.log_dir())?;
        fs::create_dir_all(self.export_dir())
    }

    /// Archive the previous run's log under a timestamp, prune old archives
    /// and return the path for this run's log.
    pub fn next_log_file(&self) -> PathBuf {
        let dir = self.log_dir();
        let latest = dir.join(LATEST_LOG);
        if latest.exists() {
            let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
            if let Err(e) = fs::rename(&latest, dir.join(format!("{stamp}.log"))) {
                eprintln!("cannot archive {}: {}", latest.display(), e);
            }
        }
        prune_logs(&dir, KEEP_LOGS);
        latest
    }
}

/// Delete all but the newest `keep` archived logs. Archives are named by
/// timestamp, so name order is age order.
fn prune_logs(dir: &Path, keep: usize) {
    let Ok(entries) = fs::read_dir(dir) else { return };
    let mut archived: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension().is_some_and(|ext| ext == "log")
                && path.file_name().is_some_and(|name| name != LATEST_LOG)
        })
        .collect();
    archived.sort();

    let excess = archived.len().saturating_sub(keep);
    for path in archived.into_iter().take(excess) {
        let _ = fs::remove_file(path);
    }
}
