//! Per-table configuration.

/// Smallest width a user can drag or restore a column to.
pub const DEFAULT_MIN_COLUMN_WIDTH: u32 = 50;

/// Configuration for one grid instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridConfig {
    /// Persistence namespace; also scopes gesture capture.
    pub table_id: String,
    /// Lower bound applied to every user-driven or restored width.
    pub min_column_width: u32,
    /// Opaque action ids the host renders next to the column controls.
    pub custom_actions: Vec<String>,
}

impl GridConfig {
    pub fn new(table_id: impl Into<String>) -> Self {
        Self {
            table_id: table_id.into(),
            min_column_width: DEFAULT_MIN_COLUMN_WIDTH,
            custom_actions: Vec::new(),
        }
    }

    /// Set the minimum column width. Never below one pixel.
    pub fn min_column_width(mut self, width: u32) -> Self {
        self.min_column_width = width.max(1);
        self
    }

    pub fn custom_action(mut self, action: impl Into<String>) -> Self {
        self.custom_actions.push(action.into());
        self
    }

    /// Clamp a requested width to the configured minimum.
    pub fn clamp_width(&self, width: i64) -> u32 {
        let min = self.min_column_width.max(1);
        if width < min as i64 {
            min
        } else {
            width.min(u32::MAX as i64) as u32
        }
    }
}
