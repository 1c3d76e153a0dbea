//! Durable storage for grid layouts.
//!
//! Each table's layout is kept as three independent JSON string records,
//! keyed `<tableId>_columnWidths`, `<tableId>_visibleColumns` and
//! `<tableId>_columnOrder`. [`LayoutPersistence`] reads and writes them over
//! any [`LayoutStore`] backend.

mod backend;
mod memory;
mod persistence;
mod sqlite;

pub use backend::LayoutStore;
pub use memory::MemoryStore;
pub use persistence::LayoutPersistence;
pub use sqlite::SqliteStore;

use thiserror::Error;

/// Store error type.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] async_sqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(serde_json::Error),
}
