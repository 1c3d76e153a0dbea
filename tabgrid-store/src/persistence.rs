//! Per-table layout persistence.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tabgrid::column::ColumnRegistry;
use tabgrid::config::GridConfig;
use tabgrid::layout::{
    self, Layout, LayoutFragment, ORDER_SUFFIX, VISIBILITY_SUFFIX, WIDTHS_SUFFIX, merge_layout,
};

use super::{LayoutStore, StoreError};

/// Loads and saves table layouts.
///
/// Reads never fail: a record that is missing, unreadable or corrupt is
/// treated as absent and the registry default fills in. Writes report
/// errors to the caller.
#[derive(Clone)]
pub struct LayoutPersistence {
    backend: Arc<dyn LayoutStore>,
}

impl LayoutPersistence {
    /// Create a persistence adapter over the given backend.
    pub fn new(backend: impl LayoutStore + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Share an existing backend.
    pub fn with_backend(backend: Arc<dyn LayoutStore>) -> Self {
        Self { backend }
    }

    /// Load the saved layout for a table and merge it over the registry
    /// defaults.
    pub async fn load<R>(&self, registry: &ColumnRegistry<R>, config: &GridConfig) -> Layout {
        let fragment = self.load_fragment(&config.table_id).await;
        merge_layout(&fragment, registry, config)
    }

    /// Load the raw saved parts for a table.
    pub async fn load_fragment(&self, table_id: &str) -> LayoutFragment {
        LayoutFragment {
            column_widths: self.read(&layout::widths_key(table_id)).await,
            visible_columns: self.read(&layout::visibility_key(table_id)).await,
            column_order: self.read(&layout::order_key(table_id)).await,
        }
    }

    /// Write the parts present in `fragment` in one batch, so a failed save
    /// leaves the previous layout intact. Absent parts keep their stored
    /// value.
    pub async fn save(&self, table_id: &str, fragment: &LayoutFragment) -> Result<(), StoreError> {
        let mut records = Vec::with_capacity(3);
        if let Some(widths) = &fragment.column_widths {
            records.push(encode(layout::widths_key(table_id), widths)?);
        }
        if let Some(visible) = &fragment.visible_columns {
            records.push(encode(layout::visibility_key(table_id), visible)?);
        }
        if let Some(order) = &fragment.column_order {
            records.push(encode(layout::order_key(table_id), order)?);
        }
        if records.is_empty() {
            return Ok(());
        }
        self.backend.set_many(records).await?;
        log::debug!("saved layout for '{}'", table_id);
        Ok(())
    }

    /// Forget the saved layout for a table.
    pub async fn reset(&self, table_id: &str) -> Result<(), StoreError> {
        self.backend
            .delete_many(vec![
                layout::widths_key(table_id),
                layout::visibility_key(table_id),
                layout::order_key(table_id),
            ])
            .await?;
        log::info!("reset layout for '{}'", table_id);
        Ok(())
    }

    /// Table ids with at least one saved record, sorted.
    pub async fn saved_tables(&self) -> Result<Vec<String>, StoreError> {
        let keys = self.backend.keys_with_prefix("").await?;
        let tables: BTreeSet<String> = keys
            .iter()
            .filter_map(|key| {
                [WIDTHS_SUFFIX, VISIBILITY_SUFFIX, ORDER_SUFFIX]
                    .iter()
                    .find_map(|suffix| key.strip_suffix(*suffix)?.strip_suffix('_'))
            })
            .map(str::to_string)
            .collect();
        Ok(tables.into_iter().collect())
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                log::warn!("failed to read '{}', using defaults: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("corrupt layout record '{}', using defaults: {}", key, e);
                None
            }
        }
    }
}

fn encode<T: Serialize>(key: String, value: &T) -> Result<(String, String), StoreError> {
    let raw = serde_json::to_string(value).map_err(StoreError::Serialization)?;
    Ok((key, raw))
}
