//! Layout store trait.

use async_trait::async_trait;

use super::StoreError;

/// Backend trait for layout storage.
///
/// Implementations hold string records by key. `LayoutPersistence` wraps
/// this with the per-table key scheme and JSON encoding.
#[async_trait]
pub trait LayoutStore: Send + Sync {
    /// Get the record for a key.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Set the record for a key.
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// Set several records at once. Either every record is written or, on
    /// error, none is.
    async fn set_many(&self, records: Vec<(String, String)>) -> Result<(), StoreError>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Delete several keys at once, all or nothing.
    async fn delete_many(&self, keys: Vec<String>) -> Result<(), StoreError>;

    /// Get all keys matching a prefix.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}
