//! SQLite layout store.
//!
//! Records live in one `layouts` table. The whole table is read into a
//! `DashMap` when the store opens, so reads never touch the database; writes
//! commit to SQLite first and then update the map. The store assumes it is
//! the only writer to its file.

use std::path::Path;

use async_sqlite::{Client, ClientBuilder};
use async_trait::async_trait;
use dashmap::DashMap;
use rusqlite::Transaction;

use super::{LayoutStore, StoreError};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS layouts (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)";

const UPSERT: &str = "INSERT INTO layouts (key, value) VALUES (?1, ?2)
    ON CONFLICT(key) DO UPDATE SET value = excluded.value";

const DELETE: &str = "DELETE FROM layouts WHERE key = ?1";

/// Layout records in a SQLite file.
pub struct SqliteStore {
    client: Client,
    records: DashMap<String, String>,
}

impl SqliteStore {
    /// Open the database at `path`, creating the file and table if needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let client = ClientBuilder::new().path(path).open().await?;
        let rows = client
            .conn(|conn| {
                conn.execute(SCHEMA, [])?;
                let mut stmt = conn.prepare("SELECT key, value FROM layouts")?;
                let rows = stmt.query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await?;
        log::debug!("loaded {} layout record(s)", rows.len());

        Ok(Self {
            client,
            records: rows.into_iter().collect(),
        })
    }

    /// Run `write` inside one transaction.
    async fn transaction<F>(&self, write: F) -> Result<(), StoreError>
    where
        F: FnOnce(&Transaction<'_>) -> Result<(), rusqlite::Error> + Send + 'static,
    {
        self.client
            .conn_mut(move |conn| {
                let tx = conn.transaction()?;
                write(&tx)?;
                tx.commit()
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl LayoutStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.records.get(key).map(|value| value.clone()))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.set_many(vec![(key.to_string(), value)]).await
    }

    async fn set_many(&self, records: Vec<(String, String)>) -> Result<(), StoreError> {
        let batch = records.clone();
        self.transaction(move |tx| {
            let mut stmt = tx.prepare_cached(UPSERT)?;
            for (key, value) in &batch {
                stmt.execute(rusqlite::params![key, value])?;
            }
            Ok(())
        })
        .await?;

        for (key, value) in records {
            self.records.insert(key, value);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.delete_many(vec![key.to_string()]).await
    }

    async fn delete_many(&self, keys: Vec<String>) -> Result<(), StoreError> {
        let batch = keys.clone();
        self.transaction(move |tx| {
            let mut stmt = tx.prepare_cached(DELETE)?;
            for key in &batch {
                stmt.execute([key])?;
            }
            Ok(())
        })
        .await?;

        for key in &keys {
            self.records.remove(key);
        }
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys: Vec<String> = self
            .records
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}
