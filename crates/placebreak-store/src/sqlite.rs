//! Embedded backend: a `SQLite` file accessed through `sqlx`.
//!
//! The file and its parent directory are created on connect if missing, and
//! the tag table is created if it does not exist yet. The journal runs in WAL
//! mode so lookups are not blocked behind writers. Write transactions begin
//! `IMMEDIATE`, so concurrent writers queue on the busy timeout.

use std::path::{Path, PathBuf};

use placebreak_types::{DisplacementSet, Location, Tag};
use sqlx::Sqlite;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};

use crate::config::SqliteConfig;
use crate::error::StoreError;
use crate::repository::TagRepository;
use crate::schema::Dialect;
use crate::sql::{SqlTagStore, tag_backend};

tag_backend!(
    Sqlite,
    label: "sqlite",
    dialect: Dialect::Sqlite,
    begin_write: Some("BEGIN IMMEDIATE"),
    bind_id: |id| id.to_string(),
);

/// Tag store persisted in a local `SQLite` file.
#[derive(Debug)]
pub struct SqliteTagStore {
    path: PathBuf,
    inner: SqlTagStore<Sqlite>,
}

impl SqliteTagStore {
    /// Create a disconnected store for `config`.
    pub fn new(config: &SqliteConfig) -> Self {
        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(config.pool.connection_timeout());

        Self {
            path: config.path.clone(),
            inner: SqlTagStore::new(options, config.pool, &config.table),
        }
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the pool is open.
    pub async fn is_connected(&self) -> bool {
        self.inner.is_connected().await
    }
}

impl TagRepository for SqliteTagStore {
    async fn connect(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StoreError::Config(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        self.inner.connect().await
    }

    async fn disconnect(&self) {
        self.inner.disconnect().await;
    }

    async fn put(&self, tag: &Tag) -> Result<(), StoreError> {
        self.inner.put(tag).await
    }

    async fn find_by_location(&self, location: &Location) -> Result<Option<Tag>, StoreError> {
        self.inner.find_by_location(location).await
    }

    async fn delete(&self, location: &Location) -> Result<(), StoreError> {
        self.inner.delete(location).await
    }

    async fn move_tags(&self, displacements: &DisplacementSet) -> Result<usize, StoreError> {
        self.inner.move_tags(displacements).await
    }
}
