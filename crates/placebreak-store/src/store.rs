//! Backend selection.
//!
//! [`TagStore`] is the closed set of backends. It is built once from a
//! [`StoreConfig`] and injected; calls dispatch with a plain `match`.

use placebreak_types::{DisplacementSet, Location, Tag};

use crate::config::{BackendKind, StoreConfig};
use crate::error::StoreError;
use crate::memory::MemoryTagStore;
use crate::postgres::PostgresTagStore;
use crate::repository::TagRepository;
use crate::sqlite::SqliteTagStore;

/// One of the three interchangeable tag stores.
#[derive(Debug)]
pub enum TagStore {
    /// Non-persistent map.
    Memory(MemoryTagStore),
    /// Embedded `SQLite` file.
    Sqlite(SqliteTagStore),
    /// Networked `PostgreSQL` server.
    Postgres(PostgresTagStore),
}

impl TagStore {
    /// Build the backend `config` selects. Nothing is opened until
    /// [`TagRepository::connect`].
    pub fn from_config(config: &StoreConfig) -> Self {
        tracing::info!(backend = %config.kind(), "Selected tag store backend");
        match config {
            StoreConfig::Memory => Self::Memory(MemoryTagStore::new()),
            StoreConfig::Sqlite(sqlite) => Self::Sqlite(SqliteTagStore::new(sqlite)),
            StoreConfig::Postgres(postgres) => Self::Postgres(PostgresTagStore::new(postgres)),
        }
    }

    /// Which backend this is.
    pub const fn kind(&self) -> BackendKind {
        match self {
            Self::Memory(_) => BackendKind::Memory,
            Self::Sqlite(_) => BackendKind::Sqlite,
            Self::Postgres(_) => BackendKind::Postgres,
        }
    }
}

impl TagRepository for TagStore {
    async fn connect(&self) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.connect().await,
            Self::Sqlite(store) => store.connect().await,
            Self::Postgres(store) => store.connect().await,
        }
    }

    async fn disconnect(&self) {
        match self {
            Self::Memory(store) => store.disconnect().await,
            Self::Sqlite(store) => store.disconnect().await,
            Self::Postgres(store) => store.disconnect().await,
        }
    }

    async fn put(&self, tag: &Tag) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.put(tag).await,
            Self::Sqlite(store) => store.put(tag).await,
            Self::Postgres(store) => store.put(tag).await,
        }
    }

    async fn find_by_location(&self, location: &Location) -> Result<Option<Tag>, StoreError> {
        match self {
            Self::Memory(store) => store.find_by_location(location).await,
            Self::Sqlite(store) => store.find_by_location(location).await,
            Self::Postgres(store) => store.find_by_location(location).await,
        }
    }

    async fn delete(&self, location: &Location) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.delete(location).await,
            Self::Sqlite(store) => store.delete(location).await,
            Self::Postgres(store) => store.delete(location).await,
        }
    }

    async fn move_tags(&self, displacements: &DisplacementSet) -> Result<usize, StoreError> {
        match self {
            Self::Memory(store) => store.move_tags(displacements).await,
            Self::Sqlite(store) => store.move_tags(displacements).await,
            Self::Postgres(store) => store.move_tags(displacements).await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::config::{PostgresConfig, SqliteConfig};

    #[test]
    fn from_config_picks_variant() {
        assert_eq!(TagStore::from_config(&StoreConfig::Memory).kind(), BackendKind::Memory);
        assert_eq!(
            TagStore::from_config(&StoreConfig::Sqlite(SqliteConfig::new("tags.db"))).kind(),
            BackendKind::Sqlite
        );
        let postgres = PostgresConfig::new("localhost", "minecraft", "jobs", "secret");
        assert_eq!(
            TagStore::from_config(&StoreConfig::Postgres(postgres)).kind(),
            BackendKind::Postgres
        );
    }

    #[tokio::test]
    async fn memory_variant_round_trips() {
        let store = TagStore::from_config(&StoreConfig::Memory);
        store.connect().await.unwrap();
        let location = Location::new("world", 10, 64, 10);
        store.put(&Tag::new(location.clone(), false, Utc::now())).await.unwrap();
        assert!(store.find_by_location(&location).await.unwrap().is_some());
        store.delete(&location).await.unwrap();
        assert!(store.find_by_location(&location).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sql_variant_before_connect_is_not_initialized() {
        let dir = tempfile::tempdir().unwrap();
        let store = TagStore::from_config(&StoreConfig::Sqlite(SqliteConfig::new(
            dir.path().join("tags.db"),
        )));
        let err = store
            .find_by_location(&Location::new("world", 0, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotInitialized { backend: "sqlite" }));
    }
}
