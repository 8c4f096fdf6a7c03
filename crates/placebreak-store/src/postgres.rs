//! Networked backend: a `PostgreSQL` server accessed through `sqlx`.
//!
//! Uses runtime query construction (not compile-time checked) so no live
//! database is needed at build time. All queries are parameterized; only the
//! validated table name is spliced into SQL text. Tag ids bind as native
//! `UUID` values.

use placebreak_types::{DisplacementSet, Location, Tag};
use sqlx::Postgres;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::config::PostgresConfig;
use crate::error::StoreError;
use crate::repository::TagRepository;
use crate::schema::Dialect;
use crate::sql::{SqlTagStore, tag_backend};

tag_backend!(
    Postgres,
    label: "postgres",
    dialect: Dialect::Postgres,
    begin_write: None,
    bind_id: |id| id.as_uuid(),
);

/// Tag store on a `PostgreSQL` server.
#[derive(Debug)]
pub struct PostgresTagStore {
    inner: SqlTagStore<Postgres>,
}

impl PostgresTagStore {
    /// Create a disconnected store for `config`.
    pub fn new(config: &PostgresConfig) -> Self {
        let ssl_mode = if config.ssl_enabled {
            PgSslMode::Require
        } else {
            PgSslMode::Disable
        };
        let options = PgConnectOptions::new()
            .host(&config.hostname)
            .port(config.port)
            .username(&config.username)
            .password(&config.password)
            .database(&config.database)
            .ssl_mode(ssl_mode);

        Self {
            inner: SqlTagStore::new(options, config.pool, &config.table),
        }
    }

    /// Whether the pool is open.
    pub async fn is_connected(&self) -> bool {
        self.inner.is_connected().await
    }
}

impl TagRepository for PostgresTagStore {
    async fn connect(&self) -> Result<(), StoreError> {
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
