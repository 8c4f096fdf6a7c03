//! Tag store logic shared by the SQL backends.
//!
//! [`SqlTagStore`] holds everything the `SQLite` and `PostgreSQL` stores have
//! in common: the pool, the rendered statements, the location locks and the
//! put/find/delete/move algorithms. A backend only supplies a
//! [`TagBackend`] impl, generated by [`tag_backend!`], which says how a tag id
//! is bound and how a write transaction begins.

use std::sync::Arc;

use futures::future::BoxFuture;
use placebreak_types::{DisplacementSet, Location, Tag};
use sqlx::{Connection, Database};

use crate::config::{PoolConfig, TableName};
use crate::error::StoreError;
use crate::locks::LocationLocks;
use crate::pool::ConnectionPool;
use crate::relocation::RelocationPlan;
use crate::schema::{Dialect, TagQueries, TagRow, pick_newest};

/// Per-dialect statement execution for the tag table.
pub(crate) trait TagBackend: Database {
    /// Backend label used in logs and errors.
    const LABEL: &'static str;

    /// Column types and placeholder syntax.
    const DIALECT: Dialect;

    /// Statement that opens write transactions, or `None` for the driver's
    /// default `BEGIN`.
    const BEGIN_WRITE: Option<&'static str>;

    fn execute<'a>(
        conn: &'a mut Self::Connection,
        sql: &'a str,
    ) -> BoxFuture<'a, Result<(), StoreError>>;

    fn select_at<'a>(
        conn: &'a mut Self::Connection,
        queries: &'a TagQueries,
        location: &'a Location,
    ) -> BoxFuture<'a, Result<Vec<TagRow>, StoreError>>;

    fn delete_at<'a>(
        conn: &'a mut Self::Connection,
        queries: &'a TagQueries,
        location: &'a Location,
    ) -> BoxFuture<'a, Result<u64, StoreError>>;

    fn insert<'a>(
        conn: &'a mut Self::Connection,
        queries: &'a TagQueries,
        tag: &'a Tag,
    ) -> BoxFuture<'a, Result<(), StoreError>>;
}

/// Implements [`TagBackend`] for a `sqlx` database.
///
/// `bind_id` turns the `TagId` named by its argument into the value bound to
/// the `tag_id` column.
macro_rules! tag_backend {
    (
        $db:ty,
        label: $label:literal,
        dialect: $dialect:expr,
        begin_write: $begin:expr,
        bind_id: |$id:ident| $bind:expr $(,)?
    ) => {
        impl $crate::sql::TagBackend for $db {
            const LABEL: &'static str = $label;
            const DIALECT: $crate::schema::Dialect = $dialect;
            const BEGIN_WRITE: Option<&'static str> = $begin;

            fn execute<'a>(
                conn: &'a mut <Self as sqlx::Database>::Connection,
                sql: &'a str,
            ) -> futures::future::BoxFuture<'a, Result<(), $crate::error::StoreError>> {
                Box::pin(async move {
                    sqlx::query(sql).execute(&mut *conn).await?;
                    Ok(())
                })
            }

            fn select_at<'a>(
                conn: &'a mut <Self as sqlx::Database>::Connection,
                queries: &'a $crate::schema::TagQueries,
                location: &'a placebreak_types::Location,
            ) -> futures::future::BoxFuture<
                'a,
                Result<Vec<$crate::schema::TagRow>, $crate::error::StoreError>,
            > {
                Box::pin(async move {
                    let rows = sqlx::query_as::<_, $crate::schema::TagRow>(
                        &queries.select_by_location,
                    )
                    .bind(location.world())
                    .bind(location.x())
                    .bind(location.y())
                    .bind(location.z())
                    .fetch_all(&mut *conn)
                    .await?;
                    Ok(rows)
                })
            }

            fn delete_at<'a>(
                conn: &'a mut <Self as sqlx::Database>::Connection,
                queries: &'a $crate::schema::TagQueries,
                location: &'a placebreak_types::Location,
            ) -> futures::future::BoxFuture<'a, Result<u64, $crate::error::StoreError>> {
                Box::pin(async move {
                    let result = sqlx::query(&queries.delete_by_location)
                        .bind(location.world())
                        .bind(location.x())
                        .bind(location.y())
                        .bind(location.z())
                        .execute(&mut *conn)
                        .await?;
                    Ok(result.rows_affected())
                })
            }

            fn insert<'a>(
                conn: &'a mut <Self as sqlx::Database>::Connection,
                queries: &'a $crate::schema::TagQueries,
                tag: &'a placebreak_types::Tag,
            ) -> futures::future::BoxFuture<'a, Result<(), $crate::error::StoreError>> {
                Box::pin(async move {
                    let $id = tag.id();
                    let location = tag.location();
                    sqlx::query(&queries.insert)
                        .bind($bind)
                        .bind(tag.created_at())
                        .bind(tag.is_ephemeral())
                        .bind(location.world())
                        .bind(location.x())
                        .bind(location.y())
                        .bind(location.z())
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            }
        }
    };
}

pub(crate) use tag_backend;

/// Pool, statements and locks of one SQL tag table.
pub(crate) struct SqlTagStore<DB: TagBackend> {
    pool: ConnectionPool<DB>,
    queries: Arc<TagQueries>,
    locks: LocationLocks,
}

impl<DB: TagBackend> SqlTagStore<DB> {
    pub(crate) fn new(
        options: <DB::Connection as Connection>::Options,
        pool: PoolConfig,
        table: &TableName,
    ) -> Self {
        let mut connections = ConnectionPool::new(DB::LABEL, options, pool);
        if let Some(statement) = DB::BEGIN_WRITE {
            connections = connections.with_begin_statement(statement);
        }
        Self {
            pool: connections,
            queries: Arc::new(TagQueries::new(DB::DIALECT, table)),
            locks: LocationLocks::new(),
        }
    }

    pub(crate) async fn is_connected(&self) -> bool {
        self.pool.is_connected().await
    }

    /// Open the pool and create the tag table if it is missing.
    pub(crate) async fn connect(&self) -> Result<(), StoreError> {
        self.pool.connect().await?;

        let queries = Arc::clone(&self.queries);
        self.pool
            .run(move |conn| {
                Box::pin(async move {
                    for statement in &queries.schema {
                        DB::execute(&mut *conn, statement.as_str()).await?;
                    }
                    Ok(())
                })
            })
            .await?;
        tracing::info!(backend = DB::LABEL, "Tag table ready");
        Ok(())
    }

    pub(crate) async fn disconnect(&self) {
        self.pool.disconnect().await;
    }

    pub(crate) async fn put(&self, tag: &Tag) -> Result<(), StoreError> {
        let _guard = self.locks.lock([tag.location()]).await;

        let queries = Arc::clone(&self.queries);
        let owned = tag.clone();
        self.pool
            .with_transaction(move |conn| {
                Box::pin(async move {
                    DB::delete_at(&mut *conn, &queries, owned.location()).await?;
                    DB::insert(&mut *conn, &queries, &owned).await
                })
            })
            .await?;

        tracing::debug!(
            backend = DB::LABEL,
            location = %tag.location(),
            ephemeral = tag.is_ephemeral(),
            "Stored tag"
        );
        Ok(())
    }

    pub(crate) async fn find_by_location(
        &self,
        location: &Location,
    ) -> Result<Option<Tag>, StoreError> {
        let queries = Arc::clone(&self.queries);
        let location = location.clone();
        self.pool
            .query(move |conn| {
                Box::pin(async move {
                    let rows = DB::select_at(&mut *conn, &queries, &location).await?;
                    pick_newest(DB::LABEL, &location, rows)
                })
            })
            .await
    }

    pub(crate) async fn delete(&self, location: &Location) -> Result<(), StoreError> {
        let _guard = self.locks.lock([location]).await;

        let queries = Arc::clone(&self.queries);
        let owned = location.clone();
        self.pool
            .run(move |conn| {
                Box::pin(async move {
                    let removed = DB::delete_at(&mut *conn, &queries, &owned).await?;
                    tracing::debug!(backend = DB::LABEL, location = %owned, removed, "Deleted tag");
                    Ok(())
                })
            })
            .await
    }

    /// Execute a relocation plan in one write transaction.
    pub(crate) async fn move_tags(
        &self,
        displacements: &DisplacementSet,
    ) -> Result<usize, StoreError> {
        if displacements.is_empty() {
            return Ok(0);
        }
        let _guard = self.locks.lock(&displacements.flatten()).await;

        let queries = Arc::clone(&self.queries);
        let owned = displacements.clone();
        let carried = self
            .pool
            .with_transaction(move |conn| {
                Box::pin(async move {
                    let mut plan = RelocationPlan::new(DB::LABEL, &owned);
                    for pair in &owned {
                        let rows = DB::select_at(&mut *conn, &queries, pair.old()).await?;
                        plan.carry(pair, pick_newest(DB::LABEL, pair.old(), rows)?);
                    }
                    for location in plan.cleared() {
                        DB::delete_at(&mut *conn, &queries, location).await?;
                    }
                    for tag in plan.carried() {
                        DB::insert(&mut *conn, &queries, tag).await?;
                    }
                    Ok(plan.carried().len())
                })
            })
            .await?;

        tracing::debug!(
            backend = DB::LABEL,
            pairs = displacements.len(),
            carried,
            "Moved tags"
        );
        Ok(carried)
    }
}

impl<DB: TagBackend> core::fmt::Debug for SqlTagStore<DB> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SqlTagStore")
            .field("pool", &self.pool)
            .field("queries", &self.queries)
            .finish_non_exhaustive()
    }
}
