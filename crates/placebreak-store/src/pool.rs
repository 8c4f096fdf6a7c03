//! Bounded connection pool shared by the SQL backends.
//!
//! [`ConnectionPool`] wraps a [`sqlx::Pool`] with an explicit lifecycle:
//! nothing is opened until [`connect`](ConnectionPool::connect), and every
//! data call before that (or after [`disconnect`](ConnectionPool::disconnect))
//! fails with [`StoreError::NotInitialized`].
//!
//! Connections are only ever lent to a closure. The connection goes back to
//! the pool when the closure's future completes, whether it succeeded or
//! failed, because [`sqlx::pool::PoolConnection`] releases on drop.

use futures::future::BoxFuture;
use sqlx::pool::PoolOptions;
use sqlx::{Connection, Database, Pool};
use tokio::sync::RwLock;

use crate::config::PoolConfig;
use crate::error::StoreError;

/// A lazily connected, bounded pool of backend connections.
pub struct ConnectionPool<DB: Database> {
    /// Backend label used in logs and errors.
    backend: &'static str,
    /// Options used to open each connection.
    options: <DB::Connection as Connection>::Options,
    /// Sizing and acquisition timeout.
    config: PoolConfig,
    /// Custom statement opening transactions, if the driver default is not
    /// wanted.
    begin_statement: Option<&'static str>,
    /// `None` until connected, and again after disconnecting.
    state: RwLock<Option<Pool<DB>>>,
}

impl<DB: Database> ConnectionPool<DB> {
    /// Create a disconnected pool.
    pub fn new(
        backend: &'static str,
        options: <DB::Connection as Connection>::Options,
        config: PoolConfig,
    ) -> Self {
        Self {
            backend,
            options,
            config,
            begin_statement: None,
            state: RwLock::new(None),
        }
    }

    /// Open transactions with `statement` instead of a plain `BEGIN`.
    ///
    /// `SQLite` writers pass `BEGIN IMMEDIATE`, which takes the write lock
    /// before the first read and waits for it under the busy timeout.
    #[must_use]
    pub const fn with_begin_statement(mut self, statement: &'static str) -> Self {
        self.begin_statement = Some(statement);
        self
    }

    /// Return the backend label.
    pub const fn backend(&self) -> &'static str {
        self.backend
    }

    /// Open the pool. Calling it on an already connected pool does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connectivity`] if the first connection cannot be
    /// established, or [`StoreError::Config`] if the driver rejects the
    /// connection options.
    pub async fn connect(&self) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.is_some() {
            tracing::warn!(backend = self.backend, "Connection pool already connected");
            return Ok(());
        }

        tracing::info!(
            backend = self.backend,
            pool_size = self.config.size(),
            connection_timeout_ms =
                u64::try_from(self.config.connection_timeout().as_millis()).unwrap_or(u64::MAX),
            "Connecting to database"
        );

        let pool = PoolOptions::<DB>::new()
            .max_connections(self.config.size())
            .acquire_timeout(self.config.connection_timeout())
            .connect_with(self.options.clone())
            .await
            .map_err(StoreError::connectivity)?;

        *state = Some(pool);
        tracing::info!(backend = self.backend, "Connected to database");
        Ok(())
    }

    /// Close every connection. Calling it on a closed pool does nothing.
    pub async fn disconnect(&self) {
        let pool = self.state.write().await.take();
        match pool {
            Some(pool) => {
                pool.close().await;
                tracing::info!(backend = self.backend, "Disconnected from database");
            }
            None => {
                tracing::warn!(
                    backend = self.backend,
                    "Database disconnection skipped: no open connection pool"
                );
            }
        }
    }

    /// Whether [`connect`](Self::connect) has succeeded and the pool is open.
    pub async fn is_connected(&self) -> bool {
        self.state.read().await.is_some()
    }

    /// Run `action` with a pooled connection and return its result.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotInitialized`] if the pool is not connected,
    /// [`StoreError::Connectivity`] if no connection frees up within the
    /// timeout, or whatever `action` returns.
    pub async fn with_connection<T, F>(&self, action: F) -> Result<T, StoreError>
    where
        F: for<'c> FnOnce(&'c mut DB::Connection) -> BoxFuture<'c, Result<T, StoreError>> + Send,
        T: Send,
    {
        let pool = self.handle().await?;
        let mut conn = pool.acquire().await.map_err(StoreError::connectivity)?;
        action(&mut *conn).await
    }

    /// Run `action` inside a transaction.
    ///
    /// The transaction commits when `action` returns `Ok` and rolls back
    /// otherwise, so either every statement lands or none does.
    ///
    /// # Errors
    ///
    /// As for [`with_connection`](Self::with_connection), plus
    /// [`StoreError::Data`] if the commit fails.
    pub async fn with_transaction<T, F>(&self, action: F) -> Result<T, StoreError>
    where
        F: for<'c> FnOnce(&'c mut DB::Connection) -> BoxFuture<'c, Result<T, StoreError>> + Send,
        T: Send,
    {
        let pool = self.handle().await?;
        let mut tx = match self.begin_statement {
            Some(statement) => pool.begin_with(statement).await?,
            None => pool.begin().await?,
        };
        let value = action(&mut *tx).await?;
        tx.commit().await?;
        Ok(value)
    }

    /// Run a statement that produces nothing.
    ///
    /// # Errors
    ///
    /// See [`with_connection`](Self::with_connection).
    pub async fn run<F>(&self, action: F) -> Result<(), StoreError>
    where
        F: for<'c> FnOnce(&'c mut DB::Connection) -> BoxFuture<'c, Result<(), StoreError>> + Send,
    {
        self.with_connection(action).await
    }

    /// Run a query that produces at most one value.
    ///
    /// # Errors
    ///
    /// See [`with_connection`](Self::with_connection).
    pub async fn query<T, F>(&self, action: F) -> Result<Option<T>, StoreError>
    where
        F: for<'c> FnOnce(&'c mut DB::Connection) -> BoxFuture<'c, Result<Option<T>, StoreError>>
            + Send,
        T: Send,
    {
        self.with_connection(action).await
    }

    /// Clone the live pool handle without holding the state lock.
    async fn handle(&self) -> Result<Pool<DB>, StoreError> {
        self.state
            .read()
            .await
            .clone()
            .ok_or(StoreError::NotInitialized {
                backend: self.backend,
            })
    }
}

impl<DB: Database> core::fmt::Debug for ConnectionPool<DB> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("backend", &self.backend)
            .field("config", &self.config)
            .field("begin_statement", &self.begin_statement)
            .finish_non_exhaustive()
    }
}
