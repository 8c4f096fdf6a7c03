//! Tag persistence for the place-and-break patch (memory, `SQLite`, `PostgreSQL`).
//!
//! A tag marks a block location whose next reward action should be
//! suppressed. This crate stores tags behind one contract,
//! [`TagRepository`], with three interchangeable backends selected once at
//! startup through [`TagStore::from_config`].
//!
//! # Architecture
//!
//! ```text
//! StoreConfig --> TagStore::from_config
//!                   |
//!                   +-- Memory   (HashMap behind RwLock)
//!                   +-- Sqlite   (SqlTagStore<Sqlite>)
//!                   +-- Postgres (SqlTagStore<Postgres>)
//! ```
//!
//! # Modules
//!
//! - [`config`] -- Backend selection, pool sizing, table name
//! - [`error`] -- The `StoreError` taxonomy
//! - [`pool`] -- Lazily connected bounded connection pool
//! - [`repository`] -- The `TagRepository` contract
//! - [`memory`] -- In-memory backend
//! - [`sqlite`] -- Embedded file backend
//! - [`postgres`] -- Networked backend
//! - [`store`] -- The `TagStore` dispatch enum

pub mod config;
pub mod error;
mod locks;
pub mod memory;
pub mod pool;
pub mod postgres;
mod relocation;
pub mod repository;
mod schema;
mod sql;
pub mod sqlite;
pub mod store;

// Re-export primary types for convenience.
pub use config::{BackendKind, PoolConfig, PostgresConfig, SqliteConfig, StoreConfig, TableName};
pub use error::StoreError;
pub use memory::MemoryTagStore;
pub use pool::ConnectionPool;
pub use postgres::PostgresTagStore;
pub use repository::TagRepository;
pub use sqlite::SqliteTagStore;
pub use store::TagStore;
