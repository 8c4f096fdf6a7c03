//! Error types for the tag store.
//!
//! Every backend failure is translated into [`StoreError`] before it leaves
//! this crate, so callers never match on driver-specific types. The variants
//! fall into four groups: configuration (`NotInitialized`,
//! `UnsupportedBackend`, `Config`), connectivity (`Connectivity`), data
//! (`Data`, `Corrupted`).
//!
//! Lock contention (`SQLite` busy/locked, `PostgreSQL` serialization failures
//! and deadlocks) counts as connectivity, since a later retry can succeed.

use sqlx::error::DatabaseError;
use sqlx::postgres::PgDatabaseError;
use sqlx::sqlite::SqliteError;

/// Errors that can occur in the tag store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A data operation ran before `connect()` or after `disconnect()`.
    #[error("{backend} connection pool is not initialized")]
    NotInitialized {
        /// Backend whose pool is missing.
        backend: &'static str,
    },

    /// The requested backend kind is not supported.
    #[error("unsupported backend: {0}")]
    UnsupportedBackend(String),

    /// Backend parameters are invalid or the backend could not be prepared.
    #[error("configuration error: {0}")]
    Config(String),

    /// A connection could not be acquired (timeout, refused, TLS, I/O).
    #[error("connectivity error: {0}")]
    Connectivity(#[source] sqlx::Error),

    /// A statement failed after a connection was acquired.
    #[error("data error: {0}")]
    Data(#[source] sqlx::Error),

    /// A stored row could not be turned back into a tag.
    #[error("corrupted tag record: {0}")]
    Corrupted(String),
}

impl StoreError {
    /// Wrap an error raised while acquiring or opening a connection.
    ///
    /// Configuration problems reported by the driver stay configuration
    /// errors; everything else counts as connectivity.
    pub fn connectivity(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(inner) => Self::Config(inner.to_string()),
            other => Self::Connectivity(other),
        }
    }

    /// Whether retrying the same call later could succeed.
    ///
    /// The store never retries on its own; this only informs host policy.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(&err, sqlx::Error::Database(db) if is_lock_contention(db.as_ref())) {
            return Self::Connectivity(err);
        }
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => Self::Connectivity(err),
            sqlx::Error::Configuration(inner) => Self::Config(inner.to_string()),
            other => Self::Data(other),
        }
    }
}

/// `SQLite` primary result codes `SQLITE_BUSY` and `SQLITE_LOCKED`.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

/// `PostgreSQL` SQLSTATEs for serialization failure, deadlock and lock
/// timeout.
const PG_CONTENTION_STATES: [&str; 3] = ["40001", "40P01", "55P03"];

/// Whether a statement failed only because another writer held a lock.
fn is_lock_contention(err: &(dyn DatabaseError + 'static)) -> bool {
    if err.try_downcast_ref::<SqliteError>().is_some() {
        // Extended result codes keep the primary code in the low byte.
        return err
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .is_some_and(is_sqlite_contention_code);
    }
    err.try_downcast_ref::<PgDatabaseError>()
        .is_some_and(|pg| PG_CONTENTION_STATES.contains(&pg.code()))
}

const fn is_sqlite_contention_code(code: i32) -> bool {
    matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeout_is_connectivity() {
        let err = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Connectivity(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn missing_row_is_data() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Data(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn sqlite_busy_and_locked_codes_are_contention() {
        assert!(is_sqlite_contention_code(5));
        assert!(is_sqlite_contention_code(6));
        // SQLITE_BUSY_SNAPSHOT and SQLITE_LOCKED_SHAREDCACHE.
        assert!(is_sqlite_contention_code(517));
        assert!(is_sqlite_contention_code(262));
        // SQLITE_CONSTRAINT_NOTNULL.
        assert!(!is_sqlite_contention_code(1299));
    }

    #[test]
    fn not_initialized_names_backend() {
        let err = StoreError::NotInitialized { backend: "sqlite" };
        assert_eq!(err.to_string(), "sqlite connection pool is not initialized");
    }
}
