//! Backend selection and connection parameters.
//!
//! These are resolved once at startup (see `placebreak-core::config`) and
//! handed to [`TagStore::from_config`](crate::TagStore::from_config). The
//! store never reads files or environment variables itself.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::StoreError;

/// Default maximum number of connections in a pool.
pub const DEFAULT_POOL_SIZE: u32 = 10;

/// Largest accepted pool size.
pub const MAX_POOL_SIZE: u32 = 100;

/// Default connection acquisition timeout in milliseconds.
pub const DEFAULT_CONNECTION_TIMEOUT_MS: u64 = 30_000;

/// Largest accepted connection acquisition timeout in milliseconds.
pub const MAX_CONNECTION_TIMEOUT_MS: u64 = 600_000;

/// Default table holding tags.
pub const DEFAULT_TABLE_NAME: &str = "patch_place_break_tag";

/// Longest accepted table name (the `PostgreSQL` identifier limit).
const MAX_TABLE_NAME_LEN: usize = 63;

/// The persistence backends the store can run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Non-persistent map, single process.
    Memory,
    /// Embedded `SQLite` file.
    Sqlite,
    /// Networked `PostgreSQL` server.
    Postgres,
}

impl BackendKind {
    /// Lower-case name used in configuration and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
        }
    }
}

impl core::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" | "in_memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(StoreError::UnsupportedBackend(other.to_owned())),
        }
    }
}

/// A validated SQL table name.
///
/// Table names cannot be bound as statement parameters, so they are spliced
/// into SQL text. Only plain identifiers are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    /// Validate and wrap a table name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] unless the name matches
    /// `[A-Za-z_][A-Za-z0-9_]*` and is at most 63 characters long.
    pub fn new(name: &str) -> Result<Self, StoreError> {
        let mut chars = name.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

        if !valid_start || !valid_rest {
            return Err(StoreError::Config(format!(
                "table name {name:?} must be a plain SQL identifier"
            )));
        }
        if name.len() > MAX_TABLE_NAME_LEN {
            return Err(StoreError::Config(format!(
                "table name {name:?} exceeds {MAX_TABLE_NAME_LEN} characters"
            )));
        }
        Ok(Self(name.to_owned()))
    }

    /// Return the name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TableName {
    fn default() -> Self {
        Self(DEFAULT_TABLE_NAME.to_owned())
    }
}

impl core::fmt::Display for TableName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Connection pool sizing and acquisition timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    connection_timeout: Duration,
    size: u32,
}

impl PoolConfig {
    /// Create a pool configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if `size` is outside `[1, 100]` or the
    /// timeout is outside `[1, 600000]` milliseconds.
    pub fn new(connection_timeout: Duration, size: u32) -> Result<Self, StoreError> {
        if !(1..=MAX_POOL_SIZE).contains(&size) {
            return Err(StoreError::Config(format!(
                "pool size {size} must be between 1 and {MAX_POOL_SIZE}"
            )));
        }
        let timeout_ms = connection_timeout.as_millis();
        if !(1..=u128::from(MAX_CONNECTION_TIMEOUT_MS)).contains(&timeout_ms) {
            return Err(StoreError::Config(format!(
                "connection timeout {timeout_ms}ms must be between 1 and \
                 {MAX_CONNECTION_TIMEOUT_MS}ms"
            )));
        }
        Ok(Self {
            connection_timeout,
            size,
        })
    }

    /// Maximum time to wait for a connection before failing.
    pub const fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }

    /// Maximum number of live connections.
    pub const fn size(&self) -> u32 {
        self.size
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            connection_timeout: Duration::from_millis(DEFAULT_CONNECTION_TIMEOUT_MS),
            size: DEFAULT_POOL_SIZE,
        }
    }
}

/// Configuration for the embedded `SQLite` backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteConfig {
    /// Database file; created with its parent directory if missing.
    pub path: PathBuf,
    /// Table holding tags.
    pub table: TableName,
    /// Pool settings.
    pub pool: PoolConfig,
}

impl SqliteConfig {
    /// Create a configuration for the given file with default table and pool.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: TableName::default(),
            pool: PoolConfig::default(),
        }
    }

    /// Set the table name.
    #[must_use]
    pub fn with_table(mut self, table: TableName) -> Self {
        self.table = table;
        self
    }

    /// Set the pool settings.
    #[must_use]
    pub const fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }
}

/// Configuration for the networked `PostgreSQL` backend.
#[derive(Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    /// Server hostname or IP address.
    pub hostname: String,
    /// Server port.
    pub port: u16,
    /// Whether TLS is required.
    pub ssl_enabled: bool,
    /// Database name.
    pub database: String,
    /// Login user.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Table holding tags.
    pub table: TableName,
    /// Pool settings.
    pub pool: PoolConfig,
}

impl PostgresConfig {
    /// Create a configuration with default port, TLS, table and pool.
    pub fn new(hostname: &str, database: &str, username: &str, password: &str) -> Self {
        Self {
            hostname: hostname.to_owned(),
            port: 5432,
            ssl_enabled: true,
            database: database.to_owned(),
            username: username.to_owned(),
            password: password.to_owned(),
            table: TableName::default(),
            pool: PoolConfig::default(),
        }
    }

    /// Set the port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enable or disable TLS.
    #[must_use]
    pub const fn with_ssl(mut self, enabled: bool) -> Self {
        self.ssl_enabled = enabled;
        self
    }

    /// Set the table name.
    #[must_use]
    pub fn with_table(mut self, table: TableName) -> Self {
        self.table = table;
        self
    }

    /// Set the pool settings.
    #[must_use]
    pub const fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }
}

// Hand-written so the password never reaches logs.
impl core::fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("ssl_enabled", &self.ssl_enabled)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("table", &self.table)
            .field("pool", &self.pool)
            .finish()
    }
}

/// The backend chosen at startup together with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// In-memory map.
    Memory,
    /// Embedded `SQLite` file.
    Sqlite(SqliteConfig),
    /// Networked `PostgreSQL` server.
    Postgres(PostgresConfig),
}

impl StoreConfig {
    /// Which backend this configuration selects.
    pub const fn kind(&self) -> BackendKind {
        match self {
            Self::Memory => BackendKind::Memory,
            Self::Sqlite(_) => BackendKind::Sqlite,
            Self::Postgres(_) => BackendKind::Postgres,
        }
    }
}
