//! Configuration loading and typed config structures for the patch.
//!
//! The configuration lives in a YAML file (by default `placebreak.yaml`).
//! This module defines strongly-typed structs that mirror the YAML structure,
//! a loader that reads the file, and a validator. The validated result is
//! turned into a [`StoreConfig`] once at startup and injected into the store.
//!
//! ```yaml
//! data_source:
//!   type: postgres           # memory | sqlite | postgres
//!   table: patch_place_break_tag
//!   sqlite:
//!     file: data/sqlite/patch-place-break.db
//!   dbms_server:
//!     host:
//!       hostname: localhost
//!       port: 5432
//!       ssl_enabled: true
//!     credentials:
//!       username: username
//!       password: password
//!     database: patch_place_break
//!   connection_pool:
//!     connection_timeout_ms: 30000
//!     pool_size: 10
//! restricted_blocks:
//!   mode: blacklist          # disabled | blacklist | whitelist
//!   materials: [BEDROCK]
//! patch:
//!   ephemeral_window_ms: 3000
//! logging:
//!   level: info
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use placebreak_store::config::{
    DEFAULT_CONNECTION_TIMEOUT_MS, DEFAULT_POOL_SIZE, DEFAULT_TABLE_NAME,
};
use placebreak_store::{
    BackendKind, PoolConfig, PostgresConfig, SqliteConfig, StoreConfig, StoreError, TableName,
};
use serde::Deserialize;

use crate::decision::DEFAULT_EPHEMERAL_WINDOW;
use crate::restriction::RestrictedBlocks;

/// Environment variable overriding `data_source.dbms_server.host.hostname`.
pub const ENV_DB_HOST: &str = "PLACEBREAK_DB_HOST";

/// Environment variable overriding `data_source.dbms_server.credentials.username`.
pub const ENV_DB_USERNAME: &str = "PLACEBREAK_DB_USERNAME";

/// Environment variable overriding `data_source.dbms_server.credentials.password`.
pub const ENV_DB_PASSWORD: &str = "PLACEBREAK_DB_PASSWORD";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is out of range or malformed.
    #[error("invalid configuration: {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Explanation of what is wrong.
        reason: String,
    },

    /// The store rejected the resolved settings.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level patch configuration.
///
/// All fields have defaults, so an empty file is a valid configuration
/// (embedded `SQLite` store, no restrictions, 3 second window).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PatchConfig {
    /// Where tags are stored.
    #[serde(default)]
    pub data_source: DataSourceConfig,

    /// Materials excluded from (or limited to) the patch.
    #[serde(default)]
    pub restricted_blocks: RestrictedBlocks,

    /// Decision engine settings.
    #[serde(default)]
    pub patch: PatchSection,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PatchConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for the DBMS server:
    /// - `PLACEBREAK_DB_HOST` overrides `data_source.dbms_server.host.hostname`
    /// - `PLACEBREAK_DB_USERNAME` overrides `data_source.dbms_server.credentials.username`
    /// - `PLACEBREAK_DB_PASSWORD` overrides `data_source.dbms_server.credentials.password`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, applying environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config
            .data_source
            .dbms_server
            .apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// The configured ephemeral window.
    pub const fn ephemeral_window(&self) -> Duration {
        Duration::from_millis(self.patch.ephemeral_window_ms)
    }

    /// Check every value that the type system does not.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Store`] for an unknown backend type and
    /// [`ConfigError::Invalid`] for any out-of-range or blank value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let backend = self.data_source.backend()?;
        self.data_source.table_name()?;
        self.data_source.connection_pool.pool_config()?;

        if self.patch.ephemeral_window_ms == 0 {
            return Err(invalid("patch.ephemeral_window_ms", "must be at least 1"));
        }

        match backend {
            BackendKind::Memory => {}
            BackendKind::Sqlite => {
                if self.data_source.sqlite.file.as_os_str().is_empty() {
                    return Err(invalid("data_source.sqlite.file", "must not be empty"));
                }
            }
            BackendKind::Postgres => self.data_source.dbms_server.validate()?,
        }
        Ok(())
    }

    /// Validate and resolve the store settings.
    ///
    /// # Errors
    ///
    /// See [`validate`](Self::validate).
    pub fn store_config(&self) -> Result<StoreConfig, ConfigError> {
        self.validate()?;

        let source = &self.data_source;
        let table = source.table_name()?;
        let pool = source.connection_pool.pool_config()?;

        Ok(match source.backend()? {
            BackendKind::Memory => StoreConfig::Memory,
            BackendKind::Sqlite => StoreConfig::Sqlite(
                SqliteConfig::new(source.sqlite.file.clone())
                    .with_table(table)
                    .with_pool(pool),
            ),
            BackendKind::Postgres => {
                let server = &source.dbms_server;
                StoreConfig::Postgres(
                    PostgresConfig::new(
                        &server.host.hostname,
                        &server.database,
                        &server.credentials.username,
                        &server.credentials.password,
                    )
                    .with_port(server.host.port)
                    .with_ssl(server.host.ssl_enabled)
                    .with_table(table)
                    .with_pool(pool),
                )
            }
        })
    }
}

/// Persistence settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DataSourceConfig {
    /// Backend name: `memory`, `sqlite` or `postgres`.
    #[serde(rename = "type", default = "default_backend")]
    pub kind: String,

    /// Table holding tags.
    #[serde(default = "default_table")]
    pub table: String,

    /// Embedded backend settings.
    #[serde(default)]
    pub sqlite: SqliteSection,

    /// Networked backend settings.
    #[serde(default)]
    pub dbms_server: DbmsServerConfig,

    /// Pool settings shared by the SQL backends.
    #[serde(default)]
    pub connection_pool: ConnectionPoolSection,
}

impl DataSourceConfig {
    /// Parse the backend name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Store`] wrapping
    /// [`StoreError::UnsupportedBackend`] for an unknown name.
    pub fn backend(&self) -> Result<BackendKind, ConfigError> {
        Ok(self.kind.parse::<BackendKind>()?)
    }

    fn table_name(&self) -> Result<TableName, ConfigError> {
        TableName::new(&self.table).map_err(|e| invalid("data_source.table", e.to_string()))
    }
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            kind: default_backend(),
            table: default_table(),
            sqlite: SqliteSection::default(),
            dbms_server: DbmsServerConfig::default(),
            connection_pool: ConnectionPoolSection::default(),
        }
    }
}

/// Embedded backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteSection {
    /// Database file, relative to the working directory unless absolute.
    #[serde(default = "default_sqlite_file")]
    pub file: PathBuf,
}

impl Default for SqliteSection {
    fn default() -> Self {
        Self {
            file: default_sqlite_file(),
        }
    }
}

/// Networked backend settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DbmsServerConfig {
    /// Where the server listens.
    #[serde(default)]
    pub host: DbmsHostConfig,

    /// Login.
    #[serde(default)]
    pub credentials: DbmsCredentialsConfig,

    /// Database name.
    #[serde(default = "default_database")]
    pub database: String,
}

impl DbmsServerConfig {
    /// Override host and credentials from `lookup` (normally the process
    /// environment).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup(ENV_DB_HOST) {
            self.host.hostname = val;
        }
        if let Some(val) = lookup(ENV_DB_USERNAME) {
            self.credentials.username = val;
        }
        if let Some(val) = lookup(ENV_DB_PASSWORD) {
            self.credentials.password = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.hostname.trim().is_empty() {
            return Err(invalid("data_source.dbms_server.host.hostname", "must not be blank"));
        }
        if self.host.port == 0 {
            return Err(invalid("data_source.dbms_server.host.port", "must be between 1 and 65535"));
        }
        if self.credentials.username.trim().is_empty() {
            return Err(invalid(
                "data_source.dbms_server.credentials.username",
                "must not be blank",
            ));
        }
        if self.database.trim().is_empty() {
            return Err(invalid("data_source.dbms_server.database", "must not be blank"));
        }
        Ok(())
    }
}

/// Server address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DbmsHostConfig {
    /// Hostname or IP address.
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whether TLS is required.
    #[serde(default = "default_ssl_enabled")]
    pub ssl_enabled: bool,
}

impl Default for DbmsHostConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            port: default_port(),
            ssl_enabled: default_ssl_enabled(),
        }
    }
}

/// Server login.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct DbmsCredentialsConfig {
    /// Login user.
    #[serde(default = "default_username")]
    pub username: String,

    /// Login password.
    #[serde(default = "default_password")]
    pub password: String,
}

impl Default for DbmsCredentialsConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: default_password(),
        }
    }
}

impl core::fmt::Debug for DbmsCredentialsConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DbmsCredentialsConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Pool sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ConnectionPoolSection {
    /// Milliseconds to wait for a free connection.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// Maximum number of connections.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl ConnectionPoolSection {
    fn pool_config(self) -> Result<PoolConfig, ConfigError> {
        PoolConfig::new(Duration::from_millis(self.connection_timeout_ms), self.pool_size)
            .map_err(|e| invalid("data_source.connection_pool", e.to_string()))
    }
}

impl Default for ConnectionPoolSection {
    fn default() -> Self {
        Self {
            connection_timeout_ms: default_connection_timeout_ms(),
            pool_size: default_pool_size(),
        }
    }
}

/// Decision engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PatchSection {
    /// How long an ephemeral tag suppresses rewards, in milliseconds.
    #[serde(default = "default_ephemeral_window_ms")]
    pub ephemeral_window_ms: u64,
}

impl Default for PatchSection {
    fn default() -> Self {
        Self {
            ephemeral_window_ms: default_ephemeral_window_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG` is
    /// not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

fn default_backend() -> String {
    "sqlite".to_owned()
}

fn default_table() -> String {
    DEFAULT_TABLE_NAME.to_owned()
}

fn default_sqlite_file() -> PathBuf {
    PathBuf::from("data/sqlite/patch-place-break.db")
}

fn default_hostname() -> String {
    "localhost".to_owned()
}

const fn default_port() -> u16 {
    5432
}

const fn default_ssl_enabled() -> bool {
    true
}

fn default_username() -> String {
    "username".to_owned()
}

fn default_password() -> String {
    "password".to_owned()
}

fn default_database() -> String {
    "patch_place_break".to_owned()
}

const fn default_connection_timeout_ms() -> u64 {
    DEFAULT_CONNECTION_TIMEOUT_MS
}

const fn default_pool_size() -> u32 {
    DEFAULT_POOL_SIZE
}

#[allow(clippy::cast_possible_truncation)] // 3000 ms fits in u64
const fn default_ephemeral_window_ms() -> u64 {
    DEFAULT_EPHEMERAL_WINDOW.as_millis() as u64
}

fn default_log_level() -> String {
    "info".to_owned()
}
