//! Error types for the `placebreak` binary.
//!
//! [`CliError`] wraps every failure mode of a CLI run so `main` can
//! propagate with `?`.

/// Top-level error for the `placebreak` binary.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: placebreak_core::ConfigError,
    },

    /// A patch operation failed.
    #[error("patch error: {source}")]
    Patch {
        /// The underlying patch error.
        #[from]
        source: placebreak_core::PatchError,
    },

    /// A location argument could not be parsed.
    #[error("invalid location {input:?}: {reason}")]
    Location {
        /// The argument as given.
        input: String,
        /// What is wrong with it.
        reason: String,
    },
}
