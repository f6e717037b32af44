//! Fatal configuration errors.
//!
//! Every variant aborts resolution: a bad configuration can never be safely
//! run with, so nothing here is retried or downgraded.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving the server configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("error reading config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing config file '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    #[error(
        "executable config file '{path}' is not supported; convert it to config.ini or config.json5"
    )]
    ExecutableConfig { path: PathBuf },

    #[error("Unknown option: {key}")]
    UnknownOption { key: String },

    #[error("config option '{key}' is required with attachment storage '{storage}'")]
    MissingCompanion { key: String, storage: String },

    #[error("Invalid numeric value for {key}: {value}")]
    InvalidNumeric { key: String, value: String },

    #[error("Missing required configuration value: {key}")]
    MissingRequired { key: String },

    #[error("resolved configuration does not match the expected schema: {0}")]
    Schema(#[from] serde_json::Error),
}
