//! Error types for the core library

use std::path::PathBuf;

use thiserror::Error;

use crate::monitoring::ExecError;
use crate::tracing::TracingError;

/// Errors raised while loading or saving the settings file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No configuration directory could be determined
    #[error("Could not determine a configuration directory")]
    NoConfigDir,

    /// Reading or writing failed
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the settings layout
    #[error("Failed to parse {path}: {source}")]
    Parse {
        /// File being parsed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },

    /// The settings could not be serialized
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A connection profile is unusable
    #[error("Invalid connection profile '{name}': {reason}")]
    InvalidProfile {
        /// Profile name
        name: String,
        /// What is wrong with it
        reason: String,
    },
}

/// Top-level error of the core library
#[derive(Debug, Error)]
pub enum HostpulseError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Remote command error
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// Logging setup error
    #[error(transparent)]
    Tracing(#[from] TracingError),
}

/// Result type of configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
