//! CLI error types and exit codes.

use hostpulse_core::error::{ConfigError, HostpulseError};

/// Exit codes for CLI operations
pub mod exit_codes {
    /// General error - configuration, parsing, or I/O
    pub const GENERAL_ERROR: i32 = 1;
    /// Connection failure - unknown profile or the session went away
    pub const CONNECTION_FAILURE: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection profile not found
    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Output could not be produced
    #[error("Output error: {0}")]
    Output(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<HostpulseError> for CliError {
    fn from(err: HostpulseError) -> Self {
        match err {
            HostpulseError::Config(e) => e.into(),
            HostpulseError::Exec(e) => Self::Connection(e.to_string()),
            HostpulseError::Tracing(e) => Self::Config(e.to_string()),
        }
    }
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: General error (configuration, output, IO)
    /// - 2: Connection failure (profile not found, session closed)
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionNotFound(_) | Self::Connection(_) => exit_codes::CONNECTION_FAILURE,
            Self::Config(_) | Self::Output(_) | Self::Io(_) => exit_codes::GENERAL_ERROR,
        }
    }
}
