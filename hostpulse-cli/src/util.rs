//! Shared utility functions used across command modules.

use std::path::Path;

use hostpulse_core::config::{ConfigManager, Settings};
use hostpulse_core::tracing::{TracingConfig, TracingLevel};

use crate::error::CliError;

/// Creates a `ConfigManager` using the optional custom config directory
/// from CLI args.
pub fn create_config_manager(config_path: Option<&Path>) -> Result<ConfigManager, CliError> {
    match config_path {
        Some(path) => Ok(ConfigManager::with_config_dir(path.to_path_buf())),
        None => ConfigManager::new()
            .map_err(|e| CliError::Config(format!("Failed to initialize config: {e}"))),
    }
}

/// Loads `config.toml` from the selected directory
pub fn load_settings(config_path: Option<&Path>) -> Result<Settings, CliError> {
    create_config_manager(config_path)?
        .load_settings()
        .map_err(|e| CliError::Config(format!("Failed to load settings: {e}")))
}

/// Logging setup: the `[logging]` section, overridden by `-v` flags.
///
/// An unreadable settings file falls back to the defaults here; the command
/// itself reports the error.
pub fn tracing_config(config_path: Option<&Path>, verbose: u8) -> TracingConfig {
    let base = load_settings(config_path)
        .map(|s| TracingConfig::from_settings(&s.logging))
        .unwrap_or_default();

    if verbose == 0 {
        return base;
    }
    TracingConfig {
        level: TracingLevel::from_verbosity(verbose),
        filter: None,
        ..base
    }
}
