//! Loading and saving `config.toml`

use std::fs;
use std::path::{Path, PathBuf};

use super::Settings;
use crate::error::{ConfigError, ConfigResult};
use crate::tracing::span_names;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "HOSTPULSE_CONFIG_DIR";

/// Settings file name inside the configuration directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Reads and writes the settings file of one configuration directory
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a manager for the default directory.
    ///
    /// `$HOSTPULSE_CONFIG_DIR` wins; otherwise `<config dir>/hostpulse`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoConfigDir`] if neither is available.
    pub fn new() -> ConfigResult<Self> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
            return Ok(Self::with_config_dir(PathBuf::from(dir)));
        }
        dirs::config_dir()
            .map(|dir| Self::with_config_dir(dir.join("hostpulse")))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Creates a manager for an explicit directory
    #[must_use]
    pub const fn with_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// The configuration directory
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Path of `config.toml`
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    /// Loads the settings; a missing file yields the defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_settings(&self) -> ConfigResult<Settings> {
        let path = self.settings_path();
        let _span = tracing::debug_span!(span_names::CONFIG_LOAD, path = %path.display()).entered();

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No settings file, using defaults");
                return Ok(Settings::default());
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };

        toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Writes the settings, creating the directory if needed
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any filesystem operation fails.
    pub fn save_settings(&self, settings: &Settings) -> ConfigResult<()> {
        let path = self.settings_path();
        let _span = tracing::debug_span!(span_names::CONFIG_SAVE, path = %path.display()).entered();

        fs::create_dir_all(&self.config_dir).map_err(|source| ConfigError::Io {
            path: self.config_dir.clone(),
            source,
        })?;
        let content = toml::to_string_pretty(settings)?;
        fs::write(&path, content).map_err(|source| ConfigError::Io { path, source })
    }
}
