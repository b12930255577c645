//! Configuration management
//!
//! Settings live in a single `config.toml`:
//!
//! ```toml
//! [monitoring]
//! interval_ms = 3000
//!
//! [logging]
//! level = "info"
//!
//! [[connections]]
//! name = "web"
//! host = "10.0.0.5"
//! user = "ops"
//! jump_host = "ops@gateway.example"
//! ```

mod manager;
mod profile;

pub use manager::{CONFIG_DIR_ENV, CONFIG_FILE_NAME, ConfigManager};
pub use profile::ConnectionProfile;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::monitoring::MonitoringSettings;

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Polling settings
    #[serde(default)]
    pub monitoring: MonitoringSettings,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Saved connections
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<ConnectionProfile>,
}

impl Settings {
    /// Looks up a connection profile by exact name, then case-insensitively
    #[must_use]
    pub fn find_connection(&self, name: &str) -> Option<&ConnectionProfile> {
        self.connections
            .iter()
            .find(|c| c.name == name)
            .or_else(|| {
                self.connections
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(name))
            })
    }
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Level name (`error`, `warn`, `info`, `debug`, `trace`)
    #[serde(default = "default_level")]
    pub level: String,
    /// Raw `EnvFilter` directive, overrides `level`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Log to this file instead of stderr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

fn default_level() -> String {
    "warn".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            filter: None,
            file: None,
        }
    }
}
