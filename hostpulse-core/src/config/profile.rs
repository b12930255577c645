//! Saved connection profiles

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::monitoring::{SshTarget, TransportKind};

const fn default_port() -> u16 {
    22
}

/// A host to monitor, as stored in `config.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    /// Display name, also used as the connection id
    pub name: String,
    /// Hostname or IP
    pub host: String,
    /// SSH port
    #[serde(default = "default_port")]
    pub port: u16,
    /// SSH username
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Private key path; `~` and environment variables are expanded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<String>,
    /// Jump host; when set the connection uses the Bastion transport
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jump_host: Option<String>,
}

impl ConnectionProfile {
    /// Creates a direct profile on the default port
    #[must_use]
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port: default_port(),
            user: None,
            identity_file: None,
            jump_host: None,
        }
    }

    /// Transport implied by the profile
    #[must_use]
    pub const fn transport(&self) -> TransportKind {
        if self.jump_host.is_some() {
            TransportKind::Bastion
        } else {
            TransportKind::Direct
        }
    }

    /// Identity file with `~` and variables expanded
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidProfile`] when a referenced variable is unset.
    pub fn expanded_identity_file(&self) -> ConfigResult<Option<PathBuf>> {
        self.identity_file
            .as_deref()
            .map(|raw| {
                shellexpand::full(raw)
                    .map(|p| PathBuf::from(p.into_owned()))
                    .map_err(|e| ConfigError::InvalidProfile {
                        name: self.name.clone(),
                        reason: e.to_string(),
                    })
            })
            .transpose()
    }

    /// Builds the SSH target of this profile
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidProfile`] when the host is empty or the
    /// identity path cannot be expanded.
    pub fn to_ssh_target(&self) -> ConfigResult<SshTarget> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::InvalidProfile {
                name: self.name.clone(),
                reason: "host is empty".to_string(),
            });
        }
        Ok(SshTarget {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            identity_file: self.expanded_identity_file()?,
            jump_host: self.jump_host.clone(),
        })
    }
}
