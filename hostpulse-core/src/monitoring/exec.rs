//! Command execution capability
//!
//! The scheduler only issues commands against an already-open session; it
//! never sets one up. [`CommandExecutor`] is that boundary. [`SshExecutor`]
//! implements it with a separate `ssh` process per command (with `-J` for
//! connections behind a bastion), so it never interferes with the user's
//! interactive shell.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::process::Command;

use super::metrics::TransportKind;

/// SSH connect timeout passed to `ssh -o ConnectTimeout`
const SSH_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Errors returned by a [`CommandExecutor`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecError {
    /// The command ran but failed
    #[error("Remote command failed: {0}")]
    Failed(String),
    /// The command produced no output
    #[error("Remote command returned no output")]
    EmptyOutput,
    /// The local helper process could not be started
    #[error("Failed to spawn command: {0}")]
    Spawn(String),
    /// The underlying session is closed; monitoring must stop
    #[error("Transport closed for connection {0}")]
    TransportClosed(String),
}

impl ExecError {
    /// Whether the error means the connection is gone for good
    #[must_use]
    pub const fn is_transport_gone(&self) -> bool {
        matches!(self, Self::TransportClosed(_))
    }
}

/// Runs commands against an open session of a connection
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Executes `command` and returns its stdout
    async fn exec(&self, connection_id: &str, command: &str) -> Result<String, ExecError>;

    /// Whether the session of `connection_id` is still usable
    fn is_open(&self, _connection_id: &str) -> bool {
        true
    }
}

/// Where and how to reach a monitored host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    /// Remote hostname or IP
    pub host: String,
    /// SSH port
    pub port: u16,
    /// Optional SSH username
    pub user: Option<String>,
    /// Optional path to an SSH private key
    pub identity_file: Option<PathBuf>,
    /// Optional jump host (`[user@]host[:port]`)
    pub jump_host: Option<String>,
}

impl SshTarget {
    /// Creates a target on the default port
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            user: None,
            identity_file: None,
            jump_host: None,
        }
    }

    /// Transport implied by the target
    #[must_use]
    pub const fn transport(&self) -> TransportKind {
        if self.jump_host.is_some() {
            TransportKind::Bastion
        } else {
            TransportKind::Direct
        }
    }

    /// `user@host` or `host`
    #[must_use]
    pub fn destination(&self) -> String {
        self.user
            .as_ref()
            .map_or_else(|| self.host.clone(), |user| format!("{user}@{}", self.host))
    }

    /// Arguments passed to `ssh` to run `command` on this target
    #[must_use]
    pub fn ssh_args(&self, command: &str) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={SSH_CONNECT_TIMEOUT_SECS}"),
        ];

        if self.port != 22 {
            args.push("-p".to_string());
            args.push(self.port.to_string());
        }
        if let Some(ref key) = self.identity_file {
            args.push("-i".to_string());
            args.push(key.display().to_string());
        }
        if let Some(ref jump) = self.jump_host {
            args.push("-J".to_string());
            args.push(jump.clone());
        }

        args.push(self.destination());
        args.push(command.to_string());
        args
    }
}

#[derive(Debug)]
struct TargetEntry {
    target: SshTarget,
    open: bool,
}

/// Executes commands through the system `ssh` client
#[derive(Debug, Default)]
pub struct SshExecutor {
    targets: Mutex<HashMap<String, TargetEntry>>,
}

impl SshExecutor {
    /// Creates an executor with no registered targets
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the target of a connection
    pub fn register(&self, connection_id: impl Into<String>, target: SshTarget) {
        if let Ok(mut targets) = self.targets.lock() {
            targets.insert(connection_id.into(), TargetEntry { target, open: true });
        }
    }

    /// Marks the session of a connection as closed
    pub fn close(&self, connection_id: &str) {
        if let Ok(mut targets) = self.targets.lock()
            && let Some(entry) = targets.get_mut(connection_id)
        {
            entry.open = false;
        }
    }

    fn target(&self, connection_id: &str) -> Option<SshTarget> {
        let targets = self.targets.lock().ok()?;
        targets
            .get(connection_id)
            .filter(|entry| entry.open)
            .map(|entry| entry.target.clone())
    }
}

#[async_trait]
impl CommandExecutor for SshExecutor {
    async fn exec(&self, connection_id: &str, command: &str) -> Result<String, ExecError> {
        let target = self
            .target(connection_id)
            .ok_or_else(|| ExecError::TransportClosed(connection_id.to_string()))?;

        tracing::trace!(
            connection_id,
            host = %target.host,
            transport = %target.transport(),
            "Running monitoring command"
        );

        let output = Command::new("ssh")
            .args(target.ssh_args(command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ExecError::Spawn(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExecError::Failed(format!(
                "exit {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if stdout.trim().is_empty() {
            return Err(ExecError::EmptyOutput);
        }
        Ok(stdout)
    }

    fn is_open(&self, connection_id: &str) -> bool {
        self.targets
            .lock()
            .is_ok_and(|targets| targets.get(connection_id).is_some_and(|e| e.open))
    }
}
