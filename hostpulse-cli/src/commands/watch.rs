//! Live polling command.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use hostpulse_core::config::{ConnectionProfile, Settings};
use hostpulse_core::monitoring::{
    ChannelPublisher, CommandExecutor, ConnectionTarget, PollingConfig, SshExecutor, StatsScheduler,
};

use crate::cli::SnapshotFormat;
use crate::error::CliError;
use crate::format::{snapshot_json, snapshot_line};
use crate::util::load_settings;

/// How often the watcher checks that the loop is still alive
const LIVENESS_CHECK: Duration = Duration::from_secs(1);

/// Parameters for the watch command
pub struct WatchParams<'a> {
    pub profile: Option<&'a str>,
    pub host: Option<&'a str>,
    pub user: Option<&'a str>,
    pub port: Option<u16>,
    pub identity: Option<&'a Path>,
    pub jump: Option<&'a str>,
    pub format: SnapshotFormat,
    pub count: Option<u64>,
    pub interval_ms: Option<u64>,
}

/// Watch command handler
pub fn cmd_watch(config_path: Option<&Path>, params: WatchParams<'_>) -> Result<(), CliError> {
    let settings = load_settings(config_path)?;
    if !settings.monitoring.enabled {
        return Err(CliError::Config(
            "Monitoring is disabled ([monitoring] enabled = false)".to_string(),
        ));
    }

    let (connection_id, profile) = resolve_profile(&settings, &params)?;

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::Connection(format!("Failed to create async runtime: {e}")))?;

    runtime.block_on(watch(&settings, connection_id, &profile, &params))
}

/// Picks the saved profile or builds an ad-hoc one from the flags
fn resolve_profile(
    settings: &Settings,
    params: &WatchParams<'_>,
) -> Result<(String, ConnectionProfile), CliError> {
    if let Some(host) = params.host {
        let profile = ConnectionProfile {
            port: params.port.unwrap_or(22),
            user: params.user.map(str::to_string),
            identity_file: params.identity.map(|p| p.display().to_string()),
            jump_host: params.jump.map(str::to_string),
            ..ConnectionProfile::new(host, host)
        };
        return Ok((format!("adhoc-{}", uuid::Uuid::new_v4()), profile));
    }

    let name = params
        .profile
        .ok_or_else(|| CliError::Config("Specify a profile name or --host".to_string()))?;
    settings
        .find_connection(name)
        .map(|p| (p.name.clone(), p.clone()))
        .ok_or_else(|| CliError::ConnectionNotFound(name.to_string()))
}

async fn watch(
    settings: &Settings,
    connection_id: String,
    profile: &ConnectionProfile,
    params: &WatchParams<'_>,
) -> Result<(), CliError> {
    let target = profile.to_ssh_target()?;

    let config = Arc::new(PollingConfig::from_settings(&settings.monitoring));
    if let Some(ms) = params.interval_ms {
        config.set_polling_interval_ms(ms);
    }

    let executor = Arc::new(SshExecutor::new());
    executor.register(connection_id.clone(), target.clone());

    let (publisher, mut events) = ChannelPublisher::new();
    let scheduler = StatsScheduler::new(
        config,
        Arc::clone(&executor) as Arc<dyn CommandExecutor>,
        Arc::new(publisher),
    );

    tracing::info!(
        connection_id = %connection_id,
        host = %target.host,
        transport = %target.transport(),
        "Watching host"
    );
    scheduler.activate(ConnectionTarget::new(
        connection_id.clone(),
        target.transport(),
        target.host.clone(),
    ));

    let mut printed = 0u64;
    let result = loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break Ok(()) };
                match params.format {
                    SnapshotFormat::Text => println!("{}", snapshot_line(&event)),
                    SnapshotFormat::Json => match snapshot_json(&event) {
                        Ok(json) => println!("{json}"),
                        Err(e) => break Err(CliError::Output(e.to_string())),
                    },
                }
                printed += 1;
                if params.count.is_some_and(|n| printed >= n) {
                    break Ok(());
                }
            }
            () = tokio::time::sleep(LIVENESS_CHECK) => {
                if scheduler.loop_state(&connection_id).is_none() {
                    break Err(CliError::Connection(format!(
                        "Session to {} closed",
                        target.host
                    )));
                }
            }
            _ = tokio::signal::ctrl_c() => break Ok(()),
        }
    };

    scheduler.shutdown();
    executor.close(&connection_id);
    result
}
