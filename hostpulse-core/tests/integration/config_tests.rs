//! Settings file handling through the public API

use hostpulse_core::config::{ConfigManager, ConnectionProfile, Settings};
use hostpulse_core::monitoring::{PollingConfig, TransportKind};
use hostpulse_core::{ConfigError, TracingConfig, TracingLevel};

fn manager() -> (tempfile::TempDir, ConfigManager) {
    let dir = tempfile::tempdir().expect("temp dir");
    let manager = ConfigManager::with_config_dir(dir.path().to_path_buf());
    (dir, manager)
}

#[test]
fn settings_drive_polling_and_logging() {
    let (_dir, manager) = manager();
    std::fs::write(
        manager.settings_path(),
        r#"
[monitoring]
interval_ms = 250

[logging]
level = "trace"

[[connections]]
name = "edge"
host = "192.168.1.20"
user = "root"
jump_host = "admin@gw.example:2222"
"#,
    )
    .unwrap();

    let settings = manager.load_settings().unwrap();
    let config = PollingConfig::from_settings(&settings.monitoring);
    assert_eq!(config.polling_interval_ms(), 1_000);

    let tracing = TracingConfig::from_settings(&settings.logging);
    assert_eq!(tracing.level, TracingLevel::Trace);

    let edge = settings.find_connection("edge").unwrap();
    assert_eq!(edge.transport(), TransportKind::Bastion);
    let target = edge.to_ssh_target().unwrap();
    assert_eq!(target.destination(), "root@192.168.1.20");
    let args = target.ssh_args("uptime");
    assert!(args.windows(2).any(|w| w[0] == "-J" && w[1] == "admin@gw.example:2222"));
}

#[test]
fn saved_profiles_survive_reload() {
    let (_dir, manager) = manager();
    let mut settings = Settings::default();
    settings.connections.push(ConnectionProfile {
        port: 2200,
        ..ConnectionProfile::new("db", "10.0.0.7")
    });
    manager.save_settings(&settings).unwrap();

    let reloaded = manager.load_settings().unwrap();
    assert_eq!(reloaded.connections[0].port, 2200);
    assert_eq!(reloaded.connections[0].transport(), TransportKind::Direct);
}

#[test]
fn wrong_field_type_is_reported_with_path() {
    let (_dir, manager) = manager();
    std::fs::write(manager.settings_path(), "[monitoring]\ninterval_ms = \"fast\"\n").unwrap();

    let err = manager.load_settings().unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("config.toml"));
}
