//! `hostpulse` Core Library
//!
//! Agentless telemetry for Linux hosts reached over SSH. The crate polls the
//! active connection with a handful of shell commands, parses their text
//! output and publishes normalized snapshots.
//!
//! # Crate Structure
//!
//! - [`monitoring`] - Parsers, distro normalizer, rate calculator, polling scheduler, publisher
//! - [`config`] - Settings file and saved connection profiles
//! - [`tracing`] - Subscriber setup and standard span names
//! - [`error`] - Error types

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod monitoring;
pub mod tracing;

pub use config::{ConfigManager, ConnectionProfile, LoggingSettings, Settings};
pub use error::{ConfigError, ConfigResult, HostpulseError};
pub use monitoring::{
    ChannelPublisher, CommandExecutor, ConnectionTarget, ExecError, LoopState, MetricsSnapshot,
    MonitoringSettings, PollingConfig, RateCalculator, SnapshotPublisher, SshExecutor, SshTarget,
    StatsEvent, StatsScheduler, TransportKind,
};
pub use crate::tracing::{TracingConfig, TracingError, TracingLevel, TracingOutput, init_tracing};
