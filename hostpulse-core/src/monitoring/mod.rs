//! Remote host telemetry
//!
//! Collects CPU, memory, disk, network, uptime and identity information from
//! Linux hosts reached over SSH, either directly or through a bastion. Raw
//! command output is parsed into [`RawStats`], rates are derived against the
//! previous tick by a per-connection [`RateCalculator`], and the resulting
//! [`MetricsSnapshot`] is handed to a [`SnapshotPublisher`].
//!
//! Only one connection (the active one) is polled at any time; see
//! [`StatsScheduler`].
//!
//! The module has no UI code. Rendering happens wherever the
//! [`StatsEvent`]s of a [`ChannelPublisher`] are consumed.

pub mod commands;
mod distro;
mod exec;
mod metrics;
pub mod parser;
mod publisher;
mod rates;
mod scheduler;
mod settings;

pub use distro::{canonical_id, normalize_distro};
pub use exec::{CommandExecutor, ExecError, SshExecutor, SshTarget};
pub use metrics::{
    BASTION_HOSTNAME, CPU_LOAD_NEUTRAL, CpuSample, DiskEntry, DistroInfo, MemoryUsage,
    MetricsSnapshot, NetworkRates, NetworkSample, TransportKind, UPTIME_ERROR, UPTIME_UNAVAILABLE,
};
pub use parser::{IdentitySeed, RawStats, StatsParser, parser_for};
pub use publisher::{ChannelPublisher, STATS_CHANNEL_PREFIX, SnapshotPublisher, StatsEvent, stats_channel};
pub use rates::{RateCalculator, cpu_load_between, format_load};
pub use scheduler::{ConnectionTarget, LoopState, StatsScheduler};
pub use settings::{
    BASTION_INTERVAL_MS, BASTION_RETRY_INTERVAL_MS, DEFAULT_INTERVAL_MS, MAX_INTERVAL_MS,
    MIN_INTERVAL_MS, MonitoringSettings, PollingConfig, clamp_interval_ms,
};
