//! Data models for remote host telemetry
//!
//! Raw samples (`CpuSample`, `NetworkSample`) are the counters read from the
//! remote host; `MetricsSnapshot` is the normalized value handed to the
//! presentation layer.

use serde::{Deserialize, Serialize};

/// Hostname reported when the Bastion output carries no recognizable hostname
pub const BASTION_HOSTNAME: &str = "Bastión";

/// Uptime placeholder when the `uptime` line is missing
pub const UPTIME_UNAVAILABLE: &str = "N/A";

/// Uptime placeholder used in fallback snapshots after an exec failure
pub const UPTIME_ERROR: &str = "Error";

/// Neutral CPU load value
pub const CPU_LOAD_NEUTRAL: &str = "0.00";

/// How commands reach the remote host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Session established straight to the target host
    #[default]
    Direct,
    /// Session proxied through a jump host
    Bastion,
}

impl TransportKind {
    /// Returns the lowercase name used in logs and on the command line
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Bastion => "bastion",
        }
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "bastion" | "jump" => Ok(Self::Bastion),
            other => Err(format!("unknown transport: {other}")),
        }
    }
}

/// Raw CPU counters from the aggregate `/proc/stat` line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuSample {
    /// Total user time (jiffies)
    pub user: u64,
    /// Total nice time (jiffies)
    pub nice: u64,
    /// Total system time (jiffies)
    pub system: u64,
    /// Total idle time (jiffies)
    pub idle: u64,
    /// Total iowait time (jiffies)
    pub iowait: u64,
    /// Total irq time (jiffies)
    pub irq: u64,
    /// Total softirq time (jiffies)
    pub softirq: u64,
    /// Total steal time (jiffies)
    pub steal: u64,
}

impl CpuSample {
    /// Builds a sample from the eight counters in `/proc/stat` order
    #[must_use]
    pub const fn from_fields(f: [u64; 8]) -> Self {
        Self {
            user: f[0],
            nice: f[1],
            system: f[2],
            idle: f[3],
            iowait: f[4],
            irq: f[5],
            softirq: f[6],
            steal: f[7],
        }
    }

    /// Total jiffies across all states, widened so eight full counters fit
    #[must_use]
    pub fn total(&self) -> u128 {
        [
            self.user,
            self.nice,
            self.system,
            self.idle,
            self.iowait,
            self.irq,
            self.softirq,
            self.steal,
        ]
        .into_iter()
        .map(u128::from)
        .sum()
    }

    /// Total idle jiffies (idle + iowait)
    #[must_use]
    pub fn idle_total(&self) -> u128 {
        u128::from(self.idle) + u128::from(self.iowait)
    }
}

/// Aggregate network byte counters at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetworkSample {
    /// Total received bytes
    pub rx_bytes: u64,
    /// Total transmitted bytes
    pub tx_bytes: u64,
}

/// Memory usage in bytes, as reported by `free -b`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemoryUsage {
    /// Total physical memory (bytes)
    pub total: u64,
    /// Used memory (bytes)
    pub used: u64,
}

/// Usage of a single mount point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskEntry {
    /// Mount point the usage belongs to
    pub filesystem: String,
    /// Used capacity in percent
    pub used_percent: i64,
}

/// Network throughput (bytes per second)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRates {
    /// Receive rate in bytes per second
    pub rx_bytes_per_sec: f64,
    /// Transmit rate in bytes per second
    pub tx_bytes_per_sec: f64,
}

/// Distribution identity from `/etc/os-release`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DistroInfo {
    /// Canonical distribution id (`rhel`, `ubuntu`, ...)
    pub id: String,
    /// `VERSION_ID` as reported, empty when absent
    pub version_id: String,
}

impl DistroInfo {
    /// Creates a distro identity
    #[must_use]
    pub fn new(id: impl Into<String>, version_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version_id: version_id.into(),
        }
    }
}

/// One normalized telemetry result for one connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// CPU load with exactly two decimals
    pub cpu_load_percent: String,
    /// Memory usage
    pub memory: MemoryUsage,
    /// Disk usage per mount point
    pub disks: Vec<DiskEntry>,
    /// Free-text uptime, `"N/A"` or `"Error"`
    pub uptime: String,
    /// Network throughput
    pub network: NetworkRates,
    /// Remote hostname
    pub hostname: String,
    /// Canonical distribution id
    pub distro_id: String,
    /// Distribution version
    pub distro_version_id: String,
    /// Primary IP address
    pub ip: String,
}

impl MetricsSnapshot {
    /// Snapshot published by the Bastion loop when the command could not run
    #[must_use]
    pub fn bastion_fallback(host: &str, distro: &DistroInfo) -> Self {
        Self {
            cpu_load_percent: CPU_LOAD_NEUTRAL.to_string(),
            memory: MemoryUsage::default(),
            disks: Vec::new(),
            uptime: UPTIME_ERROR.to_string(),
            network: NetworkRates::default(),
            hostname: BASTION_HOSTNAME.to_string(),
            distro_id: distro.id.clone(),
            distro_version_id: distro.version_id.clone(),
            ip: host.to_string(),
        }
    }
}
