//! Parsers for raw remote command output
//!
//! Both transports run the same family of commands (`/proc/stat`, `free -b`,
//! `df -P`, `uptime`, `/proc/net/dev`, host identity) but their output has to
//! be recovered differently:
//!
//! - [`DirectParser`] trusts the section headers and hands whole tables to
//!   the table parsers in [`tables`].
//! - [`BastionParser`] gets output with no reliable delimiters and locates
//!   each value by its shape.
//!
//! Parsing never fails: a missing or malformed section yields the neutral
//! value for that field only.

mod bastion;
mod direct;
pub mod tables;

pub use bastion::BastionParser;
pub use direct::DirectParser;

use super::metrics::{
    CpuSample, DiskEntry, DistroInfo, MemoryUsage, MetricsSnapshot, NetworkRates, NetworkSample,
    TransportKind, UPTIME_UNAVAILABLE,
};

/// Loopback addresses never reported as the host IP
const LOOPBACK_ADDRS: &[&str] = &["127.0.0.1", "::1"];

/// Header fragment of `/proc/net/dev`
pub(crate) const NET_DEV_HEADER: &str = "Inter-|   Receive";

/// Header of `df -P` output
pub(crate) const DF_HEADER: &str = "Filesystem";

/// Identity values known before parsing (configuration and previous polls)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdentitySeed {
    /// Configured host string, used when no IP can be recovered
    pub host: String,
    /// Last known hostname
    pub hostname: String,
    /// Last confirmed distribution identity
    pub distro: DistroInfo,
}

impl IdentitySeed {
    /// Creates a seed for a freshly configured host
    #[must_use]
    pub fn for_host(host: impl Into<String>) -> Self {
        let host = host.into();
        Self {
            hostname: host.clone(),
            host,
            distro: DistroInfo::default(),
        }
    }
}

/// Structured values recovered from one poll, before rate computation
#[derive(Debug, Clone, PartialEq)]
pub struct RawStats {
    /// Aggregate CPU counters, `None` when the cpu line was unusable
    pub cpu: Option<CpuSample>,
    /// Memory usage
    pub memory: MemoryUsage,
    /// Disk usage per mount point
    pub disks: Vec<DiskEntry>,
    /// Free-text uptime or `"N/A"`
    pub uptime: String,
    /// Network byte totals, `None` when the table was unusable
    pub network: Option<NetworkSample>,
    /// Remote hostname
    pub hostname: String,
    /// Distribution identity
    pub distro: DistroInfo,
    /// Primary IP address
    pub ip: String,
}

impl RawStats {
    /// Combines the parsed values with the rates of this tick
    #[must_use]
    pub fn into_snapshot(self, cpu_load_percent: String, network: NetworkRates) -> MetricsSnapshot {
        MetricsSnapshot {
            cpu_load_percent,
            memory: self.memory,
            disks: self.disks,
            uptime: self.uptime,
            network,
            hostname: self.hostname,
            distro_id: self.distro.id,
            distro_version_id: self.distro.version_id,
            ip: self.ip,
        }
    }
}

/// A strategy turning raw command output into [`RawStats`]
pub trait StatsParser: Send + Sync {
    /// Transport whose output this parser understands
    fn transport(&self) -> TransportKind;

    /// Parses the complete output of one poll
    fn parse(&self, output: &str, seed: &IdentitySeed) -> RawStats;
}

/// Returns the parser strategy for a transport
#[must_use]
pub fn parser_for(kind: TransportKind) -> &'static dyn StatsParser {
    match kind {
        TransportKind::Direct => &DirectParser,
        TransportKind::Bastion => &BastionParser,
    }
}

/// Parses the aggregate `cpu ` line.
///
/// Format: `cpu  user nice system idle iowait irq softirq steal [guest ...]`.
/// Fewer than eight numeric counters make the line unusable.
pub(crate) fn parse_cpu_line(output: &str) -> Option<CpuSample> {
    let line = output
        .lines()
        .map(str::trim_start)
        .find(|l| l.starts_with("cpu "))?;

    let mut fields = [0u64; 8];
    let mut values = line.split_whitespace().skip(1);
    for slot in &mut fields {
        *slot = values.next()?.parse().ok()?;
    }
    Some(CpuSample::from_fields(fields))
}

/// Parses the `Mem:` line of `free -b`: total and used bytes
pub(crate) fn parse_memory(output: &str) -> MemoryUsage {
    let Some(line) = output
        .lines()
        .map(str::trim_start)
        .find(|l| l.starts_with("Mem:"))
    else {
        return MemoryUsage::default();
    };

    let parts: Vec<&str> = line.split_whitespace().collect();
    let field = |i: usize| -> u64 {
        parts
            .get(i)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    };
    MemoryUsage {
        total: field(1),
        used: field(2),
    }
}

/// Extracts the duration from an `uptime` line.
///
/// ` 10:02:11 up 12 days,  3:04,  2 users, ...` yields `12 days`.
pub(crate) fn parse_uptime(output: &str) -> String {
    output
        .lines()
        .find(|l| l.contains(" up "))
        .and_then(|line| {
            let start = line.find(" up ")? + " up ".len();
            let rest = &line[start..];
            let end = rest.find(',')?;
            Some(rest[..end].trim().to_string())
        })
        .unwrap_or_else(|| UPTIME_UNAVAILABLE.to_string())
}

/// Picks the reported IP from a whitespace separated address list.
///
/// Loopback addresses are dropped and the last remaining candidate wins;
/// with no candidate the configured host is returned.
pub(crate) fn pick_ip(line: &str, fallback_host: &str) -> String {
    line.split_whitespace()
        .filter(|addr| !LOOPBACK_ADDRS.contains(addr))
        .next_back()
        .map_or_else(|| fallback_host.to_string(), str::to_string)
}

/// Index of the first line that starts with `prefix` after leading whitespace
pub(crate) fn find_line_starting(lines: &[&str], prefix: &str) -> Option<usize> {
    lines
        .iter()
        .position(|l| l.trim_start().starts_with(prefix))
}
