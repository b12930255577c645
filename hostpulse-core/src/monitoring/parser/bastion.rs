//! Heuristic parser for output relayed by a bastion host
//!
//! The jump host concatenates the output of every command without markers,
//! so each value is found by its content. Two heuristics here are known to
//! be fragile: the hostname is the first line that looks like a bare
//! identifier, and `/proc/net/dev` is assumed to list exactly two
//! interfaces.

use super::{
    DF_HEADER, IdentitySeed, NET_DEV_HEADER, RawStats, StatsParser, find_line_starting,
    parse_cpu_line, parse_memory, parse_uptime, pick_ip,
};
use crate::monitoring::distro::normalize_distro;
use crate::monitoring::metrics::{BASTION_HOSTNAME, DiskEntry, NetworkSample, TransportKind};

/// Mount prefixes that carry no actionable signal
const EXCLUDED_MOUNT_PREFIXES: &[&str] = &["/sys", "/opt", "/run", "/var", "/dev"];

/// Mount excluded by exact match
const EXCLUDED_MOUNT: &str = "/boot/efi";

/// Substrings that disqualify a line from being the hostname
const NON_HOSTNAME_MARKERS: &[&str] = &["cpu", "Mem", "total", "Filesystem"];

/// Characters a hostname line never contains
const NON_HOSTNAME_CHARS: &[char] = &['=', ':', '/', '$'];

/// Upper bound (exclusive) on hostname length
const MAX_HOSTNAME_LEN: usize = 50;

/// Parses the single combined command run through a bastion
#[derive(Debug, Clone, Copy, Default)]
pub struct BastionParser;

impl StatsParser for BastionParser {
    fn transport(&self) -> TransportKind {
        TransportKind::Bastion
    }

    fn parse(&self, output: &str, seed: &IdentitySeed) -> RawStats {
        let lines: Vec<&str> = output.lines().collect();
        let (hostname, ip) = parse_identity(&lines, &seed.host);

        RawStats {
            cpu: parse_cpu_line(output),
            memory: parse_memory(output),
            disks: parse_disks(&lines),
            uptime: parse_uptime(output),
            network: parse_network(&lines),
            hostname,
            distro: normalize_distro(output, &seed.distro),
            ip,
        }
    }
}

fn is_excluded_mount(path: &str) -> bool {
    path == EXCLUDED_MOUNT
        || EXCLUDED_MOUNT_PREFIXES
            .iter()
            .any(|prefix| path.starts_with(prefix))
}

/// Every non-blank line after the `df` header is a candidate row:
/// second-to-last token is the used percent, last token the mount path.
fn parse_disks(lines: &[&str]) -> Vec<DiskEntry> {
    let Some(header) = find_line_starting(lines, DF_HEADER) else {
        return Vec::new();
    };

    lines[header + 1..]
        .iter()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            let [.., percent, path] = parts.as_slice() else {
                return None;
            };
            if !path.starts_with('/') || is_excluded_mount(path) {
                return None;
            }
            let used_percent = percent.trim_end_matches('%').parse::<i64>().ok()?;
            Some(DiskEntry {
                filesystem: (*path).to_string(),
                used_percent,
            })
        })
        .collect()
}

/// Sums rx (field 1) and tx (field 9) of the two rows after the column header
fn parse_network(lines: &[&str]) -> Option<NetworkSample> {
    let header = lines.iter().position(|l| l.contains(NET_DEV_HEADER))?;

    let mut sample = NetworkSample::default();
    for offset in [2, 3] {
        let parts: Vec<&str> = lines.get(header + offset)?.split_whitespace().collect();
        let rx: u64 = parts.get(1)?.parse().ok()?;
        let tx: u64 = parts.get(9)?.parse().ok()?;
        sample.rx_bytes = sample.rx_bytes.saturating_add(rx);
        sample.tx_bytes = sample.tx_bytes.saturating_add(tx);
    }
    Some(sample)
}

fn looks_like_hostname(line: &str) -> bool {
    let len = line.chars().count();
    (1..MAX_HOSTNAME_LEN).contains(&len)
        && !line.contains(NON_HOSTNAME_CHARS)
        && !NON_HOSTNAME_MARKERS.iter().any(|m| line.contains(m))
}

/// Finds the hostname line and reads the IP list from the line after it
fn parse_identity(lines: &[&str], fallback_host: &str) -> (String, String) {
    let Some(idx) = lines.iter().position(|l| looks_like_hostname(l.trim())) else {
        return (BASTION_HOSTNAME.to_string(), fallback_host.to_string());
    };

    let hostname = lines[idx].trim().to_string();
    let ip = lines
        .get(idx + 1)
        .map_or_else(|| fallback_host.to_string(), |l| pick_ip(l, fallback_host));
    (hostname, ip)
}
