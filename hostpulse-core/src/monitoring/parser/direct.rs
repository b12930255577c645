//! Parser for output of a direct session

use super::tables::{parse_df_table, parse_net_dev_table};
use super::{
    DF_HEADER, IdentitySeed, NET_DEV_HEADER, RawStats, StatsParser, find_line_starting,
    parse_cpu_line, parse_memory, parse_uptime, pick_ip,
};
use crate::monitoring::metrics::TransportKind;

/// Parses the `cpu` line followed by the combined
/// `free -b && df -P && uptime && cat /proc/net/dev && hostname -I` output.
///
/// Hostname and distro are not part of the per-tick output; they come from
/// the identity seed.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectParser;

impl StatsParser for DirectParser {
    fn transport(&self) -> TransportKind {
        TransportKind::Direct
    }

    fn parse(&self, output: &str, seed: &IdentitySeed) -> RawStats {
        let lines: Vec<&str> = output.lines().collect();

        let disks = find_line_starting(&lines, DF_HEADER)
            .map(|idx| parse_df_table(&lines[idx + 1..]))
            .unwrap_or_default();

        let network = lines
            .iter()
            .position(|l| l.contains(NET_DEV_HEADER))
            .and_then(|idx| parse_net_dev_table(&lines[idx..]));

        // only the final line carries addresses; a blank one means none were found
        let ip = lines
            .last()
            .map_or_else(|| seed.host.clone(), |l| pick_ip(l, &seed.host));

        RawStats {
            cpu: parse_cpu_line(output),
            memory: parse_memory(output),
            disks,
            uptime: parse_uptime(output),
            network,
            hostname: seed.hostname.clone(),
            distro: seed.distro.clone(),
            ip,
        }
    }
}
