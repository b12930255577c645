//! Table parsers for well-delimited `df -P` and `/proc/net/dev` output

use crate::monitoring::metrics::{DiskEntry, NetworkSample};

/// Filesystems that never carry user data
const PSEUDO_FILESYSTEMS: &[&str] = &[
    "tmpfs",
    "devtmpfs",
    "udev",
    "overlay",
    "squashfs",
    "efivarfs",
];

/// Parses the rows of a `df -P` table (header line excluded).
///
/// Format: `Filesystem 1024-blocks Used Available Capacity Mounted on`.
/// Parsing stops at the first line that is not a table row, so trailing
/// output of other commands is ignored.
#[must_use]
pub fn parse_df_table(rows: &[&str]) -> Vec<DiskEntry> {
    let mut disks = Vec::new();

    for row in rows {
        let parts: Vec<&str> = row.split_whitespace().collect();
        if parts.len() < 6 {
            break;
        }
        let Some(used_percent) = parts[4]
            .strip_suffix('%')
            .and_then(|p| p.parse::<i64>().ok())
        else {
            break;
        };

        if PSEUDO_FILESYSTEMS.contains(&parts[0]) {
            continue;
        }

        disks.push(DiskEntry {
            filesystem: parts[5..].join(" "),
            used_percent,
        });
    }

    disks
}

/// Parses a `/proc/net/dev` dump starting at its first header line.
///
/// Sums received and transmitted bytes of every interface except `lo`.
/// Returns `None` when no interface row follows the header.
#[must_use]
pub fn parse_net_dev_table(lines: &[&str]) -> Option<NetworkSample> {
    let mut sample = NetworkSample::default();
    let mut rows = 0usize;

    // two header lines: "Inter-|   Receive ..." and " face |bytes ..."
    for line in lines.iter().skip(2) {
        let Some((iface, stats)) = line.split_once(':') else {
            break;
        };
        let iface = iface.trim();
        if iface.is_empty() || iface.contains(char::is_whitespace) {
            break;
        }

        // rx: bytes packets errs drop fifo frame compressed multicast
        // tx: bytes packets errs drop fifo colls carrier compressed
        let parts: Vec<&str> = stats.split_whitespace().collect();
        if parts.len() < 9 {
            break;
        }
        let (Ok(rx), Ok(tx)) = (parts[0].parse::<u64>(), parts[8].parse::<u64>()) else {
            break;
        };

        rows += 1;
        if iface == "lo" {
            continue;
        }
        sample.rx_bytes = sample.rx_bytes.saturating_add(rx);
        sample.tx_bytes = sample.tx_bytes.saturating_add(tx);
    }

    (rows > 0).then_some(sample)
}
