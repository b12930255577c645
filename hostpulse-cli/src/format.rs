//! Rendering of snapshots for the terminal

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use hostpulse_core::monitoring::{MetricsSnapshot, StatsEvent};
use serde::Serialize;

const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];

/// Formats a byte count with a binary unit, one decimal above bytes
pub fn format_bytes(bytes: f64) -> String {
    let mut value = bytes.max(0.0);
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{value:.0} {}", UNITS[0])
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// One line per snapshot:
/// `time host (ip) distro | cpu | mem | up | rx/tx | disks`
pub fn snapshot_line(event: &StatsEvent) -> String {
    let s = &event.snapshot;
    let mut line = format!(
        "{} {} ({}) {} {}",
        event.captured_at.format("%H:%M:%S"),
        s.hostname,
        s.ip,
        s.distro_id,
        s.distro_version_id
    );
    let _ = write!(
        line,
        " | cpu {}% | mem {} / {} | up {} | rx {}/s tx {}/s",
        s.cpu_load_percent,
        format_bytes(s.memory.used as f64),
        format_bytes(s.memory.total as f64),
        s.uptime,
        format_bytes(s.network.rx_bytes_per_sec),
        format_bytes(s.network.tx_bytes_per_sec),
    );
    if !s.disks.is_empty() {
        line.push_str(" |");
        for disk in &s.disks {
            let _ = write!(line, " {} {}%", disk.filesystem, disk.used_percent);
        }
    }
    line
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventLine<'a> {
    channel: &'a str,
    connection_id: &'a str,
    captured_at: DateTime<Utc>,
    snapshot: &'a MetricsSnapshot,
}

/// A snapshot event as a single JSON line
pub fn snapshot_json(event: &StatsEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(&EventLine {
        channel: &event.channel,
        connection_id: &event.connection_id,
        captured_at: event.captured_at,
        snapshot: &event.snapshot,
    })
}
