//! Shell commands issued to the monitored host

use super::metrics::TransportKind;

/// Primary IPv4 addresses, falling back from `hostname -I` to `ip` and
/// finally to an empty line so the `&&` chain never breaks on it.
macro_rules! ip_fallback_chain {
    () => {
        concat!(
            "(hostname -I 2>/dev/null",
            " || ip -o -4 addr show scope global 2>/dev/null",
            " | awk '{split($4,a,\"/\"); printf \"%s \", a[1]} END {print \"\"}'",
            " || echo '')",
        )
    };
}

/// Aggregate CPU counters
pub const CPU_COMMAND: &str = "grep 'cpu ' /proc/stat";

/// IP lookup shared by both transports
pub const IP_COMMAND: &str = ip_fallback_chain!();

/// Per-tick command of a direct session (run after [`CPU_COMMAND`]).
///
/// The IP list is the last line of the output.
pub const DIRECT_STATS_COMMAND: &str = concat!(
    "free -b && df -P && uptime && cat /proc/net/dev && ",
    ip_fallback_chain!(),
);

/// Identity probe of a direct session, run once per monitored connection
pub const IDENTITY_COMMAND: &str = "hostname && cat /etc/os-release 2>/dev/null";

/// Single combined command run through a bastion.
///
/// The hostname line must be directly followed by the IP list.
pub const BASTION_STATS_COMMAND: &str = concat!(
    "grep 'cpu ' /proc/stat && free -b && df -P && uptime && cat /proc/net/dev && hostname && ",
    ip_fallback_chain!(),
    " && cat /etc/os-release",
);

/// Commands issued on every tick, in execution order
#[must_use]
pub const fn tick_commands(kind: TransportKind) -> &'static [&'static str] {
    match kind {
        TransportKind::Direct => &[CPU_COMMAND, DIRECT_STATS_COMMAND],
        TransportKind::Bastion => &[BASTION_STATS_COMMAND],
    }
}
