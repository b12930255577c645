//! Delta-based CPU load and network throughput
//!
//! A [`RateCalculator`] keeps the previous CPU and network samples of one
//! connection. The first sample only establishes the baseline; rates are
//! reported from the second sample on.

use std::time::Instant;

use super::metrics::{CPU_LOAD_NEUTRAL, CpuSample, NetworkRates, NetworkSample};

/// Computes instantaneous metrics from two consecutive samples
#[derive(Debug, Clone, Default)]
pub struct RateCalculator {
    cpu: Option<CpuSample>,
    net: Option<(NetworkSample, Instant)>,
}

/// CPU load in percent between two samples, clamped to `0.0..=100.0`
#[must_use]
pub fn cpu_load_between(prev: &CpuSample, current: &CpuSample) -> f64 {
    let total_diff = current.total().saturating_sub(prev.total());
    if total_diff == 0 {
        return 0.0;
    }
    let idle_diff = current.idle_total().saturating_sub(prev.idle_total());
    let busy = total_diff.saturating_sub(idle_diff);
    (busy as f64 * 100.0 / total_diff as f64).clamp(0.0, 100.0)
}

/// Formats a load value with exactly two decimals
#[must_use]
pub fn format_load(load: f64) -> String {
    format!("{load:.2}")
}

impl RateCalculator {
    /// Creates a calculator with no previous samples
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cpu: None,
            net: None,
        }
    }

    /// Returns the CPU load as a two-decimal string.
    ///
    /// `None` (unusable cpu line) yields `"0.00"` and leaves the stored
    /// baseline untouched. A present sample always becomes the new baseline.
    pub fn cpu_load(&mut self, current: Option<CpuSample>) -> String {
        let Some(current) = current else {
            return CPU_LOAD_NEUTRAL.to_string();
        };

        let load = self
            .cpu
            .replace(current)
            .map_or(0.0, |prev| cpu_load_between(&prev, &current));
        format_load(load)
    }

    /// Returns rx/tx bytes per second since the previous sample.
    ///
    /// Counter resets and a zero elapsed time yield `0`, never a negative
    /// rate.
    pub fn network_rates(&mut self, current: Option<NetworkSample>, now: Instant) -> NetworkRates {
        let Some(current) = current else {
            return NetworkRates::default();
        };

        match self.net.replace((current, now)) {
            Some((prev, prev_at)) => {
                let elapsed = now.saturating_duration_since(prev_at).as_secs_f64();
                if elapsed > 0.0 {
                    let rate = |now_bytes: u64, prev_bytes: u64| {
                        ((now_bytes as f64 - prev_bytes as f64) / elapsed).max(0.0)
                    };
                    NetworkRates {
                        rx_bytes_per_sec: rate(current.rx_bytes, prev.rx_bytes),
                        tx_bytes_per_sec: rate(current.tx_bytes, prev.tx_bytes),
                    }
                } else {
                    NetworkRates::default()
                }
            }
            None => NetworkRates::default(),
        }
    }

    /// Whether a CPU baseline exists
    #[must_use]
    pub const fn has_cpu_baseline(&self) -> bool {
        self.cpu.is_some()
    }

    /// Whether a network baseline exists
    #[must_use]
    pub const fn has_network_baseline(&self) -> bool {
        self.net.is_some()
    }

    /// Resets the calculator state (e.g. on reconnect)
    pub fn reset(&mut self) {
        self.cpu = None;
        self.net = None;
    }
}
