//! Polling settings for remote host monitoring
//!
//! `MonitoringSettings` is the persisted form (stored in `config.toml` under
//! `[monitoring]`). `PollingConfig` is the live, shared configuration the
//! scheduler consults on every tick: the active connection and the generic
//! polling interval.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lower bound of the generic polling interval
pub const MIN_INTERVAL_MS: u64 = 1_000;

/// Upper bound of the generic polling interval
pub const MAX_INTERVAL_MS: u64 = 20_000;

/// Default generic polling interval
pub const DEFAULT_INTERVAL_MS: u64 = 3_000;

/// Bastion loop cadence after a successful poll
pub const BASTION_INTERVAL_MS: u64 = 2_000;

/// Bastion loop cadence after a failed poll
pub const BASTION_RETRY_INTERVAL_MS: u64 = 5_000;

/// Clamps an interval to `[MIN_INTERVAL_MS, MAX_INTERVAL_MS]`
#[must_use]
pub const fn clamp_interval_ms(ms: u64) -> u64 {
    if ms < MIN_INTERVAL_MS {
        MIN_INTERVAL_MS
    } else if ms > MAX_INTERVAL_MS {
        MAX_INTERVAL_MS
    } else {
        ms
    }
}

/// Persisted monitoring settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringSettings {
    /// Whether monitoring is enabled (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Generic polling interval in milliseconds (1000–20000, default: 3000)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

const fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL_MS
}

const fn default_true() -> bool {
    true
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: default_interval_ms(),
        }
    }
}

impl MonitoringSettings {
    /// Returns the interval clamped to the valid range
    #[must_use]
    pub const fn effective_interval_ms(&self) -> u64 {
        clamp_interval_ms(self.interval_ms)
    }
}

/// Shared, mutable polling configuration.
///
/// Passed to the scheduler as `Arc<PollingConfig>` so independent schedulers
/// (e.g. in tests) never share state.
#[derive(Debug)]
pub struct PollingConfig {
    active: RwLock<Option<String>>,
    interval_ms: AtomicU64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PollingConfig {
    /// Creates a configuration with no active connection and the default interval
    #[must_use]
    pub const fn new() -> Self {
        Self {
            active: RwLock::new(None),
            interval_ms: AtomicU64::new(DEFAULT_INTERVAL_MS),
        }
    }

    /// Creates a configuration from persisted settings
    #[must_use]
    pub fn from_settings(settings: &MonitoringSettings) -> Self {
        let config = Self::new();
        config.set_polling_interval_ms(settings.interval_ms);
        config
    }

    // the guarded value is a plain id, valid even after a panicking writer
    fn active_read(&self) -> RwLockReadGuard<'_, Option<String>> {
        self.active.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn active_write(&self) -> RwLockWriteGuard<'_, Option<String>> {
        self.active.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes `id` the only connection allowed to keep polling
    pub fn set_active_connection(&self, id: impl Into<String>) {
        let id = id.into();
        tracing::debug!(connection_id = %id, "Active connection changed");
        *self.active_write() = Some(id);
    }

    /// Clears the active connection; every loop stops on its next check
    pub fn clear_active_connection(&self) {
        *self.active_write() = None;
    }

    /// Returns the active connection id
    #[must_use]
    pub fn active_connection(&self) -> Option<String> {
        self.active_read().clone()
    }

    /// Whether `id` is the active connection
    #[must_use]
    pub fn is_active(&self, id: &str) -> bool {
        self.active_read().as_deref() == Some(id)
    }

    /// Stores the generic polling interval, clamped, and returns the stored value
    pub fn set_polling_interval_ms(&self, ms: u64) -> u64 {
        let clamped = clamp_interval_ms(ms);
        if clamped != ms {
            tracing::debug!(requested = ms, stored = clamped, "Polling interval clamped");
        }
        self.interval_ms.store(clamped, Ordering::Relaxed);
        clamped
    }

    /// Returns the generic polling interval in milliseconds
    #[must_use]
    pub fn polling_interval_ms(&self) -> u64 {
        self.interval_ms.load(Ordering::Relaxed)
    }

    /// Returns the generic polling interval
    #[must_use]
    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.polling_interval_ms())
    }
}
