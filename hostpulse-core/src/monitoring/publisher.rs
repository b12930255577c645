//! Hand-off of snapshots to the presentation layer

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::metrics::MetricsSnapshot;

/// Event channel prefix; the full name is `stats-update:<connection id>`
pub const STATS_CHANNEL_PREFIX: &str = "stats-update";

/// Returns the event channel name of a connection
#[must_use]
pub fn stats_channel(connection_id: &str) -> String {
    format!("{STATS_CHANNEL_PREFIX}:{connection_id}")
}

/// One published snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct StatsEvent {
    /// Event channel name (`stats-update:<connection id>`)
    pub channel: String,
    /// Connection the snapshot belongs to
    pub connection_id: String,
    /// When the snapshot was produced
    pub captured_at: DateTime<Utc>,
    /// The snapshot itself
    pub snapshot: MetricsSnapshot,
}

/// Receives every snapshot the scheduler produces
pub trait SnapshotPublisher: Send + Sync {
    /// Publishes the snapshot of one tick
    fn publish(&self, connection_id: &str, snapshot: MetricsSnapshot);
}

/// Forwards snapshots as [`StatsEvent`]s over a tokio channel
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    tx: mpsc::UnboundedSender<StatsEvent>,
}

impl ChannelPublisher {
    /// Creates a publisher and the receiving end of its channel
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StatsEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl SnapshotPublisher for ChannelPublisher {
    fn publish(&self, connection_id: &str, snapshot: MetricsSnapshot) {
        let event = StatsEvent {
            channel: stats_channel(connection_id),
            connection_id: connection_id.to_string(),
            captured_at: Utc::now(),
            snapshot,
        };
        // a dropped receiver means nobody renders snapshots anymore
        if self.tx.send(event).is_err() {
            tracing::trace!(connection_id, "Snapshot dropped, receiver closed");
        }
    }
}
