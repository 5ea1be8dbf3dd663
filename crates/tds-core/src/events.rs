//! Session event system for connection, monitoring, and reading notifications.
//!
//! Every state change of a [`MonitoringSession`](crate::MonitoringSession) is
//! published twice: as a [`SessionEvent`] on a broadcast channel, and as a
//! fresh [`SessionSnapshot`] on a watch channel for consumers that only need
//! the latest state.

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};

use tds_types::{DeviceState, Reading, SessionStatus};

use crate::alerts::Alert;

/// Events emitted by a monitoring session.
///
/// All events are serializable for logging and IPC.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new event types
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum SessionEvent {
    /// Connected (or reconnected) to a meter.
    Connected { port: String, baud_rate: u32 },
    /// Disconnected from the meter.
    Disconnected { port: Option<String> },
    /// Periodic sampling started.
    MonitoringStarted { interval_ms: u64 },
    /// Periodic sampling stopped.
    MonitoringStopped,
    /// A reading was recorded.
    Reading { reading: Reading },
    /// History was cleared.
    HistoryCleared { removed: usize },
    /// A reading crossed an alert threshold.
    Alert { alert: Alert },
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Connection state.
    pub device: DeviceState,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Readings, most-recent-first.
    pub readings: Vec<Reading>,
}

impl SessionSnapshot {
    /// Whether the session is sampling.
    pub fn is_monitoring(&self) -> bool {
        self.status == SessionStatus::Monitoring
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            device: DeviceState::default(),
            status: SessionStatus::Disconnected,
            readings: Vec::new(),
        }
    }
}

/// Sender for session events.
pub type EventSender = broadcast::Sender<SessionEvent>;

/// Receiver for session events.
pub type EventReceiver = broadcast::Receiver<SessionEvent>;

/// Receiver for session snapshots.
pub type SnapshotReceiver = watch::Receiver<SessionSnapshot>;

/// Event dispatcher for sending events to multiple receivers.
#[derive(Debug)]
pub struct EventDispatcher {
    sender: EventSender,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl EventDispatcher {
    /// Create a new event dispatcher.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        let (snapshots, _) = watch::channel(SessionSnapshot::default());
        Self { sender, snapshots }
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Subscribe to snapshots.
    pub fn subscribe_snapshots(&self) -> SnapshotReceiver {
        self.snapshots.subscribe()
    }

    /// Send an event.
    pub fn send(&self, event: SessionEvent) {
        // Ignore error if no receivers
        let _ = self.sender.send(event);
    }

    /// Publish a new snapshot, replacing the previous one.
    pub fn publish(&self, snapshot: SessionSnapshot) {
        self.snapshots.send_replace(snapshot);
    }

    /// Borrow the most recently published snapshot.
    ///
    /// The borrow holds a read lock on the watch channel; keep it short.
    pub fn latest(&self) -> watch::Ref<'_, SessionSnapshot> {
        self.snapshots.borrow()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(100)
    }
}
