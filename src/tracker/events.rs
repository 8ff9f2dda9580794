//! Observer surface: the events a tracker publishes.

use tokio::sync::broadcast;

/// A notification published by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerEvent {
    /// `true` when the first request starts, `false` when the last one ends.
    Busy(bool),
    /// `true` on losing connectivity, `false` on regaining it.
    Offline(bool),
    /// Whole seconds left before deferred requests are replayed.
    Timer(u64),
}

/// Broadcast channel fan-out to any number of subscribers.
pub struct EventBus {
    tx: broadcast::Sender<TrackerEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.tx.subscribe()
    }

    /// Publish to current subscribers. Having none is not an error.
    pub fn emit(&self, event: TrackerEvent) {
        tracing::trace!(?event, subscribers = self.tx.receiver_count(), "Tracker event");
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
