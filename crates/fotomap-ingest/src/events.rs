//! Ingest event stream.
//!
//! Conversion completion is decoupled from any UI tree shape: the store
//! publishes events and consumers subscribe, instead of threading completion
//! callbacks through component layers.

use std::sync::Mutex;

use tokio::sync::mpsc;
use uuid::Uuid;

/// Events published by the photo store.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestEvent {
    RecordAdded { id: Uuid },
    RecordConverted { id: Uuid },
    RecordFailed { id: Uuid, error: String },
    RecordRemoved { id: Uuid },
    RecordRejected { name: String, reason: String },
    BatchLimited { rejected: usize, message: String },
    Cleared,
}

/// Fan-out bus over unbounded channels. Dead subscribers are pruned on the
/// next emit.
#[derive(Default)]
pub struct EventBus {
    senders: Mutex<Vec<mpsc::UnboundedSender<IngestEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<IngestEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(tx);
        rx
    }

    pub fn emit(&self, event: IngestEvent) {
        let mut senders = self.senders.lock().unwrap_or_else(|e| e.into_inner());
        senders.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribe_receives_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        let id = Uuid::new_v4();
        bus.emit(IngestEvent::RecordAdded { id });

        assert_eq!(rx.recv().await, Some(IngestEvent::RecordAdded { id }));
    }

    #[tokio::test]
    async fn test_multiple_subscribers_all_receive() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emit(IngestEvent::Cleared);

        assert_eq!(rx1.recv().await, Some(IngestEvent::Cleared));
        assert_eq!(rx2.recv().await, Some(IngestEvent::Cleared));
    }

    #[tokio::test]
    async fn test_dropped_subscriber_is_pruned() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        drop(rx);

        // pruned on emit; no panic, no backlog
        bus.emit(IngestEvent::Cleared);
        assert!(bus
            .senders
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty());
    }
}
