//! Typed notifications for observers (UI, logs, tests).
//!
//! One broadcast channel carries every event. Components hold a cloned
//! [`EventBus`]; emitting with no subscribers is a no-op, and slow
//! subscribers lag rather than block the sender.

use tokio::sync::broadcast;

use crate::cache::CacheSource;
use crate::classify::Category;
use crate::orchestrator::FallbackKind;
use crate::remote::BackendState;

/// Default channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum AmeliaEvent {
    /// The dispatcher changed state.
    BackendState(BackendState),
    /// A message was classified.
    Classified {
        category: Category,
        needs_remote: bool,
    },
    /// A remote-bound message was answered from the cache.
    CacheHit { key: String, source: CacheSource },
    /// The backend failed and a fallback reply was used.
    Fallback { kind: FallbackKind, error: String },
}

/// Cloneable sender side of the event channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AmeliaEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AmeliaEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: AmeliaEvent) {
        // Err only means nobody is listening.
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_without_subscribers_is_fine() {
        let bus = EventBus::default();
        bus.emit(AmeliaEvent::BackendState(BackendState::Loading));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn subscribers_receive_in_order() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        bus.emit(AmeliaEvent::BackendState(BackendState::Loading));
        bus.emit(AmeliaEvent::BackendState(BackendState::Ready));
        assert_eq!(
            rx.recv().await.unwrap(),
            AmeliaEvent::BackendState(BackendState::Loading)
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            AmeliaEvent::BackendState(BackendState::Ready)
        );
    }
}
