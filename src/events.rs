//! Decoupled event bus between the gateway, the guard and the REPL.
//!
//! Components emit events via [`EventBus::emit`] and subscribe via
//! [`EventBus::subscribe`]. Built on [`tokio::sync::broadcast`] so
//! multiple listeners can react independently.

use tokio::sync::broadcast;

/// Events that flow through the client.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A navigation proceeded; carries the formatted screen title.
    TitleChanged { title: String },
    /// The backend rejected the stored credential and the session was cleared.
    SessionExpired,
}

/// A broadcast channel that any component can emit to or subscribe from.
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all current subscribers.
    /// Returns the number of receivers that will see it.
    pub fn emit(&self, event: Event) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Subscribe to events. Does not replay past ones.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emit_reaches_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.emit(Event::TitleChanged {
            title: "Home - Flowable Workflow".to_string(),
        });

        assert_eq!(
            rx.recv().await.unwrap(),
            Event::TitleChanged {
                title: "Home - Flowable Workflow".to_string()
            }
        );
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emit(Event::SessionExpired);

        assert_eq!(rx1.recv().await.unwrap(), Event::SessionExpired);
        assert_eq!(rx2.recv().await.unwrap(), Event::SessionExpired);
    }

    #[test]
    fn emit_without_subscribers_returns_zero() {
        let bus = EventBus::default();
        assert_eq!(bus.emit(Event::SessionExpired), 0);
    }

    #[test]
    fn emit_with_subscriber_returns_count() {
        let bus = EventBus::default();
        let _rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.emit(Event::SessionExpired), 2);
    }
}
