//! # Broadcast bus for control-center events.
//!
//! ```text
//! ControlCenter ──publish──► Bus ──► listener task ──► SubscriberSet ──► LogWriter, ...
//!                            └────► any extra receiver (tests, embedding apps)
//! ```
//!
//! - `publish` never blocks; with no receiver the event is dropped.
//! - One ring buffer of `capacity` events is shared by all receivers; a receiver
//!   that falls behind sees `RecvError::Lagged(n)` and skips `n` events.

use tokio::sync::broadcast;

use super::event::Event;

/// Cloneable handle to the event channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus; capacity is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Fire-and-forget publish.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// New receiver observing events sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn receivers_see_events_published_after_subscribing() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::Bootstrapped));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::WorkerReady).with_worker("celery@w1"));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::WorkerReady);
        assert!(rx.try_recv().is_err());
    }
}
