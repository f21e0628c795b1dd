//! # Subscriber trait
//!
//! `Subscribe` is the extension point for reacting to control-center events
//! (audit trails, alerts, metrics). Each subscriber is driven by its own worker
//! task fed by a bounded queue owned by the
//! [`SubscriberSet`](crate::subscribers::SubscriberSet), so a slow subscriber
//! never stalls the control center.

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
///
/// # Example
/// ```rust
/// use async_trait::async_trait;
/// use workvisor::{Event, EventKind, Subscribe};
///
/// struct Alerts;
///
/// #[async_trait]
/// impl Subscribe for Alerts {
///     async fn on_event(&self, ev: &Event) {
///         if ev.kind == EventKind::WorkerExited {
///             // page someone
///         }
///     }
///     fn name(&self) -> &'static str { "alerts" }
/// }
/// ```
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event.
    async fn on_event(&self, event: &Event);

    /// Name used in logs and overflow/panic events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Capacity of this subscriber's queue; events beyond it are dropped.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
