//! # Lifecycle events emitted by the control center.
//!
//! [`EventKind`] groups events into:
//! - **Worker lifecycle**: launch, readiness, stop, removal, unexpected exit
//! - **Center events**: config saved or not, shutdown requested, bootstrap done
//! - **Subscriber events**: overflow and panic of event subscribers
//!
//! [`Event`] carries the metadata (hostname, pid, reason, timeout).
//!
//! ## Ordering guarantees
//! Every event gets a process-wide monotonically increasing `seq`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use workvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::JoinTimedOut)
//!     .with_worker("celery@w1")
//!     .with_timeout(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::JoinTimedOut);
//! assert_eq!(ev.worker.as_deref(), Some("celery@w1"));
//! assert_eq!(ev.timeout_ms, Some(5000));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of control-center events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked while handling an event.
    ///
    /// Sets `worker` to the subscriber name and `reason` to the panic message.
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets `worker` to the subscriber name and `reason`.
    SubscriberOverflow,

    // === Center events ===
    /// Interrupt signal or stop token observed by the supervisory loop.
    ShutdownRequested,

    /// Persisted workers were launched at start. Sets `count`.
    Bootstrapped,

    /// Working configuration written to the store. Sets `reason` to the path.
    ConfigSaved,

    /// Saving after a start or stop failed; the change itself stands.
    /// Sets `reason` to the error.
    ConfigSaveFailed,

    // === Worker lifecycle ===
    /// Worker process launched and registered. Sets `worker`, `pid`.
    WorkerStarting,

    /// Start rejected: the hostname is already registered. Sets `worker`.
    DuplicateRejected,

    /// Worker answered its first ping. Sets `worker`.
    WorkerReady,

    /// Worker never became ready and was rolled back. Sets `worker`, optional `timeout_ms`.
    WorkerNotReady,

    /// Shutdown requested over the control API. Sets `worker`.
    WorkerStopping,

    /// Worker exit confirmed and node deregistered. Sets `worker`.
    WorkerRemoved,

    /// Join deadline passed with the worker still running; it stays registered.
    /// Sets `worker`, `timeout_ms`.
    JoinTimedOut,

    /// Supervisory loop found a registered worker whose process has exited.
    /// Sets `worker`.
    WorkerExited,
}

impl EventKind {
    /// Stable snake_case name for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::SubscriberPanicked => "subscriber_panicked",
            EventKind::SubscriberOverflow => "subscriber_overflow",
            EventKind::ShutdownRequested => "shutdown_requested",
            EventKind::Bootstrapped => "bootstrapped",
            EventKind::ConfigSaved => "config_saved",
            EventKind::ConfigSaveFailed => "config_save_failed",
            EventKind::WorkerStarting => "worker_starting",
            EventKind::DuplicateRejected => "duplicate_rejected",
            EventKind::WorkerReady => "worker_ready",
            EventKind::WorkerNotReady => "worker_not_ready",
            EventKind::WorkerStopping => "worker_stopping",
            EventKind::WorkerRemoved => "worker_removed",
            EventKind::JoinTimedOut => "join_timed_out",
            EventKind::WorkerExited => "worker_exited",
        }
    }
}

/// Control-center event with optional metadata.
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Canonical hostname (or subscriber name for subscriber events).
    pub worker: Option<Arc<str>>,
    /// Human-readable detail.
    pub reason: Option<Arc<str>>,
    /// OS process id.
    pub pid: Option<u32>,
    /// Deadline involved, in milliseconds.
    pub timeout_ms: Option<u32>,
    /// Number of items involved.
    pub count: Option<u32>,
}

impl Event {
    /// Creates an event stamped with the current time and the next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            worker: None,
            reason: None,
            pid: None,
            timeout_ms: None,
            count: None,
        }
    }

    #[inline]
    pub fn with_worker(mut self, hostname: impl Into<Arc<str>>) -> Self {
        self.worker = Some(hostname.into());
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn with_pid(mut self, pid: Option<u32>) -> Self {
        self.pid = pid;
        self
    }

    /// Attaches a deadline (stored as milliseconds, saturating).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(u32::try_from(n).unwrap_or(u32::MAX));
        self
    }

    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_worker(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_worker(subscriber)
            .with_reason(info)
    }

    /// True for events produced by the subscriber machinery itself.
    #[inline]
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_increases() {
        let a = Event::new(EventKind::WorkerReady);
        let b = Event::new(EventKind::WorkerReady);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn timeout_saturates() {
        let ev = Event::new(EventKind::JoinTimedOut).with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(ev.timeout_ms, Some(u32::MAX));
    }

    #[test]
    fn subscriber_helpers_tag_kind() {
        assert!(Event::subscriber_overflow("log", "full").is_subscriber_event());
        assert!(Event::subscriber_panicked("log", "boom".into()).is_subscriber_event());
        assert!(!Event::new(EventKind::WorkerExited).is_subscriber_event());
    }
}
