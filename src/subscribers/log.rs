//! # LogWriter: events as structured log records
//!
//! Turns every [`Event`] into one `tracing` record with the event's metadata
//! as fields. Rejections, readiness failures and unexpected exits are logged
//! at `warn`; subscriber panics at `error`; everything else at `info`.
//!
//! ```text
//! INFO  worker launched hostname="celery@w1" pid=4242
//! WARN  duplicate hostname rejected hostname="celery@w1"
//! WARN  worker exited on its own hostname="celery@w2"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Subscriber that forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let worker = e.worker.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        let kind = e.kind.as_label();

        match e.kind {
            EventKind::WorkerStarting => {
                tracing::info!(seq = e.seq, hostname = worker, pid = e.pid, "worker launched")
            }
            EventKind::WorkerReady => tracing::info!(seq = e.seq, hostname = worker, "worker ready"),
            EventKind::WorkerStopping => {
                tracing::info!(seq = e.seq, hostname = worker, "worker shutdown requested")
            }
            EventKind::WorkerRemoved => tracing::info!(seq = e.seq, hostname = worker, "worker removed"),
            EventKind::Bootstrapped => {
                tracing::info!(seq = e.seq, count = e.count, "persisted workers launched")
            }
            EventKind::ConfigSaved => tracing::info!(seq = e.seq, path = reason, "configuration saved"),
            EventKind::ShutdownRequested => tracing::info!(seq = e.seq, "shutdown requested"),

            EventKind::DuplicateRejected => {
                tracing::warn!(seq = e.seq, hostname = worker, "duplicate hostname rejected")
            }
            EventKind::WorkerNotReady => tracing::warn!(
                seq = e.seq,
                hostname = worker,
                timeout_ms = e.timeout_ms,
                "worker never became ready; rolled back"
            ),
            EventKind::JoinTimedOut => tracing::warn!(
                seq = e.seq,
                hostname = worker,
                timeout_ms = e.timeout_ms,
                "worker still running after join timeout"
            ),
            EventKind::ConfigSaveFailed => {
                tracing::warn!(seq = e.seq, error = reason, "configuration not saved")
            }
            EventKind::WorkerExited => {
                tracing::warn!(seq = e.seq, hostname = worker, "worker exited on its own")
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(seq = e.seq, subscriber = worker, reason, kind, "event dropped")
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(seq = e.seq, subscriber = worker, reason, kind, "subscriber panicked")
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
