use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;

use super::center::ControlCenter;
use super::config::CenterConfig;
use crate::error::CenterError;
use crate::events::{Bus, Event};
use crate::store::load_initial;
use crate::subscribers::{LogWriter, Subscribe, SubscriberSet};
use crate::workers::App;

/// Builder for a [`ControlCenter`].
///
/// [`LogWriter`] is always installed; extra subscribers run next to it.
pub struct CenterBuilder {
    app: App,
    cfg: CenterConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl CenterBuilder {
    pub fn new(app: App, cfg: CenterConfig) -> Self {
        Self {
            app,
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Adds event subscribers.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers.extend(subscribers);
        self
    }

    /// Loads the initial configuration and wires the event pipeline.
    ///
    /// Fails with [`CenterError::Config`] before anything is spawned if the
    /// configuration cannot be read. Must be called within a Tokio runtime.
    pub fn build(self) -> Result<ControlCenter, CenterError> {
        let store = self.cfg.store();
        let initial = load_initial(self.cfg.init_cfg.as_ref(), store.as_ref())?;

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let mut subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter)];
        subs.extend(self.subscribers);
        let set = SubscriberSet::new(subs, bus.clone());

        let listener_stop = CancellationToken::new();
        spawn_listener(bus.subscribe(), set, listener_stop.clone());

        tracing::debug!(
            app = self.app.name(),
            workers = initial.workers.len(),
            "control center built"
        );
        Ok(ControlCenter::from_parts(
            self.app,
            self.cfg,
            store,
            initial,
            bus,
            listener_stop,
        ))
    }
}

/// Forwards bus events to the subscriber set until `stop` fires, then drains it.
fn spawn_listener(mut rx: broadcast::Receiver<Event>, set: SubscriberSet, stop: CancellationToken) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(ev) => set.emit(Arc::new(ev)),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "event listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
        set.shutdown().await;
    });
}
