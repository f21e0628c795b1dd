//! # ControlCenter: registry and supervisor of worker processes.
//!
//! The [`ControlCenter`] owns the worker [`Registry`], the working
//! configuration, and the config store. Every mutating operation takes
//! `&mut self`, so there is exactly one writer; concurrent callers go through
//! the `Controller` actor.
//!
//! ## Worker lifecycle
//! ```text
//! start_worker(node, overrides, wait)
//!   ├─ canonicalize → already registered? ──► DuplicateRejected, Ok(None)
//!   ├─ launch merge(global, overrides) ──► register + record overrides
//!   └─ wait? ── wait_for_ready ── true ──► WorkerReady, Ok(Some(hostname))
//!                              └─ false ─► shutdown → grace join → kill,
//!                                          deregister, WorkerNotReady, Ok(None)
//!
//! stop_workers(nodes, join, timeout)
//!   └─ per node (registry order): shutdown request, drop override
//!        └─ join? ─► join(timeout) ─► exited: deregister (WorkerRemoved)
//!                                   └► running: keep (JoinTimedOut)
//! ```
//!
//! ## Supervisory loop
//! [`start(true)`](ControlCenter::start) launches the persisted workers, then
//! wakes every `supervise_interval` to report workers that exited on their own
//! until a termination signal or the [stop token](ControlCenter::stop_token)
//! fires, and finally calls [`terminate`](ControlCenter::terminate) bounded by
//! `terminate_timeout`. A second signal cuts that join short. Workers still
//! registered afterwards are killed.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::builder::CenterBuilder;
use super::config::CenterConfig;
use super::nodes::Nodes;
use super::registry::Registry;
use super::report::{InfoReply, StopReport};
use super::shutdown;
use crate::control::{Inspection, Replies};
use crate::error::CenterError;
use crate::events::{Bus, Event, EventKind};
use crate::store::{ConfigStore, PersistedConfig};
use crate::workers::{App, Hostname, RunConfig, WorkerProcess};

const MIN_SUPERVISE_INTERVAL: Duration = Duration::from_millis(10);

/// Registry and supervisor of worker processes for one app.
pub struct ControlCenter {
    cfg: CenterConfig,
    app: App,
    store: Option<ConfigStore>,
    initial: PersistedConfig,
    working: PersistedConfig,
    registry: Registry,
    bus: Bus,
    stop: CancellationToken,
    listener_stop: CancellationToken,
    reported_exits: HashSet<String>,
}

impl ControlCenter {
    /// Starts building a control center for `app`.
    pub fn builder(app: App, cfg: CenterConfig) -> CenterBuilder {
        CenterBuilder::new(app, cfg)
    }

    pub(crate) fn from_parts(
        app: App,
        cfg: CenterConfig,
        store: Option<ConfigStore>,
        initial: PersistedConfig,
        bus: Bus,
        listener_stop: CancellationToken,
    ) -> Self {
        let working = PersistedConfig {
            global: initial.global.clone(),
            workers: BTreeMap::new(),
        };
        Self {
            cfg,
            app,
            store,
            initial,
            working,
            registry: Registry::new(),
            bus,
            stop: CancellationToken::new(),
            listener_stop,
            reported_exits: HashSet::new(),
        }
    }

    // === Accessors ===

    pub fn config(&self) -> &CenterConfig {
        &self.cfg
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    /// Registered hostnames in insertion order.
    pub fn hostnames(&self) -> &[String] {
        self.registry.hostnames()
    }

    /// Registered workers in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &WorkerProcess> {
        self.registry.iter()
    }

    /// Worker registered under `node` (canonicalized).
    pub fn get(&self, node: &str) -> Option<&WorkerProcess> {
        self.registry.get(Hostname::canonical(node).as_str())
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Global defaults plus the overrides of the live nodes.
    pub fn working_config(&self) -> &PersistedConfig {
        &self.working
    }

    /// Receiver for this center's events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Token that ends the supervisory loop of [`start(true)`](Self::start).
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    // === Registry operations ===

    /// Launches a worker for `node` and registers it.
    ///
    /// Returns the canonical hostname, or `None` when the node is already
    /// registered or (with `wait_for_ready`) never became ready. Hard errors are
    /// reserved for failures to launch or reap the process; a failed on-change
    /// save is reported as [`EventKind::ConfigSaveFailed`] and the worker stays.
    pub async fn start_worker(
        &mut self,
        node: &str,
        overrides: RunConfig,
        wait_for_ready: bool,
    ) -> Result<Option<String>, CenterError> {
        let hostname = Hostname::canonical(node).into_string();
        if self.registry.contains(&hostname) {
            self.publish(Event::new(EventKind::DuplicateRejected).with_worker(hostname.as_str()));
            return Ok(None);
        }

        let effective = overrides.merged_over(&self.working.global);
        let mut worker = WorkerProcess::new(self.app.clone(), &hostname, effective)
            .with_poll_interval(self.cfg.ready_poll);
        worker.start()?;
        let pid = worker.pid();

        if let Err(mut stray) = self.registry.insert(worker) {
            stray.kill().await?;
            return Ok(None);
        }
        self.working.workers.insert(hostname.clone(), overrides);
        self.reported_exits.remove(&hostname);
        self.publish(
            Event::new(EventKind::WorkerStarting)
                .with_worker(hostname.as_str())
                .with_pid(pid),
        );

        if wait_for_ready && !self.await_ready(&hostname).await? {
            return Ok(None);
        }
        self.persist_if_on_change();
        Ok(Some(hostname))
    }

    /// Sends a shutdown request to each selected node and forgets its override;
    /// with `join`, then joins them (see [`join`](Self::join)).
    pub async fn stop_workers(
        &mut self,
        nodes: impl Into<Nodes>,
        join: bool,
        timeout: Option<Duration>,
    ) -> Result<StopReport, CenterError> {
        let report = self.stop_resolved(&nodes.into(), join, timeout).await?;
        self.persist_if_on_change();
        Ok(report)
    }

    /// Joins each selected node; exited nodes are deregistered, nodes still
    /// running after `timeout` stay registered and are reported back.
    pub async fn join(
        &mut self,
        nodes: impl Into<Nodes>,
        timeout: Option<Duration>,
    ) -> Result<StopReport, CenterError> {
        let targets = self.registry.resolve(&nodes.into());
        self.join_resolved(targets, timeout).await
    }

    /// Kills each selected node outright and deregisters it.
    ///
    /// Escalation for nodes a join reported as still running. Overrides are
    /// kept, so the nodes come back on the next start.
    pub async fn kill(&mut self, nodes: impl Into<Nodes>) -> Result<StopReport, CenterError> {
        let mut report = StopReport::default();
        for hostname in self.registry.resolve(&nodes.into()) {
            if let Some(mut worker) = self.registry.remove(&hostname) {
                worker.kill().await?;
                self.reported_exits.remove(&hostname);
                self.publish(
                    Event::new(EventKind::WorkerRemoved)
                        .with_worker(hostname.as_str())
                        .with_reason("killed"),
                );
                report.removed.push(hostname);
            }
        }
        Ok(report)
    }

    /// Snapshot of one node (`Nodes::One`) or of several nodes.
    pub async fn info(&mut self, nodes: impl Into<Nodes>) -> InfoReply {
        let nodes = nodes.into();
        if let Nodes::One(node) = &nodes {
            let hostname = Hostname::canonical(node);
            let info = match self.registry.get_mut(hostname.as_str()) {
                Some(worker) => Some(worker.info().await),
                None => None,
            };
            return InfoReply::Single(info);
        }

        let mut all = Vec::new();
        for hostname in self.registry.resolve(&nodes) {
            if let Some(worker) = self.registry.get_mut(&hostname) {
                all.push(worker.info().await);
            }
        }
        InfoReply::Many(all)
    }

    /// Runs an inspection on every registered node.
    pub async fn inspect(&self, query: Inspection) -> Result<Replies, CenterError> {
        let replies = self
            .app
            .control()
            .inspect(self.registry.hostnames(), query)
            .await?;
        Ok(replies)
    }

    /// Sorted union of the queues the registered nodes consume from.
    pub async fn active_queue_names(&self) -> Result<Vec<String>, CenterError> {
        let replies = self.inspect(Inspection::ActiveQueues).await?;
        let names: BTreeSet<&str> = replies
            .values()
            .filter_map(Value::as_array)
            .flatten()
            .filter_map(|queue| queue.get("name").and_then(Value::as_str))
            .collect();
        Ok(names.into_iter().map(str::to_string).collect())
    }

    // === Lifecycle ===

    /// Launches every persisted worker without waiting for readiness; with
    /// `run_event_loop`, then supervises until interrupted and terminates.
    pub async fn start(&mut self, run_event_loop: bool) -> Result<(), CenterError> {
        self.bootstrap().await?;
        if run_event_loop {
            self.supervise().await;
            self.shut_down().await?;
        }
        Ok(())
    }

    /// Persists the working configuration (if a store is configured), then
    /// stops and joins every worker.
    ///
    /// The workers are stopped even when the save fails; its error is
    /// returned afterwards.
    pub async fn terminate(&mut self, timeout: Option<Duration>) -> Result<StopReport, CenterError> {
        let saved = self.persist();
        let report = self.stop_resolved(&Nodes::All, true, timeout).await?;
        saved?;
        Ok(report)
    }

    // === Internals ===

    fn publish(&self, ev: Event) {
        self.bus.publish(ev);
    }

    async fn bootstrap(&mut self) -> Result<(), CenterError> {
        let nodes = self.initial.workers.clone();
        let mut launched = 0usize;
        for (node, overrides) in nodes {
            if self.start_worker(&node, overrides, false).await?.is_some() {
                launched += 1;
            }
        }
        self.publish(Event::new(EventKind::Bootstrapped).with_count(launched));
        Ok(())
    }

    /// Final shutdown of the supervised run: terminate until `terminate_timeout`
    /// or a second termination signal, then kill what is left.
    async fn shut_down(&mut self) -> Result<(), CenterError> {
        let deadline = self.cfg.terminate_deadline();
        let terminated = tokio::select! {
            biased;
            res = self.terminate(deadline) => Some(res),
            _ = shutdown::shutdown_signal_or_pending() => None,
        };
        if terminated.is_none() {
            tracing::warn!("second termination signal; skipping the remaining joins");
        }

        if !self.is_empty() {
            let killed = self.kill(Nodes::All).await?;
            tracing::warn!(count = killed.removed.len(), "killed workers that outlived shutdown");
        }
        terminated.transpose()?;
        Ok(())
    }

    async fn await_ready(&mut self, hostname: &str) -> Result<bool, CenterError> {
        let deadline = self.cfg.ready_deadline();
        let ready = match self.registry.get_mut(hostname) {
            Some(worker) => match deadline {
                Some(limit) => worker.wait_for_ready_within(limit).await,
                None => worker.wait_for_ready().await,
            },
            None => false,
        };

        if ready {
            self.publish(Event::new(EventKind::WorkerReady).with_worker(hostname));
            return Ok(true);
        }

        self.roll_back(hostname).await?;
        let mut ev = Event::new(EventKind::WorkerNotReady).with_worker(hostname);
        if let Some(limit) = deadline {
            ev = ev.with_timeout(limit);
        }
        self.publish(ev);
        Ok(false)
    }

    /// Stops a worker that never became ready. It stays registered until its
    /// process is gone, so a failed kill leaves it visible to `info` and `kill`.
    async fn roll_back(&mut self, hostname: &str) -> Result<(), CenterError> {
        self.working.workers.remove(hostname);
        let grace = self.cfg.rollback_grace;
        let Some(worker) = self.registry.get_mut(hostname) else {
            return Ok(());
        };
        worker.shutdown(true, Some(grace)).await?;
        if worker.is_running() {
            worker.kill().await?;
        }
        self.registry.remove(hostname);
        Ok(())
    }

    async fn stop_resolved(
        &mut self,
        nodes: &Nodes,
        join: bool,
        timeout: Option<Duration>,
    ) -> Result<StopReport, CenterError> {
        let targets = self.registry.resolve(nodes);
        for hostname in &targets {
            self.working.workers.remove(hostname);
            if let Some(worker) = self.registry.get_mut(hostname) {
                worker.shutdown(false, None).await?;
            }
            self.publish(Event::new(EventKind::WorkerStopping).with_worker(hostname.as_str()));
        }

        let mut report = if join {
            self.join_resolved(targets.clone(), timeout).await?
        } else {
            StopReport::default()
        };
        report.requested = targets;
        Ok(report)
    }

    async fn join_resolved(
        &mut self,
        targets: Vec<String>,
        timeout: Option<Duration>,
    ) -> Result<StopReport, CenterError> {
        let mut report = StopReport::default();
        for hostname in targets {
            let running = match self.registry.get_mut(&hostname) {
                Some(worker) => {
                    worker.join(timeout).await?;
                    worker.is_running()
                }
                None => continue,
            };

            if running {
                let mut ev = Event::new(EventKind::JoinTimedOut).with_worker(hostname.as_str());
                if let Some(limit) = timeout {
                    ev = ev.with_timeout(limit);
                }
                self.publish(ev);
                report.still_running.push(hostname);
            } else {
                self.registry.remove(&hostname);
                self.reported_exits.remove(&hostname);
                self.publish(Event::new(EventKind::WorkerRemoved).with_worker(hostname.as_str()));
                report.removed.push(hostname);
            }
        }
        Ok(report)
    }

    async fn supervise(&mut self) {
        let stop = self.stop.clone();
        let signal = shutdown::shutdown_signal_or_pending();
        tokio::pin!(signal);

        let mut ticker = time::interval(self.cfg.supervise_interval.max(MIN_SUPERVISE_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut signal => break,
                _ = stop.cancelled() => break,
                _ = ticker.tick() => self.sweep(),
            }
        }
        self.publish(Event::new(EventKind::ShutdownRequested));
    }

    /// Reports (once) registered workers whose process is gone. No registry mutation.
    fn sweep(&mut self) {
        let mut exited = Vec::new();
        for hostname in self.registry.hostnames().to_vec() {
            if self.reported_exits.contains(&hostname) {
                continue;
            }
            if let Some(worker) = self.registry.get_mut(&hostname) {
                if !worker.is_running() {
                    exited.push(hostname);
                }
            }
        }
        for hostname in exited {
            self.publish(Event::new(EventKind::WorkerExited).with_worker(hostname.as_str()));
            self.reported_exits.insert(hostname);
        }
    }

    fn persist(&self) -> Result<(), CenterError> {
        if let Some(store) = &self.store {
            store.save(&self.working)?;
            self.publish(
                Event::new(EventKind::ConfigSaved).with_reason(store.path().display().to_string()),
            );
        }
        Ok(())
    }

    fn persist_if_on_change(&self) {
        if !self.cfg.persists_on_change() {
            return;
        }
        if let Err(err) = self.persist() {
            self.publish(Event::new(EventKind::ConfigSaveFailed).with_reason(err.to_string()));
        }
    }
}

impl Drop for ControlCenter {
    fn drop(&mut self) {
        self.listener_stop.cancel();
    }
}

impl std::fmt::Debug for ControlCenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlCenter")
            .field("app", &self.app)
            .field("hostnames", &self.registry.hostnames())
            .finish_non_exhaustive()
    }
}
