//! # Controller: single-owner actor over a [`ControlCenter`].
//!
//! ```text
//! CenterHandle (clone) ──┐
//! CenterHandle (clone) ──┼── mpsc<Command> ──► Controller task ──► ControlCenter (&mut)
//! CenterHandle (clone) ──┘                          │
//!          ▲                                        │
//!          └──────────── oneshot<Result<T>> ◄───────┘
//! ```
//!
//! Commands run one at a time in arrival order, so registry mutations never
//! interleave. A long command (an unbounded readiness wait, a join without
//! timeout) holds up everything queued behind it.
//!
//! The actor ends when every handle is dropped or [`CenterHandle::close`] is
//! called; its join handle then yields the `ControlCenter` back.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::command::{Command, Reply};
use super::config::ControllerConfig;
use super::error::{CallError, SubmitError};
use crate::control::{Inspection, Replies};
use crate::core::{ControlCenter, InfoReply, Nodes, StopReport};
use crate::error::CenterError;
use crate::workers::RunConfig;

/// Reply to a command submitted with a `try_*` method.
#[must_use = "the command runs regardless; await `wait` to get its result"]
pub struct Pending<T> {
    rx: oneshot::Receiver<Result<T, CenterError>>,
}

impl<T> Pending<T> {
    /// Waits for the controller to run the command.
    pub async fn wait(self) -> Result<T, CallError> {
        let result = self.rx.await.map_err(|_| SubmitError::Closed)?;
        Ok(result?)
    }
}

/// Cloneable handle for calling into a running [`Controller`].
#[derive(Clone)]
pub struct CenterHandle {
    tx: mpsc::Sender<Command>,
    token: CancellationToken,
}

impl CenterHandle {
    async fn call<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T, CallError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| SubmitError::Closed)?;
        Pending { rx }.wait().await
    }

    fn try_call<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<Pending<T>, SubmitError> {
        let (reply, rx) = oneshot::channel();
        self.tx.try_send(make(reply)).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SubmitError::Full,
            mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
        })?;
        Ok(Pending { rx })
    }

    /// See [`ControlCenter::start_worker`].
    pub async fn start_worker(
        &self,
        node: impl Into<String>,
        config: RunConfig,
        wait_for_ready: bool,
    ) -> Result<Option<String>, CallError> {
        let node = node.into();
        self.call(|reply| Command::StartWorker {
            node,
            config,
            wait_for_ready,
            reply,
        })
        .await
    }

    /// Queues a start without waiting for queue space.
    pub fn try_start_worker(
        &self,
        node: impl Into<String>,
        config: RunConfig,
        wait_for_ready: bool,
    ) -> Result<Pending<Option<String>>, SubmitError> {
        let node = node.into();
        self.try_call(|reply| Command::StartWorker {
            node,
            config,
            wait_for_ready,
            reply,
        })
    }

    /// See [`ControlCenter::stop_workers`].
    pub async fn stop_workers(
        &self,
        nodes: impl Into<Nodes>,
        join: bool,
        timeout: Option<Duration>,
    ) -> Result<StopReport, CallError> {
        let nodes = nodes.into();
        self.call(|reply| Command::StopWorkers {
            nodes,
            join,
            timeout,
            reply,
        })
        .await
    }

    /// Queues a stop without waiting for queue space.
    pub fn try_stop_workers(
        &self,
        nodes: impl Into<Nodes>,
        join: bool,
        timeout: Option<Duration>,
    ) -> Result<Pending<StopReport>, SubmitError> {
        let nodes = nodes.into();
        self.try_call(|reply| Command::StopWorkers {
            nodes,
            join,
            timeout,
            reply,
        })
    }

    /// See [`ControlCenter::join`].
    pub async fn join(
        &self,
        nodes: impl Into<Nodes>,
        timeout: Option<Duration>,
    ) -> Result<StopReport, CallError> {
        let nodes = nodes.into();
        self.call(|reply| Command::Join {
            nodes,
            timeout,
            reply,
        })
        .await
    }

    /// See [`ControlCenter::kill`].
    pub async fn kill(&self, nodes: impl Into<Nodes>) -> Result<StopReport, CallError> {
        let nodes = nodes.into();
        self.call(|reply| Command::Kill { nodes, reply }).await
    }

    /// See [`ControlCenter::info`].
    pub async fn info(&self, nodes: impl Into<Nodes>) -> Result<InfoReply, CallError> {
        let nodes = nodes.into();
        self.call(|reply| Command::Info { nodes, reply }).await
    }

    /// Registered hostnames in insertion order.
    pub async fn hostnames(&self) -> Result<Vec<String>, CallError> {
        self.call(|reply| Command::Hostnames { reply }).await
    }

    /// See [`ControlCenter::inspect`].
    pub async fn inspect(&self, query: Inspection) -> Result<Replies, CallError> {
        self.call(|reply| Command::Inspect { query, reply }).await
    }

    /// See [`ControlCenter::active_queue_names`].
    pub async fn active_queue_names(&self) -> Result<Vec<String>, CallError> {
        self.call(|reply| Command::ActiveQueueNames { reply }).await
    }

    /// See [`ControlCenter::terminate`].
    pub async fn terminate(&self, timeout: Option<Duration>) -> Result<StopReport, CallError> {
        self.call(|reply| Command::Terminate { timeout, reply }).await
    }

    /// Stops the actor after the command in progress; queued commands get `Closed`.
    pub fn close(&self) {
        self.token.cancel();
    }
}

/// Actor owning a [`ControlCenter`].
pub struct Controller {
    center: ControlCenter,
    rx: mpsc::Receiver<Command>,
    token: CancellationToken,
}

impl Controller {
    /// Moves `center` into a new actor task. Must be called within a Tokio runtime.
    pub fn spawn(center: ControlCenter, cfg: ControllerConfig) -> (CenterHandle, JoinHandle<ControlCenter>) {
        let (tx, rx) = mpsc::channel(cfg.queue_capacity.max(1));
        let token = CancellationToken::new();
        let actor = Controller {
            center,
            rx,
            token: token.clone(),
        };
        (CenterHandle { tx, token }, tokio::spawn(actor.run()))
    }

    async fn run(mut self) -> ControlCenter {
        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                cmd = self.rx.recv() => match cmd {
                    Some(cmd) => self.dispatch(cmd).await,
                    None => break,
                },
            }
        }
        tracing::debug!("controller stopped");
        self.center
    }

    async fn dispatch(&mut self, cmd: Command) {
        let label = cmd.label();
        let c = &mut self.center;
        let delivered = match cmd {
            Command::StartWorker {
                node,
                config,
                wait_for_ready,
                reply,
            } => reply
                .send(c.start_worker(&node, config, wait_for_ready).await)
                .is_ok(),
            Command::StopWorkers {
                nodes,
                join,
                timeout,
                reply,
            } => reply.send(c.stop_workers(nodes, join, timeout).await).is_ok(),
            Command::Join {
                nodes,
                timeout,
                reply,
            } => reply.send(c.join(nodes, timeout).await).is_ok(),
            Command::Kill { nodes, reply } => reply.send(c.kill(nodes).await).is_ok(),
            Command::Info { nodes, reply } => reply.send(Ok(c.info(nodes).await)).is_ok(),
            Command::Hostnames { reply } => reply.send(Ok(c.hostnames().to_vec())).is_ok(),
            Command::Inspect { query, reply } => reply.send(c.inspect(query).await).is_ok(),
            Command::ActiveQueueNames { reply } => {
                reply.send(c.active_queue_names().await).is_ok()
            }
            Command::Terminate { timeout, reply } => reply.send(c.terminate(timeout).await).is_ok(),
        };
        if !delivered {
            tracing::debug!(command = label, "caller went away before the reply");
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::control::fake::{self, Behavior};
    use crate::core::CenterConfig;

    const LONG: Option<Duration> = Some(Duration::from_secs(10));

    fn spawn(
        dir: &tempfile::TempDir,
        behavior: Behavior,
        queue: usize,
        ready_timeout: Duration,
    ) -> (CenterHandle, JoinHandle<ControlCenter>) {
        let cfg = CenterConfig {
            ready_poll: Duration::from_millis(20),
            ready_timeout,
            rollback_grace: Duration::from_millis(100),
            ..CenterConfig::default()
        };
        let center = ControlCenter::builder(fake::app(dir.path(), behavior), cfg)
            .build()
            .unwrap();
        Controller::spawn(center, ControllerConfig { queue_capacity: queue })
    }

    #[tokio::test]
    async fn concurrent_starts_of_one_node_register_it_once() {
        let dir = tempfile::tempdir().unwrap();
        let (handle, task) = spawn(&dir, Behavior::Serve, 16, Duration::from_secs(10));

        let a = tokio::spawn({
            let h = handle.clone();
            async move { h.start_worker("w1@box", RunConfig::default(), true).await }
        });
        let b = tokio::spawn({
            let h = handle.clone();
            async move { h.start_worker("w1@box", RunConfig::default(), true).await }
        });
        let results = [a.await.unwrap().unwrap(), b.await.unwrap().unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_some()).count(), 1);
        assert_eq!(handle.hostnames().await.unwrap(), ["w1@box"]);

        let report = handle.terminate(LONG).await.unwrap();
        assert_eq!(report.removed, ["w1@box"]);

        drop(handle);
        let center = task.await.unwrap();
        assert!(center.is_empty());
    }

    #[tokio::test]
    async fn closed_controller_rejects_calls() {
        let dir = tempfile::tempdir().unwrap();
        let (handle, task) = spawn(&dir, Behavior::Serve, 4, Duration::from_secs(10));

        handle.close();
        let center = task.await.unwrap();
        assert!(center.is_empty());

        let err = handle.info(Nodes::All).await.unwrap_err();
        assert_eq!(err.as_label(), "controller_closed");
        assert!(matches!(
            handle.try_stop_workers(Nodes::All, false, None),
            Err(SubmitError::Closed)
        ));
    }

    #[tokio::test]
    async fn try_call_reports_full_queue() {
        let dir = tempfile::tempdir().unwrap();
        let (handle, task) = spawn(&dir, Behavior::NeverReady, 1, Duration::from_millis(600));

        // Occupies the actor until the readiness deadline passes.
        let busy = handle
            .try_start_worker("slow@box", RunConfig::default(), true)
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let queued = handle.try_stop_workers(Nodes::All, false, None).unwrap();
        assert_eq!(
            handle.try_start_worker("other@box", RunConfig::default(), false).err(),
            Some(SubmitError::Full)
        );

        handle.close();
        drop(queued);
        let center = task.await.unwrap();
        assert_eq!(busy.wait().await.unwrap(), None);
        assert!(center.is_empty());
    }
}
