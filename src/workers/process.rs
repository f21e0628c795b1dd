//! # One supervised worker.
//!
//! A [`WorkerProcess`] owns the subprocess running the worker command and
//! answers two different questions about it:
//!
//! - **running**: the OS process has not exited (local, cheap);
//! - **ready**: the worker answers a ping on the control API (remote).
//!
//! A worker can be running for a while before it becomes ready, and a crashed
//! worker is only noticed the next time one of these is asked.

use std::time::Duration;

use serde_json::Value;
use tokio::time;

use super::app::App;
use super::hostname::Hostname;
use super::info::WorkerInfo;
use super::run_config::RunConfig;
use crate::branch::{Branch, SubprocessBranch};
use crate::error::{BranchError, ControlError};

/// Interval between readiness pings.
pub const READY_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Floor for [`WorkerProcess::with_poll_interval`]; every ping may spawn a process.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Controller-side handle of one worker process.
pub struct WorkerProcess {
    app: App,
    hostname: Hostname,
    config: RunConfig,
    command: Vec<String>,
    branch: SubprocessBranch,
    poll_interval: Duration,
}

impl WorkerProcess {
    /// Prepares (does not start) a worker for `hostname` with the effective `config`.
    pub fn new(app: App, hostname: &str, config: RunConfig) -> Self {
        let hostname = Hostname::canonical(hostname);
        let command = config.worker_command(&hostname);
        let branch = SubprocessBranch::new(app.full_command(&command));
        Self {
            app,
            hostname,
            config,
            command,
            branch,
            poll_interval: READY_POLL_INTERVAL,
        }
    }

    /// Overrides the readiness poll interval (at least 10ms).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn hostname(&self) -> &Hostname {
        &self.hostname
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Worker sub-command.
    pub fn command(&self) -> &[String] {
        &self.command
    }

    /// Complete argv.
    pub fn full_command(&self) -> &[String] {
        self.branch.argv()
    }

    pub fn pid(&self) -> Option<u32> {
        self.branch.pid()
    }

    /// Launches the process unless it is already running.
    pub fn start(&mut self) -> Result<(), BranchError> {
        if self.branch.is_alive() {
            return Ok(());
        }
        self.branch.start()?;
        tracing::info!(hostname = %self.hostname, pid = self.branch.pid(), "worker process launched");
        Ok(())
    }

    pub fn is_running(&mut self) -> bool {
        self.branch.is_alive()
    }

    /// Pings this worker; `None` if it did not answer.
    pub async fn ping(&self) -> Result<Option<Value>, ControlError> {
        let target = [self.hostname.to_string()];
        let mut replies = self.app.control().ping(&target).await?;
        Ok(replies
            .remove(self.hostname.as_str())
            .filter(|reply| !reply.is_null()))
    }

    /// True iff the worker answers a ping. Control-API failures count as not ready.
    pub async fn is_ready(&self) -> bool {
        match self.ping().await {
            Ok(reply) => reply.is_some(),
            Err(err) => {
                tracing::debug!(hostname = %self.hostname, error = %err, label = err.as_label(), "readiness ping failed");
                false
            }
        }
    }

    /// Polls until the worker is ready (`true`) or its process is gone (`false`).
    ///
    /// Unbounded; see [`wait_for_ready_within`](Self::wait_for_ready_within).
    pub async fn wait_for_ready(&mut self) -> bool {
        loop {
            if !self.is_running() {
                return false;
            }
            if self.is_ready().await {
                return true;
            }
            time::sleep(self.poll_interval).await;
        }
    }

    /// [`wait_for_ready`](Self::wait_for_ready) with a deadline; `false` when it passes.
    pub async fn wait_for_ready_within(&mut self, limit: Duration) -> bool {
        time::timeout(limit, self.wait_for_ready())
            .await
            .unwrap_or(false)
    }

    /// Requests a graceful shutdown over the control API, optionally joining.
    ///
    /// A failed request is logged, not returned: the process may still exit on
    /// its own and `join`/`is_running` remain authoritative.
    pub async fn shutdown(&mut self, join: bool, timeout: Option<Duration>) -> Result<(), BranchError> {
        if !self.is_running() {
            return Ok(());
        }
        let target = [self.hostname.to_string()];
        if let Err(err) = self.app.control().shutdown(&target).await {
            tracing::warn!(hostname = %self.hostname, error = %err, label = err.as_label(), "shutdown request failed");
        }
        if join {
            self.join(timeout).await?;
        }
        Ok(())
    }

    /// Waits for the process to exit, at most `timeout` if given.
    pub async fn join(&mut self, timeout: Option<Duration>) -> Result<(), BranchError> {
        if !self.is_running() {
            return Ok(());
        }
        self.branch.join(timeout).await
    }

    /// Kills the process outright.
    pub async fn kill(&mut self) -> Result<(), BranchError> {
        self.branch.terminate().await
    }

    /// Snapshot including a live readiness ping.
    pub async fn info(&mut self) -> WorkerInfo {
        let is_running = self.is_running();
        let is_ready = self.is_ready().await;
        WorkerInfo {
            hostname: self.hostname.to_string(),
            host: self.hostname.host().to_string(),
            node: self.hostname.node().to_string(),
            command: self.command.clone(),
            full_command: self.branch.argv().to_vec(),
            config: self.config.clone(),
            pid: self.branch.pid(),
            is_running,
            is_ready,
        }
    }
}

impl std::fmt::Debug for WorkerProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerProcess")
            .field("hostname", &self.hostname)
            .field("pid", &self.branch.pid())
            .field("command", &self.command)
            .finish()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::control::fake::{self, Behavior};

    const FAST: Duration = Duration::from_millis(20);
    const LONG: Duration = Duration::from_secs(10);

    fn worker(dir: &tempfile::TempDir, behavior: Behavior, node: &str) -> WorkerProcess {
        WorkerProcess::new(fake::app(dir.path(), behavior), node, RunConfig::default())
            .with_poll_interval(FAST)
    }

    #[test]
    fn full_command_wraps_worker_command() {
        let dir = tempfile::tempdir().unwrap();
        let wp = WorkerProcess::new(
            fake::app(dir.path(), Behavior::Serve),
            "w1@box",
            RunConfig::default().with_queues(["q"]),
        );

        let full = wp.full_command();
        assert_eq!(full[0], "sh");
        assert_eq!(&full[4..6], ["-A", "proj"]);
        assert_eq!(&full[6..], wp.command());
        assert_eq!(wp.hostname().as_str(), "w1@box");
    }

    #[tokio::test]
    async fn zero_poll_interval_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let mut wp = WorkerProcess::new(
            fake::app(dir.path(), Behavior::NeverReady),
            "w1@box",
            RunConfig::default(),
        )
        .with_poll_interval(Duration::ZERO);
        assert_eq!(wp.poll_interval(), MIN_POLL_INTERVAL);

        wp.start().unwrap();
        assert!(!wp.wait_for_ready_within(Duration::from_millis(100)).await);
        wp.kill().await.unwrap();
    }

    #[tokio::test]
    async fn becomes_ready_and_shuts_down_over_control_api() {
        let dir = tempfile::tempdir().unwrap();
        let mut wp = worker(&dir, Behavior::Serve, "w1@box");
        assert!(!wp.is_running());

        wp.start().unwrap();
        assert!(wp.wait_for_ready_within(LONG).await);

        let info = wp.info().await;
        assert!(info.is_running && info.is_ready);
        assert_eq!(info.hostname, "w1@box");
        assert_eq!(info.node, "w1");

        wp.shutdown(true, Some(LONG)).await.unwrap();
        assert!(!wp.is_running());
        assert!(!wp.is_ready().await);
    }

    #[tokio::test]
    async fn crashed_process_is_never_ready() {
        let dir = tempfile::tempdir().unwrap();
        let mut wp = worker(&dir, Behavior::Crash, "w1@box");
        wp.start().unwrap();
        assert!(!wp.wait_for_ready().await);
        assert!(!wp.is_running());
    }

    #[tokio::test]
    async fn readiness_deadline_then_kill() {
        let dir = tempfile::tempdir().unwrap();
        let mut wp = worker(&dir, Behavior::NeverReady, "w1@box");
        wp.start().unwrap();

        assert!(!wp.wait_for_ready_within(Duration::from_millis(150)).await);
        assert!(wp.is_running());

        wp.kill().await.unwrap();
        assert!(!wp.is_running());
    }

    #[tokio::test]
    async fn start_while_running_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut wp = worker(&dir, Behavior::NeverReady, "w1@box");
        wp.start().unwrap();
        let pid = wp.pid();
        wp.start().unwrap();
        assert_eq!(wp.pid(), pid);
        wp.kill().await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_and_join_before_start_are_noops() {
        let dir = tempfile::tempdir().unwrap();
        let mut wp = worker(&dir, Behavior::Serve, "w1@box");
        wp.shutdown(true, Some(FAST)).await.unwrap();
        wp.join(None).await.unwrap();
        assert!(!dir.path().join("w1@box.down").exists());
    }
}
