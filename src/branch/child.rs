//! Shared state machine for the two process-backed branches.

use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::time;

use crate::error::BranchError;

enum State {
    Unstarted,
    Running(Child),
    Exited(ExitStatus),
}

/// One OS child process moving through `Unstarted → Running → Exited`.
pub(super) struct ChildSlot {
    state: State,
}

impl ChildSlot {
    pub(super) fn new() -> Self {
        Self {
            state: State::Unstarted,
        }
    }

    pub(super) fn is_started(&self) -> bool {
        !matches!(self.state, State::Unstarted)
    }

    /// Spawns `cmd`. Caller checks `is_started` first.
    pub(super) fn launch(&mut self, cmd: &mut Command, program: &str) -> Result<(), BranchError> {
        let child = cmd.spawn().map_err(|source| BranchError::Spawn {
            program: program.to_string(),
            source,
        })?;
        tracing::debug!(pid = child.id(), program, "branch process spawned");
        self.state = State::Running(child);
        Ok(())
    }

    pub(super) fn pid(&self) -> Option<u32> {
        match &self.state {
            State::Running(child) => child.id(),
            _ => None,
        }
    }

    pub(super) fn exit_status(&self) -> Option<ExitStatus> {
        match &self.state {
            State::Exited(status) => Some(*status),
            _ => None,
        }
    }

    /// Polls the child without blocking; records the exit status when it is gone.
    pub(super) fn is_alive(&mut self, name: &str) -> bool {
        let State::Running(child) = &mut self.state else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                self.state = State::Exited(status);
                false
            }
            Err(err) => {
                tracing::warn!(branch = name, error = %err, "cannot poll branch process");
                false
            }
        }
    }

    pub(super) async fn join(
        &mut self,
        name: &str,
        timeout: Option<Duration>,
    ) -> Result<(), BranchError> {
        let State::Running(child) = &mut self.state else {
            return Ok(());
        };

        let waited = match timeout {
            Some(limit) => match time::timeout(limit, child.wait()).await {
                Ok(res) => res,
                Err(_elapsed) => return Ok(()),
            },
            None => child.wait().await,
        };

        let status = waited.map_err(|source| BranchError::Wait {
            name: name.to_string(),
            source,
        })?;
        self.state = State::Exited(status);
        Ok(())
    }

    /// Kills the child (SIGKILL on unix) and reaps it.
    pub(super) async fn kill(&mut self, name: &str) -> Result<(), BranchError> {
        let State::Running(child) = &mut self.state else {
            return Ok(());
        };

        // Fails with InvalidInput if the child already exited; the wait below still reaps it.
        if let Err(err) = child.start_kill() {
            tracing::debug!(branch = name, error = %err, "kill on exited branch process");
        }
        let status = child.wait().await.map_err(|source| BranchError::Wait {
            name: name.to_string(),
            source,
        })?;
        self.state = State::Exited(status);
        Ok(())
    }
}
