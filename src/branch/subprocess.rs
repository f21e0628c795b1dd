//! # External subprocess branch.
//!
//! [`SubprocessBranch`] launches an arbitrary program with arguments. Worker
//! processes are always run through this variant.
//!
//! The child inherits stdout/stderr, gets a null stdin, and is **not** killed
//! when the handle is dropped: an external worker outlives a crashed controller
//! and is reconciled by hostname on the next start.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::child::ChildSlot;
use super::unit::Branch;
use crate::error::BranchError;

/// Branch running an external program.
pub struct SubprocessBranch {
    argv: Vec<String>,
    slot: ChildSlot,
}

impl SubprocessBranch {
    /// Creates an unstarted branch; the first element of `argv` is the program.
    ///
    /// An empty `argv` fails at `start` with [`BranchError::Spawn`].
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            slot: ChildSlot::new(),
        }
    }

    /// Full command line (program followed by arguments).
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// OS process id while running.
    pub fn pid(&self) -> Option<u32> {
        self.slot.pid()
    }

    /// Exit status once the process has been observed to exit.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.slot.exit_status()
    }

    fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or("")
    }
}

#[async_trait]
impl Branch for SubprocessBranch {
    fn name(&self) -> &str {
        self.program()
    }

    fn start(&mut self) -> Result<(), BranchError> {
        if self.slot.is_started() {
            return Err(BranchError::AlreadyStarted {
                name: self.program().to_string(),
            });
        }

        let mut cmd = Command::new(self.program());
        cmd.args(self.argv.iter().skip(1))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(false);

        let program = self.program().to_string();
        self.slot.launch(&mut cmd, &program)
    }

    fn is_alive(&mut self) -> bool {
        let name = self.program().to_string();
        self.slot.is_alive(&name)
    }

    async fn join(&mut self, timeout: Option<Duration>) -> Result<(), BranchError> {
        let name = self.program().to_string();
        self.slot.join(&name, timeout).await
    }

    async fn terminate(&mut self) -> Result<(), BranchError> {
        let name = self.program().to_string();
        self.slot.kill(&name).await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn join_and_terminate_before_start_are_noops() {
        let mut branch = SubprocessBranch::new(["sh", "-c", "exit 0"]);
        assert!(!branch.is_alive());
        branch.join(Some(Duration::from_millis(10))).await.unwrap();
        branch.terminate().await.unwrap();
        assert!(branch.exit_status().is_none());
    }

    #[tokio::test]
    async fn short_process_exits_and_is_reaped() {
        let mut branch = SubprocessBranch::new(["sh", "-c", "exit 3"]);
        branch.start().unwrap();
        branch.join(None).await.unwrap();

        assert!(!branch.is_alive());
        assert_eq!(branch.exit_status().and_then(|s| s.code()), Some(3));
    }

    #[tokio::test]
    async fn join_timeout_keeps_process_alive_until_terminated() {
        let mut branch = SubprocessBranch::new(["sh", "-c", "exec sleep 30"]);
        branch.start().unwrap();
        assert!(branch.pid().is_some());

        branch.join(Some(Duration::from_millis(50))).await.unwrap();
        assert!(branch.is_alive());

        branch.terminate().await.unwrap();
        assert!(!branch.is_alive());
        assert!(!branch.exit_status().unwrap().success());
    }

    #[tokio::test]
    async fn double_start_is_caller_error() {
        let mut branch = SubprocessBranch::new(["sh", "-c", "exec sleep 30"]);
        branch.start().unwrap();
        assert!(matches!(
            branch.start(),
            Err(BranchError::AlreadyStarted { .. })
        ));
        branch.terminate().await.unwrap();
    }

    #[tokio::test]
    async fn missing_program_fails_to_spawn() {
        let mut branch = SubprocessBranch::new(["/nonexistent/workvisor-test-binary"]);
        let err = branch.start().unwrap_err();
        assert_eq!(err.as_label(), "branch_spawn");
        assert!(!branch.is_alive());
    }
}
