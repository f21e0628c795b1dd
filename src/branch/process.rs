//! # Child-process branch running an entry point of this program.
//!
//! [`ProcessBranch`] re-launches the current executable with the entry name
//! in [`ENTRY_ENV`]. A program that launches such children must check
//! [`current_entry`] early in its own `main` and dispatch to the named entry
//! instead of its normal behavior. The `workvisor` binary defines no entries
//! and refuses to run when one is set.
//!
//! ```text
//! parent: ProcessBranch::new("reindex").start()
//!           └─► spawn current_exe  (WORKVISOR_BRANCH_ENTRY=reindex, args...)
//! child:  main() ─► current_entry() == Some("reindex") ─► run entry, exit
//! ```
//!
//! Unlike [`SubprocessBranch`](super::SubprocessBranch) the child is bound to
//! the handle: dropping a running `ProcessBranch` kills it.

use std::env;
use std::ffi::OsString;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::child::ChildSlot;
use super::unit::Branch;
use crate::error::BranchError;

/// Environment variable carrying the entry point name into the child.
pub const ENTRY_ENV: &str = "WORKVISOR_BRANCH_ENTRY";

/// Returns the entry point this process was launched for, if it is a branch child.
pub fn current_entry() -> Option<String> {
    env::var(ENTRY_ENV).ok().filter(|entry| !entry.is_empty())
}

/// Branch running a named entry point in a child copy of the current executable.
pub struct ProcessBranch {
    entry: String,
    args: Vec<OsString>,
    envs: Vec<(OsString, OsString)>,
    slot: ChildSlot,
}

impl ProcessBranch {
    /// Creates an unstarted branch for `entry`.
    pub fn new(entry: impl Into<String>) -> Self {
        Self {
            entry: entry.into(),
            args: Vec::new(),
            envs: Vec::new(),
            slot: ChildSlot::new(),
        }
    }

    /// Appends command-line arguments passed to the child.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Adds an environment variable for the child.
    pub fn with_env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// OS process id while running.
    pub fn pid(&self) -> Option<u32> {
        self.slot.pid()
    }

    /// Exit status once the child has been observed to exit.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.slot.exit_status()
    }
}

#[async_trait]
impl Branch for ProcessBranch {
    fn name(&self) -> &str {
        &self.entry
    }

    fn start(&mut self) -> Result<(), BranchError> {
        if self.slot.is_started() {
            return Err(BranchError::AlreadyStarted {
                name: self.entry.clone(),
            });
        }

        let exe = env::current_exe().map_err(BranchError::CurrentExe)?;
        let mut cmd = Command::new(&exe);
        cmd.args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .env(ENTRY_ENV, &self.entry)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let program = exe.display().to_string();
        self.slot.launch(&mut cmd, &program)
    }

    fn is_alive(&mut self) -> bool {
        self.slot.is_alive(&self.entry)
    }

    async fn join(&mut self, timeout: Option<Duration>) -> Result<(), BranchError> {
        self.slot.join(&self.entry, timeout).await
    }

    async fn terminate(&mut self) -> Result<(), BranchError> {
        self.slot.kill(&self.entry).await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    const SELF_TEST: &str = "branch::process::tests::child_entry_point";

    /// No-op in a normal test run; does the entry's work when re-launched as a branch child.
    #[test]
    fn child_entry_point() {
        match current_entry().as_deref() {
            Some("exit-quickly") => std::process::exit(0),
            Some("hold") => std::thread::sleep(Duration::from_secs(60)),
            _ => {}
        }
    }

    fn self_test_branch(entry: &str) -> ProcessBranch {
        ProcessBranch::new(entry).with_args([SELF_TEST, "--exact", "--test-threads=1"])
    }

    #[tokio::test]
    async fn runs_entry_in_child_of_current_executable() {
        let mut branch = self_test_branch("exit-quickly");
        branch.start().unwrap();
        branch.join(Some(Duration::from_secs(30))).await.unwrap();

        assert!(!branch.is_alive());
        assert_eq!(branch.exit_status().map(|s| s.success()), Some(true));
    }

    #[tokio::test]
    async fn terminate_kills_running_child() {
        let mut branch = self_test_branch("hold");
        branch.start().unwrap();
        assert!(branch.is_alive());
        assert!(matches!(
            branch.start(),
            Err(BranchError::AlreadyStarted { .. })
        ));

        branch.terminate().await.unwrap();
        assert!(!branch.is_alive());
        assert_eq!(branch.exit_status().map(|s| s.success()), Some(false));
    }
}
