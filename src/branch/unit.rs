//! # Execution unit contract.
//!
//! Every variant owns exactly one OS-level resource and goes through
//! `Unstarted → Running → Terminated` once. Implementations must make `join`
//! and `terminate` no-ops before `start`, and report `is_alive() == false`
//! until `start` succeeds.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::BranchError;

/// Uniform start/poll/join/terminate handle over a concurrent activity.
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use workvisor::{Branch, SubprocessBranch};
///
/// # async fn demo() -> Result<(), workvisor::BranchError> {
/// let mut branch = SubprocessBranch::new(["sleep", "1"]);
/// branch.start()?;
/// assert!(branch.is_alive());
/// branch.join(Some(Duration::from_secs(5))).await?;
/// assert!(!branch.is_alive());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Branch: Send + 'static {
    /// Human-readable name (thread name, entry point or program).
    fn name(&self) -> &str;

    /// Launches the activity.
    ///
    /// Calling `start` twice is a caller error and returns
    /// [`BranchError::AlreadyStarted`]; the running activity is not touched.
    fn start(&mut self) -> Result<(), BranchError>;

    /// Returns `true` while the activity has not completed. `false` before `start`.
    fn is_alive(&mut self) -> bool;

    /// Waits until the activity finishes or `timeout` elapses.
    ///
    /// A timeout is not an error: the activity may still be alive afterwards,
    /// check [`Branch::is_alive`]. No-op if never started.
    async fn join(&mut self, timeout: Option<Duration>) -> Result<(), BranchError>;

    /// Requests a forcible stop. No-op if never started or already finished.
    async fn terminate(&mut self) -> Result<(), BranchError>;
}

/// Owned, type-erased branch.
pub type BranchBox = Box<dyn Branch>;
