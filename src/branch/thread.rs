//! # In-process thread branch.
//!
//! [`ThreadBranch`] runs a blocking closure on Tokio's blocking thread pool.
//! It is meant for lightweight controller-owned background work, never for
//! worker execution.
//!
//! ## Limitation
//! A running thread cannot be interrupted from the outside. `terminate` waits
//! at most [`THREAD_TERMINATE_WAIT`] for the closure to return and then gives
//! up; the thread keeps running if the closure ignores its own stop condition.

use std::mem;
use std::time::Duration;

use async_trait::async_trait;
use tokio::{task::JoinHandle, time};

use super::unit::Branch;
use crate::error::BranchError;

/// How long `terminate` waits for a thread branch before returning.
pub const THREAD_TERMINATE_WAIT: Duration = Duration::from_millis(100);

type Job = Box<dyn FnOnce() + Send + 'static>;

enum State {
    Unstarted(Job),
    Running(JoinHandle<()>),
    Finished,
}

/// Branch backed by a blocking closure.
///
/// `start` must be called from within a Tokio runtime.
pub struct ThreadBranch {
    name: String,
    state: State,
}

impl ThreadBranch {
    /// Creates an unstarted branch around `job`.
    pub fn new<F>(name: impl Into<String>, job: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            name: name.into(),
            state: State::Unstarted(Box::new(job)),
        }
    }
}

#[async_trait]
impl Branch for ThreadBranch {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self) -> Result<(), BranchError> {
        match mem::replace(&mut self.state, State::Finished) {
            State::Unstarted(job) => {
                self.state = State::Running(tokio::task::spawn_blocking(job));
                Ok(())
            }
            other => {
                self.state = other;
                Err(BranchError::AlreadyStarted {
                    name: self.name.clone(),
                })
            }
        }
    }

    fn is_alive(&mut self) -> bool {
        match &self.state {
            State::Running(handle) => !handle.is_finished(),
            _ => false,
        }
    }

    async fn join(&mut self, timeout: Option<Duration>) -> Result<(), BranchError> {
        let State::Running(handle) = &mut self.state else {
            return Ok(());
        };

        let finished = match timeout {
            Some(limit) => time::timeout(limit, &mut *handle).await.ok(),
            None => Some(handle.await),
        };

        if let Some(result) = finished {
            if let Err(err) = result {
                tracing::warn!(branch = %self.name, error = %err, "thread branch ended abnormally");
            }
            self.state = State::Finished;
        }
        Ok(())
    }

    async fn terminate(&mut self) -> Result<(), BranchError> {
        self.join(Some(THREAD_TERMINATE_WAIT)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{mpsc, Arc};

    #[tokio::test]
    async fn not_alive_before_start_and_join_is_noop() {
        let mut branch = ThreadBranch::new("idle", || {});
        assert!(!branch.is_alive());
        branch.join(None).await.unwrap();
        branch.terminate().await.unwrap();
        assert!(!branch.is_alive());
    }

    #[tokio::test]
    async fn runs_job_to_completion() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let mut branch = ThreadBranch::new("job", move || flag.store(true, Ordering::SeqCst));

        branch.start().unwrap();
        branch.join(None).await.unwrap();

        assert!(ran.load(Ordering::SeqCst));
        assert!(!branch.is_alive());
    }

    #[tokio::test]
    async fn second_start_is_rejected() {
        let mut branch = ThreadBranch::new("twice", || {});
        branch.start().unwrap();
        let err = branch.start().unwrap_err();
        assert_eq!(err.as_label(), "branch_already_started");
        branch.join(None).await.unwrap();
    }

    #[tokio::test]
    async fn join_timeout_leaves_thread_alive() {
        let (tx, rx) = mpsc::channel::<()>();
        let mut branch = ThreadBranch::new("blocked", move || {
            let _ = rx.recv();
        });
        branch.start().unwrap();

        branch.join(Some(Duration::from_millis(50))).await.unwrap();
        assert!(branch.is_alive());

        // terminate cannot interrupt; it returns after the bounded wait.
        branch.terminate().await.unwrap();
        assert!(branch.is_alive());

        tx.send(()).unwrap();
        branch.join(Some(Duration::from_secs(5))).await.unwrap();
        assert!(!branch.is_alive());
    }
}
