use thiserror::Error;

use crate::error::CenterError;

/// Command could not be queued for the controller.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// Queue is full (retry later or use the async variant).
    #[error("controller queue full")]
    Full,

    /// Controller stopped (closed, or its task ended).
    #[error("controller closed")]
    Closed,
}

/// Failure of a call made through a [`CenterHandle`](super::CenterHandle).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CallError {
    /// The command never reached the controller or got no reply.
    #[error(transparent)]
    Submit(#[from] SubmitError),

    /// The control center returned an error.
    #[error(transparent)]
    Center(#[from] CenterError),
}

impl CallError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CallError::Submit(SubmitError::Full) => "controller_full",
            CallError::Submit(SubmitError::Closed) => "controller_closed",
            CallError::Center(e) => e.as_label(),
        }
    }
}
