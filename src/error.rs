//! Error types used by the workvisor control plane.
//!
//! This module defines one enum per concern:
//!
//! - [`BranchError`]: failures of an execution unit (spawn, wait, misuse).
//! - [`ConfigError`]: reading, parsing or writing persisted worker configuration.
//! - [`ControlError`]: failures talking to the external control API.
//! - [`CenterError`]: everything the [`ControlCenter`](crate::ControlCenter) surfaces as a hard error.
//!
//! Operational outcomes (duplicate hostname, worker never became ready) are **not**
//! errors; they are reported as `Ok(None)` by the control center.
//!
//! All enums provide `as_label` for logs/metrics.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// # Errors produced by execution units.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BranchError {
    /// `start` was called on a branch that was already started (caller error).
    #[error("branch `{name}` already started")]
    AlreadyStarted {
        /// Branch name.
        name: String,
    },

    /// The underlying process could not be spawned.
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        /// Program that failed to launch.
        program: String,
        /// OS error.
        #[source]
        source: io::Error,
    },

    /// Waiting on or signalling the underlying process failed.
    #[error("failed to wait on branch `{name}`: {source}")]
    Wait {
        /// Branch name.
        name: String,
        /// OS error.
        #[source]
        source: io::Error,
    },

    /// Path of the current executable could not be resolved (child-process variant).
    #[error("cannot resolve current executable: {0}")]
    CurrentExe(#[source] io::Error),
}

impl BranchError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use workvisor::BranchError;
    ///
    /// let err = BranchError::AlreadyStarted { name: "worker".into() };
    /// assert_eq!(err.as_label(), "branch_already_started");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BranchError::AlreadyStarted { .. } => "branch_already_started",
            BranchError::Spawn { .. } => "branch_spawn",
            BranchError::Wait { .. } => "branch_wait",
            BranchError::CurrentExe(_) => "branch_current_exe",
        }
    }
}

/// # Errors produced while loading or saving persisted configuration.
///
/// Any of these at construction time is fatal: no worker is started.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("cannot read config {path:?}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// OS error.
        #[source]
        source: io::Error,
    },

    /// Config file is not valid JSON or does not match the expected shape.
    #[error("malformed config {origin}: {source}")]
    Parse {
        /// Where the document came from (path or `inline`).
        origin: String,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },

    /// Config file could not be written.
    #[error("cannot write config {path:?}: {source}")]
    Write {
        /// File path.
        path: PathBuf,
        /// OS error.
        #[source]
        source: io::Error,
    },

    /// Document parsed but is structurally wrong (e.g. top level is not an object).
    #[error("invalid config {origin}: {reason}")]
    Shape {
        /// Where the document came from (path or `inline`).
        origin: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "config_read",
            ConfigError::Parse { .. } => "config_parse",
            ConfigError::Write { .. } => "config_write",
            ConfigError::Shape { .. } => "config_shape",
        }
    }
}

/// # Errors produced by a [`ControlApi`](crate::ControlApi) implementation.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ControlError {
    /// Control command could not be launched.
    #[error("failed to run control command `{command}`: {source}")]
    Spawn {
        /// Rendered command line.
        command: String,
        /// OS error.
        #[source]
        source: io::Error,
    },

    /// Control command exited unsuccessfully.
    #[error("control command `{command}` failed (status {status:?}): {stderr}")]
    Command {
        /// Rendered command line.
        command: String,
        /// Exit code, if any.
        status: Option<i32>,
        /// Captured standard error (trimmed).
        stderr: String,
    },

    /// Reply could not be decoded.
    #[error("cannot decode control reply: {0}")]
    Decode(String),
}

impl ControlError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ControlError::Spawn { .. } => "control_spawn",
            ControlError::Command { .. } => "control_command",
            ControlError::Decode(_) => "control_decode",
        }
    }
}

/// # Hard errors surfaced by the control center.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CenterError {
    /// Configuration could not be loaded or saved.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A worker process could not be launched or waited on.
    #[error(transparent)]
    Branch(#[from] BranchError),

    /// The control API failed in a way the caller must see (e.g. inspect).
    #[error(transparent)]
    Control(#[from] ControlError),
}

impl CenterError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use workvisor::{BranchError, CenterError};
    ///
    /// let err = CenterError::from(BranchError::AlreadyStarted { name: "w".into() });
    /// assert_eq!(err.as_label(), "branch_already_started");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            CenterError::Config(e) => e.as_label(),
            CenterError::Branch(e) => e.as_label(),
            CenterError::Control(e) => e.as_label(),
        }
    }
}
