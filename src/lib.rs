//! # workvisor
//!
//! **Workvisor** is a control plane for task-queue worker processes.
//!
//! It launches named workers as child processes of the framework's CLI,
//! tracks them under canonical `node@host` hostnames, waits for them to answer
//! pings, stops them through the framework's control API and keeps their launch
//! configuration in a JSON file across restarts.
//!
//! ## Architecture
//! ```text
//!   PersistedConfig ◄── load/save ──► ConfigStore (JSON file)
//!          │
//!          ▼ bootstrap
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  ControlCenter                                                    │
//! │  - Registry (hostname → WorkerProcess, insertion ordered)         │
//! │  - working config (global defaults + per-worker overrides)        │
//! │  - Bus (broadcast events)                                         │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!  ┌───────────────┐ ┌───────────────┐ ┌───────────────┐       │
//!  │ WorkerProcess │ │ WorkerProcess │ │ WorkerProcess │       │
//!  │ (subprocess)  │ │ (subprocess)  │ │ (subprocess)  │       │
//!  └──────┬────────┘ └──────┬────────┘ └──────┬────────┘       │
//!         └──── ping / shutdown / inspect ────┘                │
//!                           ▼                                  ▼
//!                    dyn ControlApi               listener ──► SubscriberSet
//!                  (CliControl in production)                  ├─► LogWriter
//!                                                              └─► custom
//! ```
//!
//! ### Lifecycle
//! ```text
//! build() ─► load config ─► start(run_event_loop)
//!                             ├─► bootstrap: start every persisted worker
//!                             ├─► supervise: signal | stop token | exit sweep
//!                             └─► terminate: persist, stop all, bounded join, kill the rest
//! ```
//!
//! ## Features
//! | Area            | Description                                             | Key types                                    |
//! |-----------------|---------------------------------------------------------|----------------------------------------------|
//! | **Center**      | Start, stop, join, kill and inspect workers.            | [`ControlCenter`], [`CenterConfig`], [`Nodes`] |
//! | **Workers**     | Hostnames, launch options, command lines, snapshots.    | [`Hostname`], [`RunConfig`], [`WorkerInfo`]  |
//! | **Control**     | Boundary to the framework's remote-control API.         | [`ControlApi`], [`CliControl`], [`Inspection`] |
//! | **Persistence** | JSON document of global and per-worker options.         | [`PersistedConfig`], [`ConfigStore`]         |
//! | **Events**      | Lifecycle events fanned out to subscribers.             | [`Event`], [`Subscribe`], [`LogWriter`]      |
//! | **Branches**    | Uniform handle over threads and processes.              | [`Branch`], [`SubprocessBranch`]             |
//!
//! ## Optional features
//! - `controller` (default): [`Controller`] actor and cloneable [`CenterHandle`]
//!   for sharing one center between tasks.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use workvisor::{App, CenterConfig, CliControl, ControlCenter, RunConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let control = Arc::new(CliControl::new(vec![String::from("celery")], "proj"));
//!     let app = App::new("proj", control);
//!
//!     let mut center = ControlCenter::builder(app, CenterConfig::default()).build()?;
//!     let cfg = RunConfig::default().with_queues(["default"]);
//!     center.start_worker("w1", cfg, true).await?;
//!
//!     // Supervise until SIGINT/SIGTERM, then stop everything.
//!     center.start(true).await?;
//!     Ok(())
//! }
//! ```
mod branch;
mod control;
mod core;
mod error;
mod events;
mod store;
mod subscribers;
mod workers;

// ---- Public re-exports ----

pub use branch::{
    current_entry, Branch, BranchBox, ProcessBranch, SubprocessBranch, ThreadBranch, ENTRY_ENV,
    THREAD_TERMINATE_WAIT,
};
pub use control::{
    parse_replies, CliControl, ControlApi, Inspection, Replies, UnknownInspection,
    DEFAULT_REPLY_TIMEOUT,
};
pub use core::{
    wait_for_shutdown_signal, CenterBuilder, CenterConfig, ControlCenter, InfoReply, Nodes,
    PersistPolicy, StopReport,
};
pub use error::{BranchError, CenterError, ConfigError, ControlError};
pub use events::{Bus, Event, EventKind};
pub use store::{load_initial, ConfigStore, InitConfig, PersistedConfig};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use workers::{
    machine_hostname, App, Hostname, RunConfig, WorkerInfo, WorkerProcess, DEFAULT_ENTRYPOINT,
    DEFAULT_NODE_NAME, DEFAULT_POOL, DEFAULT_QUIET, NODE_SEP, READY_POLL_INTERVAL,
};

// Optional: share one center between tasks through an actor.
// Enabled by default; disable with `--no-default-features`.
#[cfg(feature = "controller")]
mod controller;
#[cfg(feature = "controller")]
pub use controller::{CallError, CenterHandle, Controller, ControllerConfig, Pending, SubmitError};
