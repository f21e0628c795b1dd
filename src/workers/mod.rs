//! # Worker side of the control plane.
//!
//! - [`Hostname`]: canonical `node@host` identity.
//! - [`RunConfig`]: launch options and command derivation.
//! - [`App`]: app selector, entry point and control API shared by workers.
//! - [`WorkerProcess`]: one supervised worker subprocess.
//! - [`WorkerInfo`]: serializable snapshot of a worker.

mod app;
mod hostname;
mod info;
mod process;
mod run_config;

pub use app::{App, DEFAULT_ENTRYPOINT};
pub use hostname::{machine_hostname, Hostname, DEFAULT_NODE_NAME, NODE_SEP};
pub use info::WorkerInfo;
pub use process::{WorkerProcess, READY_POLL_INTERVAL};
pub use run_config::{RunConfig, DEFAULT_POOL, DEFAULT_QUIET};
