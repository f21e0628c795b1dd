//! Control-center core: registry, supervision and lifecycle.
//!
//! - `center`: the [`ControlCenter`] and its operations;
//! - `builder`: configuration loading and event wiring;
//! - `config`: [`CenterConfig`] and [`PersistPolicy`];
//! - `registry`: insertion-ordered worker map;
//! - `nodes`: node-subset selection;
//! - `shutdown`: OS termination signals.

mod builder;
mod center;
mod config;
mod nodes;
mod registry;
mod report;
mod shutdown;

pub use builder::CenterBuilder;
pub use center::ControlCenter;
pub use config::{CenterConfig, PersistPolicy};
pub use nodes::Nodes;
pub use report::{InfoReply, StopReport};
pub use shutdown::wait_for_shutdown_signal;
