//! Serialized access to a [`ControlCenter`](crate::ControlCenter) from many tasks.
//!
//! [`Controller::spawn`] moves the center into an actor task and hands back a
//! cloneable [`CenterHandle`]. Every handle method queues one command; the
//! actor runs them in order against the center it owns.

mod command;
mod config;
mod core;
mod error;

pub use config::ControllerConfig;
pub use core::{CenterHandle, Controller, Pending};
pub use error::{CallError, SubmitError};
