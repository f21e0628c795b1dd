//! # Boundary to the worker framework's control API.
//!
//! - [`ControlApi`]: ping / shutdown / inspect against named workers.
//! - [`Inspection`]: the closed set of introspection queries.
//! - [`CliControl`]: implementation driving the framework's own CLI.

mod api;
mod cli;
mod inspection;

#[cfg(test)]
pub(crate) mod fake;

pub use api::{ControlApi, Replies};
pub use cli::{parse_replies, CliControl, DEFAULT_REPLY_TIMEOUT};
pub use inspection::{Inspection, UnknownInspection};
