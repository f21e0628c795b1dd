use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use super::inspection::Inspection;
use crate::error::ControlError;

/// Replies keyed by canonical hostname. Nodes that did not answer are absent.
pub type Replies = BTreeMap<String, Value>;

/// # External control API of the worker framework.
///
/// The control plane never talks to workers in-process: liveness pings,
/// shutdown requests and introspection all go through this boundary.
///
/// Implementations must be cheap to share (`Arc<dyn ControlApi>`) and safe to
/// call concurrently.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use serde_json::json;
/// use workvisor::{ControlApi, ControlError, Inspection, Replies};
///
/// struct AlwaysUp;
///
/// #[async_trait]
/// impl ControlApi for AlwaysUp {
///     async fn ping(&self, hostnames: &[String]) -> Result<Replies, ControlError> {
///         Ok(hostnames.iter().map(|h| (h.clone(), json!({"ok": "pong"}))).collect())
///     }
///     async fn shutdown(&self, _hostnames: &[String]) -> Result<(), ControlError> {
///         Ok(())
///     }
///     async fn inspect(&self, _: &[String], _: Inspection) -> Result<Replies, ControlError> {
///         Ok(Replies::new())
///     }
/// }
/// ```
#[async_trait]
pub trait ControlApi: Send + Sync + 'static {
    /// Liveness ping; returns one reply per node that answered.
    async fn ping(&self, hostnames: &[String]) -> Result<Replies, ControlError>;

    /// Asks the named nodes to shut down gracefully.
    async fn shutdown(&self, hostnames: &[String]) -> Result<(), ControlError>;

    /// Runs a named inspection on the given nodes.
    async fn inspect(&self, hostnames: &[String], query: Inspection) -> Result<Replies, ControlError>;
}
