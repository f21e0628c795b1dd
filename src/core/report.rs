use serde::Serialize;

use crate::workers::WorkerInfo;

/// Outcome of a stop, join or kill over a set of nodes.
///
/// Every list is in registry order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopReport {
    /// Nodes a shutdown request was sent to.
    pub requested: Vec<String>,
    /// Nodes confirmed exited and deregistered.
    pub removed: Vec<String>,
    /// Nodes still running after the join deadline; they stay registered.
    pub still_running: Vec<String>,
}

impl StopReport {
    /// True when no joined node is left running.
    pub fn is_complete(&self) -> bool {
        self.still_running.is_empty()
    }
}

/// Answer to [`ControlCenter::info`](crate::ControlCenter::info).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InfoReply {
    /// A single node was asked for; `None` if it is not registered.
    Single(Option<WorkerInfo>),
    /// Several or all nodes, in registry order. Unknown nodes are skipped.
    Many(Vec<WorkerInfo>),
}

impl InfoReply {
    /// Flattens either shape into a list, keeping registry order.
    pub fn into_vec(self) -> Vec<WorkerInfo> {
        match self {
            InfoReply::Single(info) => info.into_iter().collect(),
            InfoReply::Many(all) => all,
        }
    }

    /// The single answer, if this is one.
    pub fn into_single(self) -> Option<WorkerInfo> {
        match self {
            InfoReply::Single(info) => info,
            InfoReply::Many(_) => None,
        }
    }
}
