use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Introspection queries a worker answers. The set is closed: there is no way
/// to run arbitrary code on a worker through the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Inspection {
    /// Queues the worker consumes from.
    ActiveQueues,
    /// Tasks currently executing.
    Active,
    /// ETA/countdown tasks waiting for their time.
    Scheduled,
    /// Tasks prefetched but not yet started.
    Reserved,
    /// Task names the worker knows.
    Registered,
    /// Worker statistics.
    Stats,
}

impl Inspection {
    /// Every query, in declaration order.
    pub const ALL: [Inspection; 6] = [
        Inspection::ActiveQueues,
        Inspection::Active,
        Inspection::Scheduled,
        Inspection::Reserved,
        Inspection::Registered,
        Inspection::Stats,
    ];

    /// Name of the query on the worker framework's CLI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Inspection::ActiveQueues => "active_queues",
            Inspection::Active => "active",
            Inspection::Scheduled => "scheduled",
            Inspection::Reserved => "reserved",
            Inspection::Registered => "registered",
            Inspection::Stats => "stats",
        }
    }
}

impl fmt::Display for Inspection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown inspection name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown inspection `{0}`")]
pub struct UnknownInspection(pub String);

impl FromStr for Inspection {
    type Err = UnknownInspection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Inspection::ALL
            .into_iter()
            .find(|q| q.as_str() == s)
            .ok_or_else(|| UnknownInspection(s.to_string()))
    }
}
