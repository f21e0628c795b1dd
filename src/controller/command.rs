use std::time::Duration;

use tokio::sync::oneshot;

use crate::control::{Inspection, Replies};
use crate::core::{InfoReply, Nodes, StopReport};
use crate::error::CenterError;
use crate::workers::RunConfig;

pub(crate) type Reply<T> = oneshot::Sender<Result<T, CenterError>>;

/// One queued control-center operation and the channel its result goes back on.
pub(crate) enum Command {
    StartWorker {
        node: String,
        config: RunConfig,
        wait_for_ready: bool,
        reply: Reply<Option<String>>,
    },
    StopWorkers {
        nodes: Nodes,
        join: bool,
        timeout: Option<Duration>,
        reply: Reply<StopReport>,
    },
    Join {
        nodes: Nodes,
        timeout: Option<Duration>,
        reply: Reply<StopReport>,
    },
    Kill {
        nodes: Nodes,
        reply: Reply<StopReport>,
    },
    Info {
        nodes: Nodes,
        reply: Reply<InfoReply>,
    },
    Hostnames {
        reply: Reply<Vec<String>>,
    },
    Inspect {
        query: Inspection,
        reply: Reply<Replies>,
    },
    ActiveQueueNames {
        reply: Reply<Vec<String>>,
    },
    Terminate {
        timeout: Option<Duration>,
        reply: Reply<StopReport>,
    },
}

impl Command {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            Command::StartWorker { .. } => "start_worker",
            Command::StopWorkers { .. } => "stop_workers",
            Command::Join { .. } => "join",
            Command::Kill { .. } => "kill",
            Command::Info { .. } => "info",
            Command::Hostnames { .. } => "hostnames",
            Command::Inspect { .. } => "inspect",
            Command::ActiveQueueNames { .. } => "active_queue_names",
            Command::Terminate { .. } => "terminate",
        }
    }
}
