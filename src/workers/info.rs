use serde::{Deserialize, Serialize};

use super::run_config::RunConfig;

/// Point-in-time snapshot of one worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerInfo {
    /// Canonical `node@host`.
    pub hostname: String,
    pub host: String,
    pub node: String,
    /// Worker sub-command (without entry point and app selector).
    pub command: Vec<String>,
    /// Complete argv the process was launched with.
    pub full_command: Vec<String>,
    /// Effective configuration (global defaults merged with the node override).
    pub config: RunConfig,
    /// OS process id while running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    pub is_running: bool,
    pub is_ready: bool,
}
