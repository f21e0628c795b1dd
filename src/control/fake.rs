//! Test double: a shell-script worker plus a control API that talks to it
//! through marker files in a scratch directory.
//!
//! ```text
//! <h>.up    written by the worker once "ready"; holds its --queues value
//! <h>.down  written by FakeControl::shutdown; the worker exits when it appears
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{ControlApi, Inspection, Replies};
use crate::error::ControlError;
use crate::workers::App;

#[derive(Debug, Clone, Copy)]
pub(crate) enum Behavior {
    /// Becomes ready, exits on shutdown.
    Serve,
    /// Exits immediately with status 1.
    Crash,
    /// Runs but never answers pings.
    NeverReady,
    /// Becomes ready but ignores shutdown.
    Stubborn,
}

const PARSE_ARGS: &str = r#"h=; q=; prev=
for a in "$@"; do
  case "$prev" in --hostname) h=$a ;; --queues) q=$a ;; esac
  prev=$a
done"#;

fn script(dir: &Path, behavior: Behavior) -> String {
    let dir = dir.display();
    match behavior {
        Behavior::Serve => format!(
            "{PARSE_ARGS}\nprintf '%s' \"$q\" > '{dir}'/\"$h.up\"\n\
             while [ ! -e '{dir}'/\"$h.down\" ]; do sleep 0.05; done"
        ),
        Behavior::Crash => "exit 1".to_string(),
        Behavior::NeverReady => "exec sleep 30".to_string(),
        Behavior::Stubborn => format!(
            "{PARSE_ARGS}\nprintf '%s' \"$q\" > '{dir}'/\"$h.up\"\nexec sleep 30"
        ),
    }
}

/// Entry point whose workers follow `behavior`.
pub(crate) fn entrypoint(dir: &Path, behavior: Behavior) -> Vec<String> {
    vec![
        "sh".to_string(),
        "-c".to_string(),
        script(dir, behavior),
        "fake-worker".to_string(),
    ]
}

/// App wired to a [`FakeControl`] over `dir`.
pub(crate) fn app(dir: &Path, behavior: Behavior) -> App {
    App::new("proj", Arc::new(FakeControl::new(dir))).with_entrypoint(entrypoint(dir, behavior))
}

pub(crate) struct FakeControl {
    dir: PathBuf,
}

impl FakeControl {
    pub(crate) fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    fn marker(&self, hostname: &str, ext: &str) -> PathBuf {
        self.dir.join(format!("{hostname}.{ext}"))
    }

    fn serving(&self, hostname: &str) -> Option<String> {
        if self.marker(hostname, "down").exists() {
            return None;
        }
        fs::read_to_string(self.marker(hostname, "up")).ok()
    }
}

fn io_failure(source: io::Error) -> ControlError {
    ControlError::Spawn {
        command: "fake-control".to_string(),
        source,
    }
}

#[async_trait]
impl ControlApi for FakeControl {
    async fn ping(&self, hostnames: &[String]) -> Result<Replies, ControlError> {
        Ok(hostnames
            .iter()
            .filter(|h| self.serving(h).is_some())
            .map(|h| (h.clone(), json!({"ok": "pong"})))
            .collect())
    }

    async fn shutdown(&self, hostnames: &[String]) -> Result<(), ControlError> {
        for h in hostnames {
            fs::write(self.marker(h, "down"), b"").map_err(io_failure)?;
        }
        Ok(())
    }

    async fn inspect(&self, hostnames: &[String], query: Inspection) -> Result<Replies, ControlError> {
        let mut replies = Replies::new();
        for h in hostnames {
            let Some(queues) = self.serving(h) else {
                continue;
            };
            let reply = match query {
                Inspection::ActiveQueues => Value::Array(
                    queues
                        .split(',')
                        .filter(|q| !q.is_empty())
                        .map(|q| json!({"name": q}))
                        .collect(),
                ),
                _ => json!({}),
            };
            replies.insert(h.clone(), reply);
        }
        Ok(replies)
    }
}
