//! # Control API backed by the worker framework's command line.
//!
//! Every call runs one short-lived control process and decodes its JSON output:
//!
//! ```text
//! <entrypoint...> -A <app> inspect <query> --destination h1,h2 --json --timeout <s>
//! <entrypoint...> -A <app> control shutdown --destination h1,h2
//! ```
//!
//! `ping` is the `ping` inspection. A run that fails only because no node
//! answered is treated as an empty reply set.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tokio::time;

use super::api::{ControlApi, Replies};
use super::inspection::Inspection;
use crate::error::ControlError;

/// How long nodes are given to reply to a broadcast.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(1);

/// Extra time allowed for the control process itself (startup, broker connect).
const PROCESS_GRACE: Duration = Duration::from_secs(10);

/// [`ControlApi`] that shells out to `<entrypoint> -A <app> inspect|control ...`.
#[derive(Debug, Clone)]
pub struct CliControl {
    entrypoint: Vec<String>,
    app: String,
    reply_timeout: Duration,
}

impl CliControl {
    /// Creates a control client for `app` launched through `entrypoint`.
    pub fn new<I, S>(entrypoint: I, app: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entrypoint: entrypoint.into_iter().map(Into::into).collect(),
            app: app.into(),
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
        }
    }

    /// Sets how long nodes are given to reply.
    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    /// Full argv of an inspection.
    pub fn inspect_argv(&self, query: &str, hostnames: &[String]) -> Vec<String> {
        let mut argv = self.base_argv();
        argv.extend([
            "inspect".to_string(),
            query.to_string(),
            "--destination".to_string(),
            hostnames.join(","),
            "--json".to_string(),
            "--timeout".to_string(),
            self.reply_timeout.as_secs_f64().to_string(),
        ]);
        argv
    }

    /// Full argv of a shutdown broadcast.
    pub fn shutdown_argv(&self, hostnames: &[String]) -> Vec<String> {
        let mut argv = self.base_argv();
        argv.extend([
            "control".to_string(),
            "shutdown".to_string(),
            "--destination".to_string(),
            hostnames.join(","),
        ]);
        argv
    }

    fn base_argv(&self) -> Vec<String> {
        let mut argv = self.entrypoint.clone();
        argv.extend(["-A".to_string(), self.app.clone()]);
        argv
    }

    async fn run(&self, argv: Vec<String>) -> Result<String, ControlError> {
        let command = argv.join(" ");
        let Some((program, args)) = argv.split_first() else {
            return Err(ControlError::Spawn {
                command,
                source: io::Error::new(io::ErrorKind::InvalidInput, "empty entry point"),
            });
        };

        let mut cmd = Command::new(program);
        cmd.args(args).stdin(Stdio::null()).kill_on_drop(true);

        let limit = self.reply_timeout + PROCESS_GRACE;
        let output = match time::timeout(limit, cmd.output()).await {
            Ok(res) => res.map_err(|source| ControlError::Spawn {
                command: command.clone(),
                source,
            })?,
            Err(_elapsed) => {
                return Err(ControlError::Command {
                    command,
                    status: None,
                    stderr: format!("no result within {limit:?}"),
                })
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if no_nodes_replied(&stdout) || no_nodes_replied(&stderr) {
            tracing::debug!(%command, "no nodes replied");
            return Ok(String::new());
        }
        Err(ControlError::Command {
            command,
            status: output.status.code(),
            stderr,
        })
    }

    async fn query(&self, query: &str, hostnames: &[String]) -> Result<Replies, ControlError> {
        if hostnames.is_empty() {
            return Ok(Replies::new());
        }
        let stdout = self.run(self.inspect_argv(query, hostnames)).await?;
        parse_replies(&stdout)
    }
}

#[async_trait]
impl ControlApi for CliControl {
    async fn ping(&self, hostnames: &[String]) -> Result<Replies, ControlError> {
        self.query("ping", hostnames).await
    }

    async fn shutdown(&self, hostnames: &[String]) -> Result<(), ControlError> {
        if hostnames.is_empty() {
            return Ok(());
        }
        self.run(self.shutdown_argv(hostnames)).await.map(drop)
    }

    async fn inspect(&self, hostnames: &[String], query: Inspection) -> Result<Replies, ControlError> {
        self.query(query.as_str(), hostnames).await
    }
}

fn no_nodes_replied(text: &str) -> bool {
    text.to_ascii_lowercase().contains("no nodes replied")
}

/// Decodes control output: a JSON object keyed by hostname, or a list of such objects.
///
/// Banner lines before the JSON document are skipped.
pub fn parse_replies(stdout: &str) -> Result<Replies, ControlError> {
    let text = stdout.trim();
    if text.is_empty() {
        return Ok(Replies::new());
    }

    let doc = match serde_json::from_str::<Value>(text) {
        Ok(doc) => doc,
        Err(first) => text
            .lines()
            .rev()
            .map(str::trim)
            .find(|l| l.starts_with('{') || l.starts_with('['))
            .and_then(|l| serde_json::from_str(l).ok())
            .ok_or_else(|| ControlError::Decode(first.to_string()))?,
    };

    let mut replies = Replies::new();
    match doc {
        Value::Null => {}
        Value::Object(map) => replies.extend(map),
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::Object(map) => replies.extend(map),
                    other => {
                        return Err(ControlError::Decode(format!(
                            "expected an object per node, got {other}"
                        )))
                    }
                }
            }
        }
        other => {
            return Err(ControlError::Decode(format!(
                "expected an object keyed by hostname, got {other}"
            )))
        }
    }
    Ok(replies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hosts(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn argv_layout() {
        let ctl = CliControl::new(["python", "-m", "celery"], "proj")
            .with_reply_timeout(Duration::from_millis(1500));
        let h = hosts(&["celery@a", "celery@b"]);

        assert_eq!(
            ctl.inspect_argv("active_queues", &h),
            [
                "python", "-m", "celery", "-A", "proj", "inspect", "active_queues",
                "--destination", "celery@a,celery@b", "--json", "--timeout", "1.5",
            ]
        );
        assert_eq!(
            ctl.shutdown_argv(&h),
            [
                "python", "-m", "celery", "-A", "proj", "control", "shutdown",
                "--destination", "celery@a,celery@b",
            ]
        );
    }

    #[test]
    fn parses_object_list_and_banner() {
        let obj = parse_replies(r#"{"celery@a": {"ok": "pong"}}"#).unwrap();
        assert_eq!(obj["celery@a"], json!({"ok": "pong"}));

        let list = parse_replies(r#"[{"celery@a": 1}, {"celery@b": 2}]"#).unwrap();
        assert_eq!(list.len(), 2);

        let banner = parse_replies("-> connected\n{\"celery@a\": []}\n").unwrap();
        assert_eq!(banner["celery@a"], json!([]));

        assert!(parse_replies("   \n").unwrap().is_empty());
    }

    #[test]
    fn rejects_unexpected_documents() {
        assert_eq!(parse_replies("42").unwrap_err().as_label(), "control_decode");
        assert_eq!(parse_replies("not json").unwrap_err().as_label(), "control_decode");
        assert_eq!(parse_replies("[1, 2]").unwrap_err().as_label(), "control_decode");
    }

    #[tokio::test]
    async fn empty_destination_runs_nothing() {
        let ctl = CliControl::new(["/nonexistent/workvisor-ctl"], "proj");
        assert!(ctl.ping(&[]).await.unwrap().is_empty());
        ctl.shutdown(&[]).await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn ping_decodes_process_output() {
        let script = r#"echo '{"celery@a": {"ok": "pong"}}'"#;
        let ctl = CliControl::new(["sh", "-c", script, "ctl"], "proj");
        let replies = ctl.ping(&hosts(&["celery@a"])).await.unwrap();
        assert_eq!(replies["celery@a"], json!({"ok": "pong"}));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn no_nodes_replied_is_empty() {
        let script = "echo 'Error: No nodes replied within time constraint' >&2; exit 69";
        let ctl = CliControl::new(["sh", "-c", script, "ctl"], "proj");
        let replies = ctl.inspect(&hosts(&["celery@a"]), Inspection::Stats).await.unwrap();
        assert!(replies.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_command_surfaces_status() {
        let ctl = CliControl::new(["sh", "-c", "echo broker down >&2; exit 2", "ctl"], "proj");
        match ctl.shutdown(&hosts(&["celery@a"])).await {
            Err(ControlError::Command { status, stderr, .. }) => {
                assert_eq!(status, Some(2));
                assert_eq!(stderr, "broker down");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
