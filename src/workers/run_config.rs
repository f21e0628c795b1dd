//! # Worker run configuration and command derivation.
//!
//! [`RunConfig`] is the set of named options a worker is launched with. The
//! well-known options are typed; everything else is kept in
//! [`RunConfig::extra`] and rendered as passthrough flags.
//!
//! Absent options are skipped on serialization, so merging two configs field by
//! field gives the same result as shallow-merging their JSON objects.
//!
//! ## Command layout
//! ```text
//! [--quiet] worker --hostname <h> --pool <p> [passthrough...] [--queues a,b] [--autoscale x,y | --concurrency n]
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::hostname::Hostname;

/// Pool used when the config names none.
pub const DEFAULT_POOL: &str = "threads";

/// `quiet` value used when the config names none.
pub const DEFAULT_QUIET: bool = true;

/// Named worker options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Queues to consume from; accepts a list or a comma-separated string.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "queues_from_list_or_csv"
    )]
    pub queues: Option<Vec<String>>,

    /// Fixed pool size. Ignored when `autoscale` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<u32>,

    /// Autoscale bounds, rendered in the given order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoscale: Option<(u32, u32)>,

    /// Pool implementation (`threads`, `prefork`, `solo`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<String>,

    /// Suppress the worker banner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiet: Option<bool>,

    /// Passthrough options.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RunConfig {
    /// Builder-style setter for `queues`.
    pub fn with_queues<I, S>(mut self, queues: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.queues = Some(queues.into_iter().map(Into::into).collect());
        self
    }

    /// Builder-style setter for `concurrency`.
    pub fn with_concurrency(mut self, n: u32) -> Self {
        self.concurrency = Some(n);
        self
    }

    /// Builder-style setter for `autoscale`.
    pub fn with_autoscale(mut self, a: u32, b: u32) -> Self {
        self.autoscale = Some((a, b));
        self
    }

    /// Builder-style setter for `pool`.
    pub fn with_pool(mut self, pool: impl Into<String>) -> Self {
        self.pool = Some(pool.into());
        self
    }

    /// Builder-style setter for `quiet`.
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = Some(quiet);
        self
    }

    /// Adds a passthrough option.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Returns `self` layered over `defaults`; options set here win.
    pub fn merged_over(&self, defaults: &RunConfig) -> RunConfig {
        let mut extra = defaults.extra.clone();
        extra.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));

        RunConfig {
            queues: self.queues.clone().or_else(|| defaults.queues.clone()),
            concurrency: self.concurrency.or(defaults.concurrency),
            autoscale: self.autoscale.or(defaults.autoscale),
            pool: self.pool.clone().or_else(|| defaults.pool.clone()),
            quiet: self.quiet.or(defaults.quiet),
            extra,
        }
    }

    /// Effective pool name.
    pub fn pool_or_default(&self) -> &str {
        self.pool.as_deref().unwrap_or(DEFAULT_POOL)
    }

    /// Effective `quiet` flag.
    pub fn quiet_or_default(&self) -> bool {
        self.quiet.unwrap_or(DEFAULT_QUIET)
    }

    /// Derives the worker sub-command for `hostname`.
    pub fn worker_command(&self, hostname: &Hostname) -> Vec<String> {
        let mut cmd = Vec::new();
        if self.quiet_or_default() {
            cmd.push("--quiet".to_string());
        }
        cmd.push("worker".to_string());
        push_flag(&mut cmd, "hostname", hostname.as_str());
        push_flag(&mut cmd, "pool", self.pool_or_default());

        for (key, value) in &self.extra {
            if key == "hostname" {
                continue;
            }
            push_value(&mut cmd, key, value);
        }

        if let Some(queues) = self.queues.as_ref().filter(|q| !q.is_empty()) {
            push_flag(&mut cmd, "queues", &queues.join(","));
        }
        match (self.autoscale, self.concurrency) {
            (Some((a, b)), _) => push_flag(&mut cmd, "autoscale", &format!("{a},{b}")),
            (None, Some(n)) => push_flag(&mut cmd, "concurrency", &n.to_string()),
            (None, None) => {}
        }
        cmd
    }
}

fn flag_name(key: &str) -> String {
    format!("--{}", key.replace('_', "-"))
}

fn push_flag(cmd: &mut Vec<String>, key: &str, value: &str) {
    cmd.push(flag_name(key));
    cmd.push(value.to_string());
}

fn push_value(cmd: &mut Vec<String>, key: &str, value: &Value) {
    match value {
        Value::Null | Value::Bool(false) => {}
        Value::Bool(true) => cmd.push(flag_name(key)),
        Value::String(s) => push_flag(cmd, key, s),
        Value::Number(n) => push_flag(cmd, key, &n.to_string()),
        Value::Array(items) => {
            let joined = items.iter().map(scalar_text).collect::<Vec<_>>().join(",");
            push_flag(cmd, key, &joined);
        }
        Value::Object(_) => push_flag(cmd, key, &value.to_string()),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn queues_from_list_or_csv<'de, D>(de: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Queues {
        List(Vec<String>),
        Csv(String),
    }

    Ok(Option::<Queues>::deserialize(de)?.map(|q| match q {
        Queues::List(list) => list,
        Queues::Csv(csv) => csv
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn host() -> Hostname {
        Hostname::canonical_on("w1@box", "box")
    }

    #[test]
    fn defaults_render_quiet_threads_worker() {
        let cmd = RunConfig::default().worker_command(&host());
        assert_eq!(
            cmd,
            ["--quiet", "worker", "--hostname", "w1@box", "--pool", "threads"]
        );
    }

    #[test]
    fn autoscale_wins_over_concurrency() {
        let cfg = RunConfig::default().with_autoscale(2, 8).with_concurrency(4);
        let cmd = cfg.worker_command(&host());
        let at = cmd.iter().position(|a| a == "--autoscale").unwrap();
        assert_eq!(cmd[at + 1], "2,8");
        assert!(!cmd.iter().any(|a| a == "--concurrency"));
    }

    #[test]
    fn concurrency_rendered_without_autoscale() {
        let cmd = RunConfig::default().with_concurrency(4).worker_command(&host());
        assert_eq!(&cmd[cmd.len() - 2..], ["--concurrency", "4"]);
    }

    #[test]
    fn queues_joined_and_placed_after_passthrough() {
        let cfg = RunConfig::default()
            .with_quiet(false)
            .with_queues(["high", "low"])
            .with_option("max_tasks_per_child", 100)
            .with_option("without_gossip", true)
            .with_option("without_mingle", false)
            .with_option("loglevel", "INFO");

        assert_eq!(
            cfg.worker_command(&host()),
            [
                "worker",
                "--hostname",
                "w1@box",
                "--pool",
                "threads",
                "--loglevel",
                "INFO",
                "--max-tasks-per-child",
                "100",
                "--without-gossip",
                "--queues",
                "high,low",
            ]
        );
    }

    #[test]
    fn passthrough_hostname_is_ignored() {
        let cfg = RunConfig::default().with_option("hostname", "spoofed@elsewhere");
        let cmd = cfg.worker_command(&host());
        assert_eq!(cmd.iter().filter(|a| *a == "--hostname").count(), 1);
        assert!(!cmd.iter().any(|a| a.contains("spoofed")));
    }

    #[test]
    fn compound_passthrough_values() {
        let cfg = RunConfig::default()
            .with_option("exclude_queues", json!(["a", "b"]))
            .with_option("extra", json!({"k": 1}))
            .with_option("nothing", Value::Null);
        let cmd = cfg.worker_command(&host());
        assert!(cmd.windows(2).any(|w| w == ["--exclude-queues", "a,b"]));
        assert!(cmd.windows(2).any(|w| w == ["--extra", r#"{"k":1}"#]));
        assert!(!cmd.iter().any(|a| a == "--nothing"));
    }

    #[test]
    fn override_wins_in_merge() {
        let global: RunConfig =
            serde_json::from_value(json!({"pool": "threads", "concurrency": 2, "loglevel": "INFO"}))
                .unwrap();
        let node: RunConfig = serde_json::from_value(json!({"pool": "solo", "loglevel": "DEBUG"})).unwrap();

        let eff = node.merged_over(&global);
        assert_eq!(eff.pool.as_deref(), Some("solo"));
        assert_eq!(eff.concurrency, Some(2));
        assert_eq!(eff.extra["loglevel"], json!("DEBUG"));
    }

    #[test]
    fn deserializes_known_and_passthrough_keys() {
        let cfg: RunConfig = serde_json::from_value(json!({
            "queues": "a, b",
            "autoscale": [1, 4],
            "prefetch_multiplier": 1
        }))
        .unwrap();
        assert_eq!(cfg.queues, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(cfg.autoscale, Some((1, 4)));
        assert_eq!(cfg.extra["prefetch_multiplier"], json!(1));

        let out = serde_json::to_value(&cfg).unwrap();
        assert_eq!(out, json!({"queues": ["a", "b"], "autoscale": [1, 4], "prefetch_multiplier": 1}));
    }
}
