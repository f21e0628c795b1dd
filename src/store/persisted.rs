use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::workers::RunConfig;

/// Global defaults plus per-node overrides, as stored on disk.
///
/// ```json
/// {
///   "global":  { "pool": "threads" },
///   "workers": { "celery@w1": { "queues": ["high"] } }
/// }
/// ```
///
/// Both keys are optional. Node keys are stored as given and canonicalized
/// when the node is started.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PersistedConfig {
    pub global: RunConfig,
    pub workers: BTreeMap<String, RunConfig>,
}

impl PersistedConfig {
    /// Parses a JSON document; `origin` names it in errors.
    pub fn from_json_str(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let doc: Value = serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            origin: origin.to_string(),
            source,
        })?;
        Self::from_json_value(doc, origin)
    }

    /// Interprets an already-parsed JSON document.
    pub fn from_json_value(doc: Value, origin: &str) -> Result<Self, ConfigError> {
        if !doc.is_object() {
            return Err(ConfigError::Shape {
                origin: origin.to_string(),
                reason: format!("top level must be an object, got {}", kind_of(&doc)),
            });
        }
        serde_json::from_value(doc).map_err(|source| ConfigError::Parse {
            origin: origin.to_string(),
            source,
        })
    }

    /// Pretty JSON rendering used for saving.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Effective config of `hostname`: its override layered over `global`.
    pub fn effective(&self, hostname: &str) -> Option<RunConfig> {
        self.workers
            .get(hostname)
            .map(|over| over.merged_over(&self.global))
    }

    /// Effective config of every node.
    pub fn effective_all(&self) -> BTreeMap<String, RunConfig> {
        self.workers
            .iter()
            .map(|(h, over)| (h.clone(), over.merged_over(&self.global)))
            .collect()
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn both_keys_optional() {
        let cfg = PersistedConfig::from_json_str("{}", "inline").unwrap();
        assert_eq!(cfg, PersistedConfig::default());

        let cfg = PersistedConfig::from_json_str(r#"{"workers": {"w1": {}}}"#, "inline").unwrap();
        assert!(cfg.workers.contains_key("w1"));
    }

    #[test]
    fn non_object_is_shape_error() {
        for text in ["[]", "null", "\"x\"", "3"] {
            let err = PersistedConfig::from_json_str(text, "inline").unwrap_err();
            assert_eq!(err.as_label(), "config_shape", "{text}");
        }
    }

    #[test]
    fn bad_json_and_bad_fields_are_parse_errors() {
        assert_eq!(
            PersistedConfig::from_json_str("{", "f.json").unwrap_err().as_label(),
            "config_parse"
        );
        assert_eq!(
            PersistedConfig::from_json_str(r#"{"nodes": {}}"#, "f.json")
                .unwrap_err()
                .as_label(),
            "config_parse"
        );
        assert_eq!(
            PersistedConfig::from_json_str(r#"{"global": {"concurrency": "many"}}"#, "f.json")
                .unwrap_err()
                .as_label(),
            "config_parse"
        );
    }

    #[test]
    fn effective_layers_override_over_global() {
        let cfg = PersistedConfig::from_json_value(
            json!({
                "global": {"pool": "threads", "concurrency": 2},
                "workers": {"celery@w1": {"pool": "solo"}, "celery@w2": {}}
            }),
            "inline",
        )
        .unwrap();

        let w1 = cfg.effective("celery@w1").unwrap();
        assert_eq!(w1.pool.as_deref(), Some("solo"));
        assert_eq!(w1.concurrency, Some(2));
        assert_eq!(cfg.effective_all()["celery@w2"].pool.as_deref(), Some("threads"));
        assert!(cfg.effective("celery@w3").is_none());
    }
}
