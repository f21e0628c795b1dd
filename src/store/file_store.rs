use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::persisted::PersistedConfig;
use crate::error::ConfigError;

/// Where the initial configuration comes from when the store has none.
#[derive(Debug, Clone, PartialEq)]
pub enum InitConfig {
    /// JSON file; it must exist and parse.
    Path(PathBuf),
    /// In-memory document.
    Inline(PersistedConfig),
}

/// JSON file holding a [`PersistedConfig`].
///
/// A missing or empty file reads as "nothing stored". Saves go through a
/// sibling temp file and a rename so a crash never leaves a truncated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored config; `None` if the file is missing or blank.
    pub fn load(&self) -> Result<Option<PersistedConfig>, ConfigError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if text.trim().is_empty() {
            return Ok(None);
        }
        PersistedConfig::from_json_str(&text, &self.path.display().to_string()).map(Some)
    }

    /// Writes `cfg` as pretty JSON, creating parent directories as needed.
    pub fn save(&self, cfg: &PersistedConfig) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: self.path.clone(),
            source,
        };

        let text = cfg
            .to_json_pretty()
            .map_err(|e| write_err(io::Error::new(io::ErrorKind::InvalidData, e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, text + "\n").map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)?;
        tracing::debug!(path = %self.path.display(), workers = cfg.workers.len(), "config saved");
        Ok(())
    }
}

/// Resolves the configuration a control center starts from.
///
/// A non-empty `store` file wins; otherwise `init` is used; otherwise defaults.
pub fn load_initial(
    init: Option<&InitConfig>,
    store: Option<&ConfigStore>,
) -> Result<PersistedConfig, ConfigError> {
    if let Some(stored) = store.map(ConfigStore::load).transpose()?.flatten() {
        return Ok(stored);
    }
    match init {
        Some(InitConfig::Inline(cfg)) => Ok(cfg.clone()),
        Some(InitConfig::Path(path)) => {
            let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            PersistedConfig::from_json_str(&text, &path.display().to_string())
        }
        None => Ok(PersistedConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workers::RunConfig;

    fn sample() -> PersistedConfig {
        let mut cfg = PersistedConfig {
            global: RunConfig::default().with_pool("threads").with_concurrency(2),
            ..Default::default()
        };
        cfg.workers.insert(
            "celery@w1".into(),
            RunConfig::default().with_queues(["a", "b"]).with_option("loglevel", "INFO"),
        );
        cfg.workers.insert("celery@w2".into(), RunConfig::default().with_autoscale(1, 4));
        cfg
    }

    #[test]
    fn save_then_load_keeps_effective_configs() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("nested/state.json"));
        let cfg = sample();

        store.save(&cfg).unwrap();
        let loaded = store.load().unwrap().unwrap();

        assert_eq!(loaded.effective_all(), cfg.effective_all());
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn missing_or_blank_file_is_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("state.json"));
        assert!(store.load().unwrap().is_none());

        fs::write(store.path(), "  \n").unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn store_overrides_init_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("state.json"));
        let init = InitConfig::Inline(PersistedConfig::default());

        assert_eq!(load_initial(Some(&init), Some(&store)).unwrap(), PersistedConfig::default());

        store.save(&sample()).unwrap();
        assert_eq!(load_initial(Some(&init), Some(&store)).unwrap(), sample());
    }

    #[test]
    fn init_path_must_exist_and_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("init.json");

        let missing = load_initial(Some(&InitConfig::Path(path.clone())), None).unwrap_err();
        assert_eq!(missing.as_label(), "config_read");

        fs::write(&path, "[1]").unwrap();
        let shape = load_initial(Some(&InitConfig::Path(path.clone())), None).unwrap_err();
        assert_eq!(shape.as_label(), "config_shape");

        fs::write(&path, r#"{"workers": {"w1": {"pool": "solo"}}}"#).unwrap();
        let cfg = load_initial(Some(&InitConfig::Path(path)), None).unwrap();
        assert_eq!(cfg.workers["w1"].pool.as_deref(), Some("solo"));
    }

    #[test]
    fn malformed_store_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("state.json"));
        fs::write(store.path(), "{ nope").unwrap();
        assert_eq!(load_initial(None, Some(&store)).unwrap_err().as_label(), "config_parse");
    }
}
