use std::fmt;
use std::sync::Arc;

use crate::control::ControlApi;

/// Entry point used when none is configured.
pub const DEFAULT_ENTRYPOINT: &str = "celery";

/// Application identity shared by every worker of one control center.
///
/// Holds the app selector passed as `-A`, the program used to launch workers,
/// and the control API those workers answer on.
#[derive(Clone)]
pub struct App {
    name: String,
    entrypoint: Vec<String>,
    control: Arc<dyn ControlApi>,
}

impl App {
    /// Creates an app launched through [`DEFAULT_ENTRYPOINT`].
    pub fn new(name: impl Into<String>, control: Arc<dyn ControlApi>) -> Self {
        Self {
            name: name.into(),
            entrypoint: vec![DEFAULT_ENTRYPOINT.to_string()],
            control,
        }
    }

    /// Replaces the entry point (program plus leading arguments).
    pub fn with_entrypoint<I, S>(mut self, entrypoint: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entrypoint = entrypoint.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entrypoint(&self) -> &[String] {
        &self.entrypoint
    }

    pub fn control(&self) -> &Arc<dyn ControlApi> {
        &self.control
    }

    /// `<entrypoint...> -A <name> <command...>`
    pub fn full_command(&self, command: &[String]) -> Vec<String> {
        let mut full = self.entrypoint.clone();
        full.push("-A".to_string());
        full.push(self.name.clone());
        full.extend_from_slice(command);
        full
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("name", &self.name)
            .field("entrypoint", &self.entrypoint)
            .finish_non_exhaustive()
    }
}
