//! # Control-center configuration.
//!
//! [`CenterConfig`] gathers every runtime knob of a
//! [`ControlCenter`](crate::ControlCenter). Worker launch options are not
//! here: they live in the persisted document (see [`crate::store`]).
//!
//! ## Sentinel values
//! - `ready_timeout = 0s` → readiness waits are unbounded
//! - `terminate_timeout = 0s` → the supervised shutdown joins without a deadline

use std::path::PathBuf;
use std::time::Duration;

use crate::store::{ConfigStore, InitConfig};
use crate::workers::READY_POLL_INTERVAL;

/// When the working configuration is written to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PersistPolicy {
    /// Only when the center terminates.
    #[default]
    OnTerminate,
    /// After every successful start/stop, and at terminate.
    OnChange,
}

/// Settings of one control center.
///
/// All fields are public; prefer the accessors over checking sentinels inline.
#[derive(Clone, Debug)]
pub struct CenterConfig {
    /// Configuration used when `cfg_path` holds nothing.
    pub init_cfg: Option<InitConfig>,

    /// State file: read at construction (wins over `init_cfg` when non-empty)
    /// and written on persist.
    pub cfg_path: Option<PathBuf>,

    /// When to persist.
    pub persist: PersistPolicy,

    /// Interval between readiness pings.
    pub ready_poll: Duration,

    /// Deadline for a worker to become ready when `start_worker` waits.
    ///
    /// `Duration::ZERO` = wait as long as the process runs.
    pub ready_timeout: Duration,

    /// After a failed readiness wait: how long the worker gets to honor the
    /// shutdown request before it is killed.
    pub rollback_grace: Duration,

    /// How long `start(true)` waits for the workers to honor the final
    /// shutdown request before killing the rest. `Duration::ZERO` = no limit.
    pub terminate_timeout: Duration,

    /// Wake-up interval of the supervisory loop.
    pub supervise_interval: Duration,

    /// Event bus ring buffer size (min 1).
    pub bus_capacity: usize,
}

impl CenterConfig {
    /// Readiness deadline as an `Option`; `None` means unbounded.
    #[inline]
    pub fn ready_deadline(&self) -> Option<Duration> {
        if self.ready_timeout == Duration::ZERO {
            None
        } else {
            Some(self.ready_timeout)
        }
    }

    /// Join deadline of the supervised shutdown; `None` means unbounded.
    #[inline]
    pub fn terminate_deadline(&self) -> Option<Duration> {
        if self.terminate_timeout == Duration::ZERO {
            None
        } else {
            Some(self.terminate_timeout)
        }
    }

    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Store backing `cfg_path`, if configured.
    pub fn store(&self) -> Option<ConfigStore> {
        self.cfg_path.clone().map(ConfigStore::new)
    }

    #[inline]
    pub fn persists_on_change(&self) -> bool {
        self.persist == PersistPolicy::OnChange
    }
}

impl Default for CenterConfig {
    /// - no initial config and no state file
    /// - `persist = OnTerminate`
    /// - `ready_poll = 200ms`, `ready_timeout = 0s` (unbounded)
    /// - `rollback_grace = 5s`, `terminate_timeout = 30s`, `supervise_interval = 1s`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            init_cfg: None,
            cfg_path: None,
            persist: PersistPolicy::OnTerminate,
            ready_poll: READY_POLL_INTERVAL,
            ready_timeout: Duration::ZERO,
            rollback_grace: Duration::from_secs(5),
            terminate_timeout: Duration::from_secs(30),
            supervise_interval: Duration::from_secs(1),
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels() {
        let mut cfg = CenterConfig::default();
        assert_eq!(cfg.ready_deadline(), None);
        assert!(cfg.store().is_none());
        assert!(!cfg.persists_on_change());
        assert_eq!(cfg.terminate_deadline(), Some(Duration::from_secs(30)));

        cfg.terminate_timeout = Duration::ZERO;
        assert_eq!(cfg.terminate_deadline(), None);

        cfg.ready_timeout = Duration::from_secs(3);
        cfg.bus_capacity = 0;
        cfg.cfg_path = Some("state.json".into());
        assert_eq!(cfg.ready_deadline(), Some(Duration::from_secs(3)));
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.store().unwrap().path(), std::path::Path::new("state.json"));
    }
}
