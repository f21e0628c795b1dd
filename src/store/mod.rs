//! # Persisted worker configuration.
//!
//! [`PersistedConfig`] is the document; [`ConfigStore`] is the file it lives
//! in; [`load_initial`] picks the document a control center starts from.

mod persisted;
mod file_store;

pub use persisted::PersistedConfig;
pub use file_store::{load_initial, ConfigStore, InitConfig};
