//! Configuration management
//!
//! Binding table (mappings file) plus engine settings, both JSON. The table is
//! reloaded per key event through a `ConfigLoader`; settings are read once.

pub mod binding;
pub mod loader;
pub mod mappings;
pub mod settings;

use std::path::PathBuf;

pub use binding::{ActionDescriptor, ActionKind, Binding, KeyPredicate};
pub use loader::{ConfigLoader, FileConfigLoader, StaticConfigLoader};
pub use mappings::{CompiledBinding, MappingFile, MappingTable};
pub use settings::{EngineSettings, MatchPolicy, RestoreOrdering};

use crate::constants::config;

/// `<user config dir>/page-hotkeys`
pub fn app_dir() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(config::APP_DIR);
    path
}

pub fn mappings_path() -> PathBuf {
    app_dir().join(config::MAPPINGS_FILENAME)
}

pub fn settings_path() -> PathBuf {
    app_dir().join(config::SETTINGS_FILENAME)
}

pub fn state_path() -> PathBuf {
    app_dir().join(config::STATE_FILENAME)
}
