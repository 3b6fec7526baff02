//! Engine settings
//!
//! Static behavior switches read once at startup: how far the dispatcher
//! scans the binding list, how the startup restore of the run flag interacts
//! with early toggles, and the toggle gesture keys.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use super::binding::KeyPredicate;
use crate::constants::{notification, toggle};

/// When the dispatcher stops scanning the binding list for one event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Stop after the first binding whose action succeeds.
    /// A matching binding whose element is missing or incapable does not stop the scan.
    #[default]
    FirstSuccess,
    /// Stop after the first binding whose URL and key match, whatever the outcome
    FirstMatch,
    /// Run every matching binding
    All,
}

/// How the startup read of the persisted run flag treats toggles that
/// happened while the read was in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreOrdering {
    /// The persisted value is applied when it arrives, even over a newer toggle
    #[default]
    LastWriteWins,
    /// A toggle made before the read resolves wins; the stale value is dropped
    PreferLocalWrites,
}

/// Engine settings file (`settings.json`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default)]
    pub match_policy: MatchPolicy,
    #[serde(default)]
    pub restore_ordering: RestoreOrdering,
    /// Resumes dispatch while paused
    #[serde(default = "default_resume_key")]
    pub resume_key: KeyPredicate,
    /// DOM key name that pauses dispatch while running (Shift state ignored)
    #[serde(default = "default_pause_key")]
    pub pause_key: String,
    #[serde(default = "default_notification_location")]
    pub notification_location: String,
    /// Emit notifications for toggles and notify-worthy actions
    #[serde(default = "default_notifications")]
    pub notifications: bool,
}

fn default_resume_key() -> KeyPredicate {
    KeyPredicate::new(toggle::RESUME_CHAR.to_string(), toggle::RESUME_SHIFT)
}

fn default_pause_key() -> String {
    toggle::PAUSE_KEY.to_string()
}

fn default_notification_location() -> String {
    notification::LOCATION.to_string()
}

fn default_notifications() -> bool {
    true
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            match_policy: MatchPolicy::default(),
            restore_ordering: RestoreOrdering::default(),
            resume_key: default_resume_key(),
            pause_key: default_pause_key(),
            notification_location: default_notification_location(),
            notifications: default_notifications(),
        }
    }
}

impl EngineSettings {
    /// Load settings from the default location, creating the file if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&super::settings_path())
    }

    /// Load settings from JSON file or create default
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Settings file not found, creating default at {:?}", path);
            let settings = Self::default();
            settings.save_to(path)?;
            return Ok(settings);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;
        let settings: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse JSON from {:?}", path))?;
        Ok(settings)
    }

    /// Save settings as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, json).with_context(|| format!("Failed to write settings to {:?}", path))?;

        info!("Saved settings to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = EngineSettings::default();
        assert_eq!(settings.match_policy, MatchPolicy::FirstSuccess);
        assert_eq!(settings.restore_ordering, RestoreOrdering::LastWriteWins);
        assert_eq!(settings.resume_key, KeyPredicate::new("~", true));
        assert_eq!(settings.pause_key, "Escape");
        assert!(settings.notifications);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: EngineSettings =
            serde_json::from_str(r#"{"match_policy": "all"}"#).unwrap();
        assert_eq!(settings.match_policy, MatchPolicy::All);
        assert_eq!(settings.pause_key, "Escape");
        assert_eq!(settings.notification_location, "top-right");
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = EngineSettings::load_from(&path).unwrap();
        assert_eq!(settings, EngineSettings::default());
        assert!(path.exists());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let settings = EngineSettings {
            match_policy: MatchPolicy::FirstMatch,
            restore_ordering: RestoreOrdering::PreferLocalWrites,
            notifications: false,
            ..EngineSettings::default()
        };
        settings.save_to(&path).unwrap();

        assert_eq!(EngineSettings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_load_rejects_bad_policy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"match_policy": "sometimes"}"#).unwrap();
        assert!(EngineSettings::load_from(&path).is_err());
    }
}
