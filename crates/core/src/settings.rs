//! User settings persisted across restarts.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// File name of the settings document inside the data directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// Preferences that survive a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Whether the frontend plays audio cues.
    #[serde(default = "default_music_enabled")]
    pub music_enabled: bool,
}

fn default_music_enabled() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            music_enabled: default_music_enabled(),
        }
    }
}

impl Settings {
    /// Load settings from the given path, falling back to defaults if it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings {}", path.display()))?;
        let settings = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse settings {}", path.display()))?;
        Ok(settings)
    }

    /// Persist settings to the given file, creating parent directories if needed.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create settings directory {}", parent.display())
            })?;
        }

        let serialized =
            serde_json::to_string_pretty(self).context("failed to serialize settings")?;
        fs::write(path, serialized)
            .with_context(|| format!("failed to write settings {}", path.display()))
    }
}

/// Settings bound to their file; every change is written through.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
}

impl SettingsStore {
    /// Open the store, using defaults when the file is missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let settings = Settings::load(&path)?;
        Ok(Self { path, settings })
    }

    /// Store holding defaults, written to `path` on first change.
    pub fn with_defaults(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            settings: Settings::default(),
        }
    }

    /// Current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// File backing the store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flip the music flag, persist, and return the new value.
    pub fn toggle_music(&mut self) -> Result<bool> {
        let mut updated = self.settings.clone();
        updated.music_enabled = !updated.music_enabled;
        updated.persist(&self.path)?;
        self.settings = updated;
        info!(
            music_enabled = self.settings.music_enabled,
            "Music setting changed"
        );
        Ok(self.settings.music_enabled)
    }
}

/// Default settings path inside `data_dir`.
pub fn settings_path(data_dir: impl AsRef<Path>) -> PathBuf {
    data_dir.as_ref().join(SETTINGS_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_uses_defaults() -> Result<()> {
        let dir = tempdir()?;
        let settings = Settings::load(settings_path(dir.path()))?;
        assert!(settings.music_enabled);
        Ok(())
    }

    #[test]
    fn toggle_persists() -> Result<()> {
        let dir = tempdir()?;
        let path = settings_path(dir.path().join("nested"));
        let mut store = SettingsStore::open(&path)?;

        assert!(!store.toggle_music()?);
        let reopened = SettingsStore::open(&path)?;
        assert!(!reopened.settings().music_enabled);

        assert!(store.toggle_music()?);
        assert!(Settings::load(&path)?.music_enabled);
        Ok(())
    }

    #[test]
    fn unknown_fields_and_missing_flag_are_tolerated() -> Result<()> {
        let dir = tempdir()?;
        let path = settings_path(dir.path());
        fs::write(&path, r#"{"theme": "dark"}"#)?;
        assert_eq!(Settings::load(&path)?, Settings::default());
        Ok(())
    }
}
