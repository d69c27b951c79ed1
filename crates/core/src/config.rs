//! Application configuration loaded through the `config` crate.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::sequencer::RepeatPolicy;

/// Directory under the platform config and data roots.
pub const APP_DIR: &str = "showdown";
/// Name of the configuration file.
pub const CONFIG_FILE: &str = "config.toml";
/// Prefix of environment overrides, e.g. `SHOWDOWN_TICK_MILLIS=250`.
pub const ENV_PREFIX: &str = "SHOWDOWN";

const DEFAULT_CONFIG: &str = r#"# Legends Showdown configuration.
# Every key is optional; remove a line to fall back to the built-in default.

# Where settings.json and custom_legends.json are kept.
# data_dir = "/home/me/.local/share/showdown"

# Round counts offered on the setup screen.
round_options = [2, 3, 5]

# Seconds per turn offered on the setup screen.
time_options = [60, 120, 180]

# "allow" or "forbid_within_session".
category_repeat = "allow"

# Milliseconds between clock ticks. One tick is one second of turn time.
tick_millis = 1000
"#;

/// Runtime configuration for the game and its frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding persisted settings and custom legends.
    pub data_dir: PathBuf,
    /// Round counts offered during setup.
    pub round_options: Vec<u32>,
    /// Turn lengths in seconds offered during setup.
    pub time_options: Vec<u32>,
    /// Whether categories may repeat within a game.
    pub category_repeat: RepeatPolicy,
    /// Delay between clock ticks.
    pub tick_millis: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            round_options: vec![2, 3, 5],
            time_options: vec![60, 120, 180],
            category_repeat: RepeatPolicy::Allow,
            tick_millis: 1000,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path plus environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load configuration from `path` (optional) plus environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let defaults = Self::default();
        let settings = Config::builder()
            .set_default("data_dir", defaults.data_dir.to_string_lossy().to_string())?
            .set_default("round_options", to_config_list(&defaults.round_options))?
            .set_default("time_options", to_config_list(&defaults.time_options))?
            .set_default("category_repeat", "allow")?
            .set_default("tick_millis", defaults.tick_millis as i64)?
            .add_source(
                File::from(path.to_path_buf())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("round_options")
                    .with_list_parse_key("time_options"),
            )
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;

        let config: AppConfig = settings
            .try_deserialize()
            .context("failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Period of the turn clock.
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }

    fn validate(&self) -> Result<()> {
        if self.round_options.is_empty() || self.round_options.contains(&0) {
            bail!("round_options must list at least one positive round count");
        }
        if self.time_options.is_empty() || self.time_options.contains(&0) {
            bail!("time_options must list at least one positive turn length");
        }
        if self.tick_millis == 0 {
            bail!("tick_millis must be positive");
        }
        Ok(())
    }
}

/// Path of the configuration file under the platform config directory.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE)
}

/// Default data directory under the platform data directory.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Write the commented default configuration if no file exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))?;
    info!(path = %path.display(), "Default configuration written");
    Ok(())
}

fn to_config_list(values: &[u32]) -> Vec<i64> {
    values.iter().map(|value| i64::from(*value)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_file_round_trips() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(APP_DIR).join(CONFIG_FILE);
        write_default_config(&path)?;
        assert!(path.exists());

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.round_options, vec![2, 3, 5]);
        assert_eq!(config.time_options, vec![60, 120, 180]);
        assert_eq!(config.category_repeat, RepeatPolicy::Allow);
        assert_eq!(config.tick_period(), Duration::from_secs(1));
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            r#"
data_dir = "/tmp/showdown-test"
round_options = [1, 4]
category_repeat = "forbid_within_session"
tick_millis = 250
"#,
        )?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.data_dir, PathBuf::from("/tmp/showdown-test"));
        assert_eq!(config.round_options, vec![1, 4]);
        assert_eq!(config.time_options, vec![60, 120, 180]);
        assert_eq!(config.category_repeat, RepeatPolicy::ForbidWithinSession);
        assert_eq!(config.tick_millis, 250);
        Ok(())
    }

    #[test]
    fn missing_file_uses_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(dir.path().join("absent.toml"))?;
        assert_eq!(config.round_options, AppConfig::default().round_options);
        Ok(())
    }

    #[test]
    fn invalid_options_are_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "time_options = [0]\n")?;
        assert!(AppConfig::load_from(&path).is_err());
        Ok(())
    }

    #[test]
    fn existing_file_is_not_overwritten() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "tick_millis = 10\n")?;
        write_default_config(&path)?;
        assert_eq!(fs::read_to_string(&path)?, "tick_millis = 10\n");
        Ok(())
    }
}
