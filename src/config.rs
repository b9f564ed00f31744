// src/config.rs

use crate::constants::{DEFAULT_PRESET_ID, UPCOMING_HORIZON_DAYS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "leetcode-spaced-rep";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load() -> Self {
        Self::config_path()
            .map(|p| Self::load_from(&p))
            .unwrap_or_default()
    }

    /// Missing or unparsable files give the defaults.
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(path) = Self::config_path() {
            self.save_to(&path)?;
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", APP_NAME)
            .map(|d| d.config_dir().join("config.toml"))
    }

    /// The configured override, else `<data_dir>/spaced_rep.db`.
    pub fn db_path(&self) -> Option<PathBuf> {
        self.storage.db_path.clone().or_else(|| {
            directories::ProjectDirs::from("", "", APP_NAME)
                .map(|d| d.data_dir().join("spaced_rep.db"))
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_preset")]
    pub default_preset: String,
    #[serde(default = "default_true")]
    pub auto_detect: bool,
    #[serde(default = "default_horizon")]
    pub upcoming_horizon_days: u32,
}

fn default_preset() -> String {
    DEFAULT_PRESET_ID.to_string()
}

fn default_true() -> bool {
    true
}

fn default_horizon() -> u32 {
    UPCOMING_HORIZON_DAYS
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            default_preset: default_preset(),
            auto_detect: true,
            upcoming_horizon_days: UPCOMING_HORIZON_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_filter() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [schedule]
            auto_detect = false
            "#,
        )
        .unwrap();
        assert!(!config.schedule.auto_detect);
        assert_eq!(config.schedule.default_preset, "standard");
        assert_eq!(config.schedule.upcoming_horizon_days, 7);
        assert_eq!(config.logging.filter, "info");
        assert!(config.storage.db_path.is_none());
    }

    #[test]
    fn missing_or_broken_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load_from(&dir.path().join("absent.toml")), Config::default());

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[schedule\nauto_detect = ").unwrap();
        assert_eq!(Config::load_from(&broken), Config::default());
    }

    #[test]
    fn save_then_load_keeps_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.storage.db_path = Some(dir.path().join("custom.db"));
        config.schedule.default_preset = "relaxed".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path);
        assert_eq!(loaded, config);
        assert_eq!(loaded.db_path(), Some(dir.path().join("custom.db")));
    }
}
