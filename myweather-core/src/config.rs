use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::location::Position;

/// Environment variable that takes precedence over the stored API key.
pub const API_KEY_ENV: &str = "MYWEATHER_API_KEY";

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_CITY: &str = "Seattle";

/// OpenWeatherMap connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenWeatherConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

const fn default_timeout() -> u64 {
    30
}

impl OpenWeatherConfig {
    /// Request timeout; a zero value falls back to the default.
    pub fn timeout(&self) -> Duration {
        let secs = if self.timeout_secs == 0 { default_timeout() } else { self.timeout_secs };
        Duration::from_secs(secs)
    }
}

impl Default for OpenWeatherConfig {
    fn default() -> Self {
        Self { api_key: None, base_url: default_base_url(), timeout_secs: default_timeout() }
    }
}

/// User preferences persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_city")]
    pub city: String,

    #[serde(default = "default_true")]
    pub imperial: bool,

    /// Look weather up by city name rather than device location.
    #[serde(default = "default_true")]
    pub use_city: bool,

    /// Position used when looking weather up by coordinates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

fn default_city() -> String {
    DEFAULT_CITY.to_string()
}

const fn default_true() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self { city: default_city(), imperial: true, use_city: true, position: None }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [openweather]
/// api_key = "..."
/// base_url = "https://api.openweathermap.org/data/2.5"
/// timeout_secs = 30
///
/// [preferences]
/// city = "Seattle"
/// imperial = true
/// use_city = false
///
/// [preferences.position]
/// latitude = 47.61
/// longitude = -122.33
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub openweather: OpenWeatherConfig,

    #[serde(default)]
    pub preferences: Preferences,
}

impl Config {
    /// Load config from the platform path, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform path, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "myweather", "myweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// API key from the environment, falling back to the stored one.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.stored_api_key().map(str::to_owned))
    }

    pub fn stored_api_key(&self) -> Option<&str> {
        self.openweather.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.openweather.api_key = Some(api_key.trim().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_first_run() {
        let cfg = Config::default();

        assert_eq!(cfg.preferences.city, "Seattle");
        assert!(cfg.preferences.imperial);
        assert!(cfg.preferences.use_city);
        assert_eq!(cfg.openweather.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.openweather.timeout_secs, 30);
        assert_eq!(cfg.stored_api_key(), None);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [openweather]
            api_key = "KEY"

            [preferences]
            city = "Berlin"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.stored_api_key(), Some("KEY"));
        assert_eq!(cfg.openweather.timeout_secs, 30);
        assert_eq!(cfg.preferences.city, "Berlin");
        assert!(cfg.preferences.imperial);
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let mut cfg = Config::default();
        cfg.set_api_key("   ".into());
        assert_eq!(cfg.stored_api_key(), None);

        cfg.set_api_key(" OPEN_KEY ".into());
        assert_eq!(cfg.stored_api_key(), Some("OPEN_KEY"));
    }

    #[test]
    fn zero_timeout_uses_default() {
        let mut cfg = Config::default();
        cfg.openweather.timeout_secs = 0;
        assert_eq!(cfg.openweather.timeout(), Duration::from_secs(30));

        cfg.openweather.timeout_secs = 5;
        assert_eq!(cfg.openweather.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn saved_position_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = Config::default();
        cfg.preferences.use_city = false;
        cfg.preferences.position = Some(Position::new(47.61, -122.33));
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert!(!loaded.preferences.use_city);
        assert_eq!(loaded.preferences.position, Some(Position::new(47.61, -122.33)));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.preferences, Preferences::default());
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("OPEN_KEY".into());
        cfg.preferences.city = "Oslo".into();
        cfg.preferences.imperial = false;
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.stored_api_key(), Some("OPEN_KEY"));
        assert_eq!(loaded.preferences.city, "Oslo");
        assert!(!loaded.preferences.imperial);
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "preferences = 3").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
