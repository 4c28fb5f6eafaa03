use parking_lot::RwLock;
use std::{fmt::Debug, path::PathBuf};
use tracing::warn;

use crate::config::{Config, Preferences};

/// Key-value store for user preferences, injected into the orchestrator.
pub trait SettingsStore: Send + Sync + Debug {
    fn city(&self) -> String;
    fn set_city(&self, city: String);

    fn use_imperial(&self) -> bool;
    fn set_use_imperial(&self, imperial: bool);

    fn use_city(&self) -> bool;
    fn set_use_city(&self, use_city: bool);
}

/// Preferences kept in memory for the life of the process.
#[derive(Debug, Default)]
pub struct MemorySettings {
    prefs: RwLock<Preferences>,
}

impl MemorySettings {
    pub fn new(prefs: Preferences) -> Self {
        Self { prefs: RwLock::new(prefs) }
    }
}

impl SettingsStore for MemorySettings {
    fn city(&self) -> String {
        self.prefs.read().city.clone()
    }

    fn set_city(&self, city: String) {
        self.prefs.write().city = city;
    }

    fn use_imperial(&self) -> bool {
        self.prefs.read().imperial
    }

    fn set_use_imperial(&self, imperial: bool) {
        self.prefs.write().imperial = imperial;
    }

    fn use_city(&self) -> bool {
        self.prefs.read().use_city
    }

    fn set_use_city(&self, use_city: bool) {
        self.prefs.write().use_city = use_city;
    }
}

/// Preferences written through to the TOML config file on every change.
///
/// Write failures are logged and otherwise ignored; the in-memory value
/// still changes.
#[derive(Debug)]
pub struct FileSettings {
    path: PathBuf,
    config: RwLock<Config>,
}

impl FileSettings {
    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let config = Config::load_from(&path)?;
        Ok(Self { path, config: RwLock::new(config) })
    }

    pub fn open_default() -> anyhow::Result<Self> {
        Self::open(Config::config_file_path()?)
    }

    /// Snapshot of the full config, including the API section.
    pub fn config(&self) -> Config {
        self.config.read().clone()
    }

    fn update(&self, apply: impl FnOnce(&mut Preferences)) {
        let mut config = self.config.write();
        apply(&mut config.preferences);
        if let Err(err) = config.save_to(&self.path) {
            warn!("Failed to persist preferences: {err:#}");
        }
    }
}

impl SettingsStore for FileSettings {
    fn city(&self) -> String {
        self.config.read().preferences.city.clone()
    }

    fn set_city(&self, city: String) {
        self.update(|p| p.city = city);
    }

    fn use_imperial(&self) -> bool {
        self.config.read().preferences.imperial
    }

    fn set_use_imperial(&self, imperial: bool) {
        self.update(|p| p.imperial = imperial);
    }

    fn use_city(&self) -> bool {
        self.config.read().preferences.use_city
    }

    fn set_use_city(&self, use_city: bool) {
        self.update(|p| p.use_city = use_city);
    }
}
