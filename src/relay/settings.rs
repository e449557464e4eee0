//! Extension settings and their storage boundary.

use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// User-facing settings, synced through the host's settings storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub auto_refresh: bool,
    pub show_notifications: bool,
    pub default_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_refresh: true,
            show_notifications: false,
            default_filter: "all".to_string(),
        }
    }
}

/// Trait for settings persistence.
pub trait SettingsStore: Send + Sync {
    /// Current settings; defaults when nothing was ever saved.
    fn load(&self) -> Settings;

    fn store(&self, settings: Settings);
}

/// In-memory settings store.
#[derive(Debug, Default)]
pub struct MemorySettings {
    inner: RwLock<Settings>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn load(&self) -> Settings {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn store(&self, settings: Settings) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = settings;
    }
}
