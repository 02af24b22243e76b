use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::Result;
use crate::locale::Language;

pub const PREFS_FILE: &str = "prefs.toml";

/// Flat key-value preferences shared by every widget instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub language: Language,
    pub sound_enabled: bool,
    /// Declared widget width in terminal columns; `None` uses the live width.
    pub widget_width: Option<u16>,
    /// Month offset from the current month, keyed by instance id.
    pub month_offsets: BTreeMap<String, i32>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            language: Language::System,
            sound_enabled: true,
            widget_width: None,
            month_offsets: BTreeMap::new(),
        }
    }
}

impl Preferences {
    pub fn month_offset(&self, instance: &str) -> i32 {
        self.month_offsets.get(instance).copied().unwrap_or(0)
    }

    pub fn shift_month_offset(&mut self, instance: &str, delta: i32) -> i32 {
        let next = self.month_offset(instance).saturating_add(delta);
        self.month_offsets.insert(instance.to_string(), next);
        next
    }

    pub fn set_month_offset(&mut self, instance: &str, offset: i32) {
        self.month_offsets.insert(instance.to_string(), offset);
    }

    pub fn remove_month_offset(&mut self, instance: &str) {
        self.month_offsets.remove(instance);
    }
}

#[derive(Debug, Clone)]
pub struct PrefsStore {
    path: PathBuf,
}

impl PrefsStore {
    pub fn open(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)?;
        Ok(Self {
            path: data_dir.join(PREFS_FILE),
        })
    }

    /// Missing or unreadable preferences fall back to defaults.
    pub fn load(&self) -> Preferences {
        let Ok(content) = fs::read_to_string(&self.path) else {
            return Preferences::default();
        };
        toml::from_str(&content).unwrap_or_else(|err| {
            warn!(%err, path = %self.path.display(), "ignoring malformed preferences");
            Preferences::default()
        })
    }

    pub fn save(&self, prefs: &Preferences) -> Result<()> {
        fs::write(&self.path, toml::to_string(prefs)?)?;
        Ok(())
    }

    /// Read-modify-write helper for single-field updates.
    pub fn update<T>(&self, f: impl FnOnce(&mut Preferences) -> T) -> Result<T> {
        let mut prefs = self.load();
        let out = f(&mut prefs);
        self.save(&prefs)?;
        Ok(out)
    }
}
