/// Preference store for app settings
///
/// A flat JSON object of integer values persisted to one file per
/// namespace. Only the theme lives here today.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::domain::ThemeMode;
use crate::storage::StorageError;

/// Preference namespace; also the file stem on disk
pub const PREFS_NAME: &str = "echo_settings";

const KEY_THEME_MODE: &str = "theme_mode";

/// Key-value preferences backed by `<dir>/echo_settings.json`
pub struct SettingsStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, i64>>,
}

impl SettingsStore {
    /// Default file location inside `dir`
    pub fn default_path(dir: &Path) -> PathBuf {
        dir.join(format!("{}.json", PREFS_NAME))
    }

    /// Load preferences from `path`
    ///
    /// A missing file starts empty. An unreadable one is logged and ignored,
    /// so a corrupt preference file never stops the app from starting.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable settings file {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!("Could not read settings file {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };

        Self {
            path,
            values: Mutex::new(values),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read an integer, falling back to `default` when unset
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.values
            .lock()
            .ok()
            .and_then(|values| values.get(key).copied())
            .unwrap_or(default)
    }

    /// Write an integer and persist the whole namespace
    ///
    /// The in-memory value only changes once the file is written.
    pub fn put_int(&self, key: &str, value: i64) -> Result<(), StorageError> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| StorageError::Connection("Settings lock poisoned".to_string()))?;
        let mut updated = values.clone();
        updated.insert(key.to_string(), value);

        let text = serde_json::to_string_pretty(&updated)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, text)?;
        *values = updated;

        tracing::debug!("Saved setting {} = {}", key, value);
        Ok(())
    }

    /// Selected theme; unknown ordinals fall back to the default theme
    pub fn theme_mode(&self) -> ThemeMode {
        let ordinal = self.get_int(KEY_THEME_MODE, ThemeMode::default().ordinal());
        ThemeMode::from_ordinal(ordinal).unwrap_or_default()
    }

    pub fn set_theme_mode(&self, theme: ThemeMode) -> Result<(), StorageError> {
        self.put_int(KEY_THEME_MODE, theme.ordinal())
    }
}
