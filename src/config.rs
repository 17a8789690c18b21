/// Runtime configuration for the tracker server

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::state::DEFAULT_GRACE_PERIOD;
use crate::storage::SettingsStore;

/// Database file name inside the data directory
pub const DATABASE_FILE: &str = "echo.db";

#[derive(Debug, Clone)]
pub struct EchoConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// JSON preference file
    pub settings_path: PathBuf,
    /// How long an unobserved live query keeps running
    pub live_query_grace: Duration,
}

impl EchoConfig {
    /// Keep the preference file next to the database
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        let database_path = database_path.into();
        let dir = database_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Self {
            settings_path: SettingsStore::default_path(&dir),
            database_path,
            live_query_grace: DEFAULT_GRACE_PERIOD,
        }
    }

    /// Database and preferences inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(DATABASE_FILE))
    }

    pub fn with_settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = path.into();
        self
    }

    pub fn with_live_query_grace(mut self, grace: Duration) -> Self {
        self.live_query_grace = grace;
        self
    }
}
