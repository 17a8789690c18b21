/// Settings surface state: the theme preference as an observable value

use std::sync::Arc;
use tokio::sync::watch;

use crate::domain::ThemeMode;
use crate::state::logged;
use crate::storage::{SettingsStore, StorageError};

pub struct SettingsState {
    store: Arc<SettingsStore>,
    theme: watch::Sender<ThemeMode>,
}

impl SettingsState {
    pub fn new(store: Arc<SettingsStore>) -> Self {
        let theme = watch::channel(store.theme_mode()).0;
        Self { store, theme }
    }

    pub fn theme(&self) -> ThemeMode {
        *self.theme.borrow()
    }

    pub fn subscribe_theme(&self) -> watch::Receiver<ThemeMode> {
        self.theme.subscribe()
    }

    /// Persist a new theme, then publish it
    pub fn set_theme(&self, theme: ThemeMode) -> Result<(), StorageError> {
        logged("save theme", self.store.set_theme_mode(theme))?;
        self.theme.send_replace(theme);
        Ok(())
    }
}
