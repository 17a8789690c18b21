/// Per-surface state holders
///
/// Each mediator exposes the derived state one surface shows as live queries
/// and turns user intents into store writes. Write failures are logged here
/// and handed back to the caller.

pub mod habits;
pub mod home;
pub mod live;
pub mod settings;
pub mod stats;

pub use habits::HabitManager;
pub use home::HomeState;
pub use live::{LiveQuery, DEFAULT_GRACE_PERIOD};
pub use settings::SettingsState;
pub use stats::StatsState;

use crate::storage::StorageError;

/// Log a failed write before passing the result on
fn logged<T>(action: &str, result: Result<T, StorageError>) -> Result<T, StorageError> {
    if let Err(e) = &result {
        tracing::error!("Failed to {}: {}", action, e);
    }
    result
}
