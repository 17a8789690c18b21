/// Tools for writing and removing individual logs
///
/// This module implements log_create (the generic log sheet) and log_delete.

use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use crate::domain::{HabitId, LogEntry, LogId, MoodId, NewLogEntry};
use crate::state::{HabitManager, HomeState, StatsState};
use crate::storage::StorageError;
use crate::timer::format_elapsed;

/// Parameters for logging an entry by hand
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct CreateLogParams {
    /// Habit the log is for (optional)
    pub habit_id: Option<i64>,
    /// Mood to attach, 1-5 (optional)
    pub mood_id: Option<i64>,
    /// Duration in milliseconds (optional)
    pub duration_ms: Option<u64>,
    /// Free-text note (optional)
    pub note: Option<String>,
}

/// Parameters naming one log
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteLogParams {
    /// ID of the log to delete
    pub log_id: i64,
}

/// Response from log_create
#[derive(Debug, Serialize)]
pub struct CreateLogResponse {
    pub log: LogEntry,
    pub message: String,
}

/// Response from log_delete
#[derive(Debug, Serialize)]
pub struct DeleteLogResponse {
    pub log_id: LogId,
    pub message: String,
}

/// Log an entry from the log sheet
///
/// The habit's current name is snapshotted onto the row. A log needs at
/// least a habit, a mood or a note.
pub fn create_log(
    manager: &HabitManager,
    home: &HomeState,
    params: CreateLogParams,
) -> Result<CreateLogResponse, StorageError> {
    let habit = match params.habit_id {
        Some(id) => Some(manager.get(HabitId(id))?),
        None => None,
    };

    let entry = NewLogEntry::from_sheet(
        habit.as_ref().map(|h| h.id),
        habit.as_ref().map(|h| h.name.clone()),
        params.mood_id.map(MoodId),
        params.duration_ms,
        params.note,
        Utc::now(),
    );
    let log = home.insert_log(&entry)?;

    let mut message = match &habit {
        Some(habit) => format!("📝 Logged '{}'", habit.name),
        None => "📝 Logged entry".to_string(),
    };
    if let Some(duration) = log.duration_ms {
        message.push_str(&format!(" ({})", format_elapsed(duration)));
    }
    message.push_str(&format!("\nLog ID: {}", log.id));

    Ok(CreateLogResponse { log, message })
}

pub fn delete_log(stats: &StatsState, params: DeleteLogParams) -> Result<DeleteLogResponse, StorageError> {
    let log_id = LogId(params.log_id);
    stats.delete_log(log_id)?;

    Ok(DeleteLogResponse {
        log_id,
        message: format!("🗑️ Deleted log {}", log_id),
    })
}
