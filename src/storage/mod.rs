/// Storage layer for persisting habit data
///
/// This module handles all database operations using SQLite, plus the small
/// JSON preference file. It provides a clean interface for storing and
/// retrieving habits, moods and logs, and tells subscribers which tables a
/// write touched.

pub mod sqlite;
pub mod migrations;
pub mod settings;

// Re-export the main storage types
pub use sqlite::*;
pub use settings::SettingsStore;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::broadcast;
use crate::domain::{DomainError, Habit, HabitId, LogDetails, LogEntry, LogId, Mood, MoodId, NewLogEntry};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    Invalid(#[from] DomainError),

    #[error("Habit not found: {habit_id}")]
    HabitNotFound { habit_id: HabitId },

    #[error("Log not found: {log_id}")]
    LogNotFound { log_id: LogId },

    #[error("Mood not found: {mood_id}")]
    MoodNotFound { mood_id: MoodId },

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Which table a committed write touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreChange {
    Habits,
    Moods,
    Logs,
}

/// Trait defining the storage interface
///
/// Every mutating call is a single atomic statement and announces the
/// tables it changed on the change channel once it has committed.
pub trait EchoStorage: Send + Sync {
    /// Insert a new habit or fully replace an existing one
    ///
    /// Habits with `HabitId::UNSAVED` get a fresh id. Returns the stored id.
    fn upsert_habit(&self, habit: &Habit) -> Result<HabitId, StorageError>;

    /// Get a habit by ID
    fn get_habit(&self, habit_id: HabitId) -> Result<Habit, StorageError>;

    /// Delete a habit; its logs keep their name snapshot and lose the reference
    fn delete_habit(&self, habit_id: HabitId) -> Result<(), StorageError>;

    /// All habits, oldest first
    fn list_habits(&self) -> Result<Vec<Habit>, StorageError>;

    /// All moods ordered by id
    fn list_moods(&self) -> Result<Vec<Mood>, StorageError>;

    /// Delete a mood and, through the cascade, every log that references it
    fn delete_mood(&self, mood_id: MoodId) -> Result<(), StorageError>;

    /// Insert a log row and return it with its assigned id
    fn insert_log(&self, entry: &NewLogEntry) -> Result<LogEntry, StorageError>;

    /// Delete one log row
    fn delete_log(&self, log_id: LogId) -> Result<(), StorageError>;

    /// Logs with `timestamp >= since`, oldest first
    fn logs_since(&self, since: DateTime<Utc>) -> Result<Vec<LogEntry>, StorageError>;

    /// Logs with `timestamp >= since` joined with habit and mood, newest first
    fn log_details_since(&self, since: DateTime<Utc>) -> Result<Vec<LogDetails>, StorageError>;

    /// Subscribe to table change notifications
    fn subscribe_changes(&self) -> broadcast::Receiver<StoreChange>;
}
