/// Log entries: one row per completed interaction
///
/// This module defines the stored LogEntry, the NewLogEntry that the
/// reconciliation rules build before insert, and the joined LogDetails view.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::domain::{
    DomainError, Habit, HabitId, LogId, Mood, MoodCheckIn, MoodId, MOOD_CHECKIN_NAME,
};

/// Longest duration the store can hold; durations are kept as signed millis
pub const MAX_DURATION_MS: u64 = i64::MAX as u64;

/// A stored log row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: LogId,
    /// Null for mood-only logs and for logs whose habit was deleted
    pub habit_id: Option<HabitId>,
    /// Habit name at log time, kept readable after edits and deletes
    pub habit_name: Option<String>,
    pub mood_id: Option<MoodId>,
    /// Session length, only for timed sessions
    pub duration_ms: Option<u64>,
    pub note: Option<String>,
    /// Creation time, also the ordering key
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    /// Whether this row is a mood-only check-in from the home prompt
    pub fn is_mood_checkin(&self) -> bool {
        self.habit_id.is_none() && self.habit_name.as_deref() == Some(MOOD_CHECKIN_NAME)
    }

    /// Decode the check-in payload of a mood-only row
    pub fn mood_checkin(&self) -> Option<MoodCheckIn> {
        if !self.is_mood_checkin() {
            return None;
        }
        self.note.as_deref().and_then(MoodCheckIn::from_note)
    }
}

/// A log row about to be inserted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLogEntry {
    pub habit_id: Option<HabitId>,
    pub habit_name: Option<String>,
    pub mood_id: Option<MoodId>,
    pub duration_ms: Option<u64>,
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl NewLogEntry {
    /// Checkbox completion of a habit
    pub fn habit_completion(habit: &Habit, now: DateTime<Utc>) -> Self {
        Self {
            habit_id: Some(habit.id),
            habit_name: Some(habit.name.clone()),
            mood_id: None,
            duration_ms: None,
            note: None,
            timestamp: now,
        }
    }

    /// Hand-off from a finished timer session
    ///
    /// Returns `None` when nothing was timed; a zero-length session never
    /// produces a log. A session started without a stored habit keeps only
    /// the name.
    pub fn session_finish(
        habit_id: HabitId,
        habit_name: &str,
        elapsed_ms: u64,
        mood_id: Option<MoodId>,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        if elapsed_ms == 0 {
            return None;
        }
        Some(Self {
            habit_id: Some(habit_id).filter(HabitId::is_saved),
            habit_name: Some(habit_name.to_string()),
            mood_id,
            duration_ms: Some(elapsed_ms),
            note: note.filter(|n| !n.trim().is_empty()),
            timestamp: now,
        })
    }

    /// Mood-only check-in from the home prompt
    pub fn mood_checkin(checkin: &MoodCheckIn, now: DateTime<Utc>) -> Self {
        Self {
            habit_id: None,
            habit_name: Some(MOOD_CHECKIN_NAME.to_string()),
            mood_id: None,
            duration_ms: None,
            note: Some(checkin.to_note()),
            timestamp: now,
        }
    }

    /// Entry from the generic log sheet
    ///
    /// A duration of zero is treated as "not timed" and a blank note as no
    /// note.
    pub fn from_sheet(
        habit_id: Option<HabitId>,
        habit_name: Option<String>,
        mood_id: Option<MoodId>,
        duration_ms: Option<u64>,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            habit_id,
            habit_name,
            mood_id,
            duration_ms: duration_ms.filter(|d| *d > 0),
            note: note.filter(|n| !n.trim().is_empty()),
            timestamp: now,
        }
    }

    /// Check the row carries something worth keeping
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.habit_id.is_none() && self.mood_id.is_none() && self.note.is_none() {
            return Err(DomainError::Validation {
                message: "A log needs a habit, a mood or a note".to_string(),
            });
        }
        if self.duration_ms.map_or(false, |d| d > MAX_DURATION_MS) {
            return Err(DomainError::InvalidValue {
                message: format!("Duration cannot exceed {} ms", MAX_DURATION_MS),
            });
        }
        if let Some(note) = &self.note {
            if note.chars().count() > 1000 {
                return Err(DomainError::InvalidValue {
                    message: "Notes cannot be longer than 1000 characters".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Attach the store-assigned id
    pub fn into_entry(self, id: LogId) -> LogEntry {
        LogEntry {
            id,
            habit_id: self.habit_id,
            habit_name: self.habit_name,
            mood_id: self.mood_id,
            duration_ms: self.duration_ms,
            note: self.note,
            timestamp: self.timestamp,
        }
    }
}

/// A log joined with its habit and mood, for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogDetails {
    pub log: LogEntry,
    pub habit: Option<Habit>,
    pub mood: Option<Mood>,
}

impl LogDetails {
    /// Best name to show for the log
    ///
    /// Prefers the current habit name, then the snapshot taken at log time.
    pub fn title(&self) -> &str {
        self.habit
            .as_ref()
            .map(|h| h.name.as_str())
            .or(self.log.habit_name.as_deref())
            .unwrap_or("Log")
    }
}
