/// Home surface state: today's habits, the mood prompt and quick logging

use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use tracing::debug;

use crate::domain::{
    habit_statuses, local_today, mood_logged_today, start_of_local_day, Habit, HabitId, HabitStatus,
    LogEntry, LogId, Mood, MoodCheckIn, MoodId, NewLogEntry,
};
use crate::state::{logged, LiveQuery};
use crate::storage::{EchoStorage, StorageError, StoreChange};

pub struct HomeState {
    storage: Arc<dyn EchoStorage>,
    habit_states: LiveQuery<Vec<HabitStatus>>,
    moods: LiveQuery<Vec<Mood>>,
    mood_logged_today: LiveQuery<bool>,
}

impl HomeState {
    pub fn new(storage: Arc<dyn EchoStorage>, grace: Duration) -> Self {
        let habit_states = LiveQuery::new(
            "habit_states",
            storage.clone(),
            &[StoreChange::Habits, StoreChange::Logs],
            grace,
            Vec::new(),
            |s| {
                let habits = s.list_habits()?;
                let today = s.logs_since(start_of_local_day(local_today()))?;
                Ok(habit_statuses(&habits, &today))
            },
        );

        let moods = LiveQuery::new(
            "moods",
            storage.clone(),
            &[StoreChange::Moods],
            grace,
            Vec::new(),
            |s| s.list_moods(),
        );

        let mood_logged = LiveQuery::new(
            "mood_logged_today",
            storage.clone(),
            &[StoreChange::Logs],
            grace,
            false,
            |s| {
                let today = s.logs_since(start_of_local_day(local_today()))?;
                Ok(mood_logged_today(&today))
            },
        );

        Self {
            storage,
            habit_states,
            moods,
            mood_logged_today: mood_logged,
        }
    }

    /// Every habit with whether it has a log since local midnight
    pub fn habit_states(&self) -> &LiveQuery<Vec<HabitStatus>> {
        &self.habit_states
    }

    pub fn moods(&self) -> &LiveQuery<Vec<Mood>> {
        &self.moods
    }

    /// Whether today's mood check-in is done, which hides the prompt
    pub fn mood_logged_today(&self) -> &LiveQuery<bool> {
        &self.mood_logged_today
    }

    /// Tick a habit off for today
    ///
    /// Not idempotent: every call adds a row, though the habit still shows
    /// as simply completed.
    pub fn complete_habit(&self, habit: &Habit) -> Result<LogEntry, StorageError> {
        let entry = NewLogEntry::habit_completion(habit, Utc::now());
        logged("complete habit", self.storage.insert_log(&entry))
    }

    /// Record the answer to the mood prompt
    pub fn log_mood(&self, checkin: &MoodCheckIn) -> Result<LogEntry, StorageError> {
        let entry = NewLogEntry::mood_checkin(checkin, Utc::now());
        logged("log mood", self.storage.insert_log(&entry))
    }

    /// Write the log for a finished timer session
    ///
    /// Returns `Ok(None)` without touching the store when nothing was timed.
    /// If the habit was deleted while the session ran, the log keeps only the
    /// name, as it would had the delete come after the log.
    pub fn finish_session(
        &self,
        habit_id: HabitId,
        habit_name: &str,
        elapsed_ms: u64,
        mood_id: Option<MoodId>,
        note: Option<String>,
    ) -> Result<Option<LogEntry>, StorageError> {
        let habit_id = if habit_id.is_saved() {
            match self.storage.get_habit(habit_id) {
                Ok(_) => habit_id,
                Err(StorageError::HabitNotFound { .. }) => {
                    debug!("Habit {} is gone, logging the session by name", habit_id);
                    HabitId::UNSAVED
                }
                Err(e) => return logged("save session log", Err(e)),
            }
        } else {
            habit_id
        };

        match NewLogEntry::session_finish(habit_id, habit_name, elapsed_ms, mood_id, note, Utc::now()) {
            Some(entry) => logged("save session log", self.storage.insert_log(&entry)).map(Some),
            None => Ok(None),
        }
    }

    /// Insert a log built elsewhere, e.g. by the log sheet
    pub fn insert_log(&self, entry: &NewLogEntry) -> Result<LogEntry, StorageError> {
        logged("insert log", self.storage.insert_log(entry))
    }

    pub fn delete_log(&self, log_id: LogId) -> Result<(), StorageError> {
        logged("delete log", self.storage.delete_log(log_id))
    }
}
