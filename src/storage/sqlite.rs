/// SQLite implementation of the storage interface
///
/// This module provides the concrete SQLite implementation for storing
/// and retrieving habits, moods and logs. It handles all SQL queries and
/// data conversion, and broadcasts a change notice after every write.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::sync::broadcast;

use crate::domain::{
    Habit, HabitId, LogDetails, LogEntry, LogId, Mood, MoodId, NewLogEntry,
};
use crate::storage::{migrations, EchoStorage, StorageError, StoreChange};

/// Capacity of the change channel; slow subscribers see a lag and re-query
const CHANGE_CHANNEL_CAPACITY: usize = 64;

const LOG_COLUMNS: &str = "l.id, l.habit_id, l.habit_name, l.mood_id, l.duration_ms, l.note, l.timestamp";

/// SQLite-based storage implementation
///
/// The connection sits behind a mutex so one handle can be shared through
/// an `Arc` by every mediator and background task.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
    changes: broadcast::Sender<StoreChange>,
}

impl SqliteStorage {
    /// Open (or create) the database file and bring the schema up to date
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db_path = db_path.as_ref();
        let conn = Connection::open(db_path)
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;

        let storage = Self::from_connection(conn)?;
        tracing::info!("SQLite storage initialized at: {:?}", db_path);
        Ok(storage)
    }

    /// Private in-memory database, used by tests and dry runs
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        // Enable foreign key constraints
        conn.execute("PRAGMA foreign_keys = ON", [])
            .map_err(|e| StorageError::Connection(format!("Failed to enable foreign keys: {}", e)))?;

        migrations::initialize_database(&conn)?;

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            conn: Mutex::new(conn),
            changes,
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Connection("Database lock poisoned".to_string()))
    }

    fn notify(&self, tables: &[StoreChange]) {
        for table in tables {
            // No receivers is fine, nobody is watching
            let _ = self.changes.send(*table);
        }
    }

    fn millis_to_datetime(millis: i64, column: usize) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::from_timestamp_millis(millis).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(column, "Invalid timestamp".to_string(), rusqlite::types::Type::Integer)
        })
    }

    /// Read a habit from `row` starting at column `at`
    fn habit_from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Habit> {
        let color: i64 = row.get(at + 2)?;
        let created_at: i64 = row.get(at + 4)?;

        Ok(Habit::from_existing(
            HabitId(row.get(at)?),
            row.get(at + 1)?, // name
            color as u32,
            row.get(at + 3)?, // is_timed
            Self::millis_to_datetime(created_at, at + 4)?,
        ))
    }

    fn log_from_row(row: &Row<'_>) -> rusqlite::Result<LogEntry> {
        let duration_ms: Option<i64> = row.get(4)?;
        let timestamp: i64 = row.get(6)?;

        Ok(LogEntry {
            id: LogId(row.get(0)?),
            habit_id: row.get::<_, Option<i64>>(1)?.map(HabitId),
            habit_name: row.get(2)?,
            mood_id: row.get::<_, Option<i64>>(3)?.map(MoodId),
            duration_ms: duration_ms.and_then(|d| u64::try_from(d).ok()),
            note: row.get(5)?,
            timestamp: Self::millis_to_datetime(timestamp, 6)?,
        })
    }

    fn details_from_row(row: &Row<'_>) -> rusqlite::Result<LogDetails> {
        let log = Self::log_from_row(row)?;

        // Columns 7..=11 are the joined habit, 12..=14 the joined mood
        let habit = match row.get::<_, Option<i64>>(7)? {
            Some(_) => Some(Self::habit_from_row(row, 7)?),
            None => None,
        };
        let mood = match row.get::<_, Option<i64>>(12)? {
            Some(id) => Some(Mood::from_existing(MoodId(id), row.get(13)?, row.get(14)?)),
            None => None,
        };

        Ok(LogDetails { log, habit, mood })
    }
}

impl EchoStorage for SqliteStorage {
    fn upsert_habit(&self, habit: &Habit) -> Result<HabitId, StorageError> {
        let conn = self.conn()?;

        let id = if habit.id.is_saved() {
            // Update in place: a delete-and-insert replace would fire the
            // ON DELETE SET NULL action and detach the habit's logs.
            conn.execute(
                "INSERT INTO habits (id, name, color, is_timed, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    color = excluded.color,
                    is_timed = excluded.is_timed,
                    created_at = excluded.created_at",
                params![
                    habit.id.0,
                    habit.name,
                    habit.color as i64,
                    habit.is_timed,
                    habit.created_at.timestamp_millis()
                ],
            )?;
            habit.id
        } else {
            conn.execute(
                "INSERT INTO habits (name, color, is_timed, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    habit.name,
                    habit.color as i64,
                    habit.is_timed,
                    habit.created_at.timestamp_millis()
                ],
            )?;
            HabitId(conn.last_insert_rowid())
        };
        drop(conn);

        tracing::debug!("Saved habit: {} ({})", habit.name, id);
        self.notify(&[StoreChange::Habits]);
        Ok(id)
    }

    fn get_habit(&self, habit_id: HabitId) -> Result<Habit, StorageError> {
        let conn = self.conn()?;
        let habit = conn
            .query_row(
                "SELECT id, name, color, is_timed, created_at FROM habits WHERE id = ?1",
                params![habit_id.0],
                |row| Self::habit_from_row(row, 0),
            )
            .optional()?;

        habit.ok_or(StorageError::HabitNotFound { habit_id })
    }

    fn delete_habit(&self, habit_id: HabitId) -> Result<(), StorageError> {
        let rows_affected = self
            .conn()?
            .execute("DELETE FROM habits WHERE id = ?1", params![habit_id.0])?;

        if rows_affected == 0 {
            return Err(StorageError::HabitNotFound { habit_id });
        }

        tracing::debug!("Deleted habit: {}", habit_id);
        // Referencing logs had their habit_id nulled
        self.notify(&[StoreChange::Habits, StoreChange::Logs]);
        Ok(())
    }

    fn list_habits(&self) -> Result<Vec<Habit>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, color, is_timed, created_at FROM habits ORDER BY created_at ASC, id ASC",
        )?;
        let habits = stmt
            .query_map([], |row| Self::habit_from_row(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(habits)
    }

    fn list_moods(&self) -> Result<Vec<Mood>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, label, icon FROM moods ORDER BY id ASC")?;
        let moods = stmt
            .query_map([], |row| {
                Ok(Mood::from_existing(MoodId(row.get(0)?), row.get(1)?, row.get(2)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(moods)
    }

    fn delete_mood(&self, mood_id: MoodId) -> Result<(), StorageError> {
        let rows_affected = self
            .conn()?
            .execute("DELETE FROM moods WHERE id = ?1", params![mood_id.0])?;

        if rows_affected == 0 {
            return Err(StorageError::MoodNotFound { mood_id });
        }

        tracing::warn!("Deleted mood {} and its logs", mood_id);
        self.notify(&[StoreChange::Moods, StoreChange::Logs]);
        Ok(())
    }

    fn insert_log(&self, entry: &NewLogEntry) -> Result<LogEntry, StorageError> {
        entry.validate()?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO logs (habit_id, habit_name, mood_id, duration_ms, note, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.habit_id.map(|h| h.0),
                entry.habit_name,
                entry.mood_id.map(|m| m.0),
                entry.duration_ms.and_then(|d| i64::try_from(d).ok()),
                entry.note,
                entry.timestamp.timestamp_millis()
            ],
        )?;
        let log_id = LogId(conn.last_insert_rowid());
        drop(conn);

        tracing::debug!(
            "Created log {} (habit {:?}, mood {:?}, duration {:?})",
            log_id,
            entry.habit_id,
            entry.mood_id,
            entry.duration_ms
        );
        self.notify(&[StoreChange::Logs]);
        Ok(entry.clone().into_entry(log_id))
    }

    fn delete_log(&self, log_id: LogId) -> Result<(), StorageError> {
        let rows_affected = self
            .conn()?
            .execute("DELETE FROM logs WHERE id = ?1", params![log_id.0])?;

        if rows_affected == 0 {
            return Err(StorageError::LogNotFound { log_id });
        }

        tracing::debug!("Deleted log: {}", log_id);
        self.notify(&[StoreChange::Logs]);
        Ok(())
    }

    fn logs_since(&self, since: DateTime<Utc>) -> Result<Vec<LogEntry>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM logs l WHERE l.timestamp >= ?1 ORDER BY l.timestamp ASC, l.id ASC",
            LOG_COLUMNS
        ))?;
        let logs = stmt
            .query_map(params![since.timestamp_millis()], Self::log_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(logs)
    }

    fn log_details_since(&self, since: DateTime<Utc>) -> Result<Vec<LogDetails>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {},
                    h.id, h.name, h.color, h.is_timed, h.created_at,
                    m.id, m.label, m.icon
             FROM logs l
             LEFT JOIN habits h ON h.id = l.habit_id
             LEFT JOIN moods m ON m.id = l.mood_id
             WHERE l.timestamp >= ?1
             ORDER BY l.timestamp DESC, l.id DESC",
            LOG_COLUMNS
        ))?;
        let details = stmt
            .query_map(params![since.timestamp_millis()], Self::details_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(details)
    }

    fn subscribe_changes(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::domain::{MoodCheckIn, MOOD_CHECKIN_NAME};

    fn storage() -> SqliteStorage {
        SqliteStorage::in_memory().unwrap()
    }

    fn saved_habit(storage: &SqliteStorage, name: &str, timed: bool) -> Habit {
        let mut habit = Habit::new(name.to_string(), timed, None).unwrap();
        habit.id = storage.upsert_habit(&habit).unwrap();
        habit
    }

    fn epoch() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(0).unwrap()
    }

    #[test]
    fn test_habit_round_trip() {
        let storage = storage();
        let habit = saved_habit(&storage, "Read", true);
        assert!(habit.id.is_saved());

        let loaded = storage.get_habit(habit.id).unwrap();
        assert_eq!(loaded.name, "Read");
        assert!(loaded.is_timed);
        assert_eq!(loaded.color, habit.color);
        assert_eq!(loaded.created_at.timestamp_millis(), habit.created_at.timestamp_millis());
    }

    #[test]
    fn test_upsert_replaces_without_detaching_logs() {
        let storage = storage();
        let habit = saved_habit(&storage, "Read", false);
        storage.insert_log(&NewLogEntry::habit_completion(&habit, Utc::now())).unwrap();

        let edited = habit.edited("Read more".to_string(), true, Some(0xFF000000)).unwrap();
        assert_eq!(storage.upsert_habit(&edited).unwrap(), habit.id);

        let habits = storage.list_habits().unwrap();
        assert_eq!(habits.len(), 1);
        assert_eq!(habits[0].name, "Read more");
        assert_eq!(habits[0].color, 0xFF000000);

        let logs = storage.logs_since(epoch()).unwrap();
        assert_eq!(logs[0].habit_id, Some(habit.id));
        assert_eq!(logs[0].habit_name.as_deref(), Some("Read"));
    }

    #[test]
    fn test_missing_habit() {
        let storage = storage();
        assert!(matches!(
            storage.get_habit(HabitId(42)),
            Err(StorageError::HabitNotFound { .. })
        ));
        assert!(storage.delete_habit(HabitId(42)).is_err());
    }

    #[test]
    fn test_delete_habit_keeps_history() {
        let storage = storage();
        let habit = saved_habit(&storage, "Journal", false);
        for _ in 0..3 {
            storage.insert_log(&NewLogEntry::habit_completion(&habit, Utc::now())).unwrap();
        }

        storage.delete_habit(habit.id).unwrap();

        let logs = storage.logs_since(epoch()).unwrap();
        assert_eq!(logs.len(), 3);
        for log in logs {
            assert_eq!(log.habit_id, None);
            assert_eq!(log.habit_name.as_deref(), Some("Journal"));
        }
    }

    #[test]
    fn test_delete_mood_cascades() {
        let storage = storage();
        let habit = saved_habit(&storage, "Run", true);
        for _ in 0..2 {
            let entry = NewLogEntry::session_finish(habit.id, &habit.name, 1000, Some(MoodId(4)), None, Utc::now()).unwrap();
            storage.insert_log(&entry).unwrap();
        }
        storage.insert_log(&NewLogEntry::habit_completion(&habit, Utc::now())).unwrap();

        storage.delete_mood(MoodId(4)).unwrap();

        let logs = storage.logs_since(epoch()).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].mood_id, None);
        assert_eq!(storage.list_moods().unwrap().len(), 4);
    }

    #[test]
    fn test_log_details_join() {
        let storage = storage();
        let habit = saved_habit(&storage, "Read", true);
        let earlier = Utc::now() - Duration::minutes(5);
        let entry = NewLogEntry::session_finish(habit.id, "Read", 6000, Some(MoodId(2)), Some("calm".to_string()), earlier).unwrap();
        storage.insert_log(&entry).unwrap();

        let checkin = MoodCheckIn::new("😊".to_string(), "Hi?".to_string()).unwrap();
        storage.insert_log(&NewLogEntry::mood_checkin(&checkin, Utc::now())).unwrap();

        let details = storage.log_details_since(epoch()).unwrap();
        assert_eq!(details.len(), 2);

        // Newest first
        assert_eq!(details[0].log.habit_name.as_deref(), Some(MOOD_CHECKIN_NAME));
        assert!(details[0].habit.is_none());
        assert!(details[0].mood.is_none());

        assert_eq!(details[1].habit.as_ref().map(|h| h.id), Some(habit.id));
        assert_eq!(details[1].mood.as_ref().map(|m| m.label.as_str()), Some("Good"));
        assert_eq!(details[1].log.duration_ms, Some(6000));
        assert_eq!(details[1].title(), "Read");
    }

    #[test]
    fn test_logs_since_filters_by_timestamp() {
        let storage = storage();
        let habit = saved_habit(&storage, "Walk", false);
        let now = Utc::now();
        storage.insert_log(&NewLogEntry::habit_completion(&habit, now - Duration::days(2))).unwrap();
        storage.insert_log(&NewLogEntry::habit_completion(&habit, now)).unwrap();

        let recent = storage.logs_since(now - Duration::hours(1)).unwrap();
        assert_eq!(recent.len(), 1);
    }

    #[test]
    fn test_invalid_log_rejected() {
        let storage = storage();
        let empty = NewLogEntry::from_sheet(None, None, None, None, None, Utc::now());
        assert!(matches!(storage.insert_log(&empty), Err(StorageError::Invalid(_))));

        let dangling = NewLogEntry::from_sheet(None, None, Some(MoodId(99)), None, None, Utc::now());
        assert!(matches!(storage.insert_log(&dangling), Err(StorageError::Query(_))));
    }

    #[test]
    fn test_change_notifications() {
        let storage = storage();
        let mut changes = storage.subscribe_changes();

        let habit = saved_habit(&storage, "Read", false);
        assert_eq!(changes.try_recv().unwrap(), StoreChange::Habits);

        let log = storage.insert_log(&NewLogEntry::habit_completion(&habit, Utc::now())).unwrap();
        assert_eq!(changes.try_recv().unwrap(), StoreChange::Logs);

        storage.delete_log(log.id).unwrap();
        assert_eq!(changes.try_recv().unwrap(), StoreChange::Logs);

        storage.delete_habit(habit.id).unwrap();
        assert_eq!(changes.try_recv().unwrap(), StoreChange::Habits);
        assert_eq!(changes.try_recv().unwrap(), StoreChange::Logs);
    }
}
