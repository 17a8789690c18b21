/// Database schema management
///
/// This module creates the SQLite schema and seeds the fixed mood rows.
/// There is no incremental migration path: when the stored schema version
/// differs from the current one, the tables are dropped and recreated.

use rusqlite::Connection;
use crate::domain::SEED_MOODS;
use crate::storage::StorageError;

/// Current database schema version
///
/// Bump this whenever the schema changes; existing data is then discarded.
pub const CURRENT_VERSION: i32 = 2;

/// Initialize the database schema
///
/// Creates all tables and indexes if they don't exist, resets them on a
/// version mismatch, and re-asserts the mood seed rows.
pub fn initialize_database(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    let current_version = get_current_version(conn)?;

    if current_version != CURRENT_VERSION {
        if current_version != 0 {
            tracing::warn!(
                "Schema version {} does not match {}, resetting database",
                current_version,
                CURRENT_VERSION
            );
            drop_tables(conn)?;
        }
        create_schema(conn)?;
        set_version(conn, CURRENT_VERSION)?;
    }

    seed_moods(conn)?;
    Ok(())
}

/// Get the current database schema version
fn get_current_version(conn: &Connection) -> Result<i32, StorageError> {
    let version = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get::<_, i32>(0)
        })
        .unwrap_or(0); // Default to version 0 if no version record exists

    Ok(version)
}

/// Set the database schema version
fn set_version(conn: &Connection, version: i32) -> Result<(), StorageError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Drop every application table, children first
fn drop_tables(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "DROP TABLE IF EXISTS logs;
         DROP TABLE IF EXISTS habits;
         DROP TABLE IF EXISTS moods;",
    )
    .map_err(|e| StorageError::Migration(format!("Failed to drop tables: {}", e)))?;
    Ok(())
}

/// Create the habits, moods and logs tables
fn create_schema(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS habits (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            color INTEGER NOT NULL,
            is_timed INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS moods (
            id INTEGER PRIMARY KEY,
            label TEXT NOT NULL,
            icon TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            habit_id INTEGER,
            habit_name TEXT,
            mood_id INTEGER,
            duration_ms INTEGER,
            note TEXT,
            timestamp INTEGER NOT NULL,
            FOREIGN KEY (habit_id) REFERENCES habits (id) ON DELETE SET NULL,
            FOREIGN KEY (mood_id) REFERENCES moods (id) ON DELETE CASCADE
        )",
        [],
    )?;

    create_indexes(conn)?;

    tracing::info!("Created database schema v{}", CURRENT_VERSION);
    Ok(())
}

/// Create indexes on the foreign keys and the ordering column
fn create_indexes(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_logs_habit_id ON logs (habit_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_logs_mood_id ON logs (mood_id)",
        [],
    )?;

    // Every live query filters on a timestamp lower bound
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_logs_timestamp ON logs (timestamp)",
        [],
    )?;

    Ok(())
}

/// Insert any missing seed moods, all or nothing
fn seed_moods(conn: &Connection) -> Result<(), StorageError> {
    let tx = conn.unchecked_transaction()?;
    for (id, label, icon) in SEED_MOODS {
        tx.execute(
            "INSERT OR IGNORE INTO moods (id, label, icon) VALUES (?1, ?2, ?3)",
            rusqlite::params![id, label, icon],
        )?;
    }
    tx.commit()?;

    tracing::debug!("Mood seed rows asserted");
    Ok(())
}
