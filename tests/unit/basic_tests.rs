/// Basic unit tests to verify core functionality
use echo_tracker::*;
use std::sync::Arc;
use tempfile::{NamedTempFile, TempDir};
use tokio_test::{assert_err, assert_ok};

#[cfg(test)]
mod basic_unit_tests {
    use super::*;

    #[test]
    fn test_habit_creation() {
        let habit = assert_ok!(Habit::new("Test Habit".to_string(), false, None));
        assert_eq!(habit.name, "Test Habit");
        assert_eq!(habit.id, HabitId::UNSAVED);
        assert_eq!(habit.color, DEFAULT_HABIT_COLOR);
        assert_eq!(habit.kind_label(), "Simple Checkbox");

        assert_err!(Habit::new("   ".to_string(), true, None));
        assert_err!(Habit::new("x".repeat(101), true, None));
    }

    #[test]
    fn test_storage_creation() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let storage = assert_ok!(SqliteStorage::new(temp_file.path()));

        // Moods are seeded on open
        let moods = storage.list_moods().unwrap();
        let labels: Vec<_> = moods.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, ["Great", "Good", "Okay", "Low", "Bad"]);
    }

    #[test]
    fn test_storage_interface() {
        let storage = SqliteStorage::in_memory().expect("Failed to create storage");
        let shared: Arc<dyn EchoStorage> = Arc::new(storage);
        assert!(shared.list_habits().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_server_creation() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let server = assert_ok!(EchoServer::new(EchoConfig::in_dir(dir.path())).await);

        assert!(server.storage().list_habits().unwrap().is_empty());
        assert_eq!(server.settings().theme(), ThemeMode::DarkMode2);
        assert!(MOOD_PHRASES.contains(&server.prompt().phrase()));
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(65_000), "01:05");
        assert_eq!(format_elapsed(3_600_000), "60:00");
    }

    #[test]
    fn test_tool_definitions_have_schemas() {
        for tool in tool_definitions() {
            assert_eq!(tool.input_schema["type"], "object", "{} schema", tool.name);
        }
    }
}
