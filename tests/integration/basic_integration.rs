/// Basic integration tests
use echo_tracker::*;
use tempfile::TempDir;

#[cfg(test)]
mod basic_integration_tests {
    use super::*;

    #[tokio::test]
    async fn test_database_persistence() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let config = EchoConfig::in_dir(dir.path());

        let habit_id = {
            let server = EchoServer::new(config.clone())
                .await
                .expect("Failed to create first server");
            let habit = server.habits().create("Read".to_string(), true, None).unwrap();
            server.home().complete_habit(&habit).unwrap();
            server.settings().set_theme(ThemeMode::Yellow).unwrap();
            habit.id
        };

        // Second server on the same files sees the same data
        let server = EchoServer::new(config)
            .await
            .expect("Failed to create second server");
        let habit = server.habits().get(habit_id).unwrap();
        assert_eq!(habit.name, "Read");
        assert!(habit.is_timed);

        let states = server.home().habit_states().refresh().unwrap();
        assert!(states[0].completed_today);
        assert_eq!(server.settings().theme(), ThemeMode::Yellow);
        assert_eq!(server.home().moods().refresh().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_habit_delete_keeps_log_snapshot() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let server = EchoServer::new(EchoConfig::in_dir(dir.path())).await.unwrap();

        let habit = server.habits().create("Walk".to_string(), false, None).unwrap();
        let log = server.home().complete_habit(&habit).unwrap();
        server.habits().delete(habit.id).unwrap();

        let recent = server.stats().recent_logs().refresh().unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].log.id, log.id);
        assert_eq!(recent[0].log.habit_id, None);
        assert_eq!(recent[0].log.habit_name.as_deref(), Some("Walk"));
        assert!(recent[0].habit.is_none());
        assert_eq!(recent[0].title(), "Walk");
    }

    #[tokio::test]
    async fn test_mood_delete_cascades() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let server = EchoServer::new(EchoConfig::in_dir(dir.path())).await.unwrap();
        let habit = server.habits().create("Journal".to_string(), false, None).unwrap();

        let tagged = NewLogEntry::from_sheet(Some(habit.id), Some(habit.name.clone()), Some(MoodId(4)), None, None, chrono::Utc::now());
        server.home().insert_log(&tagged).unwrap();
        server.home().complete_habit(&habit).unwrap();

        server.storage().delete_mood(MoodId(4)).unwrap();

        let recent = server.stats().recent_logs().refresh().unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].log.mood_id, None);
        assert_eq!(server.home().moods().refresh().unwrap().len(), 4);
    }
}
