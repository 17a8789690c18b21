/// Unit tests for the reconciliation rules and derived views
use chrono::{Duration, Utc};
use echo_tracker::*;

fn log(id: i64, entry: NewLogEntry) -> LogEntry {
    entry.into_entry(LogId(id))
}

fn stored_habit(id: i64, name: &str) -> Habit {
    let mut habit = Habit::new(name.to_string(), false, None).unwrap();
    habit.id = HabitId(id);
    habit
}

#[test]
fn test_completed_today_is_boolean() {
    let water = stored_habit(1, "Drink Water");
    let stretch = stored_habit(2, "Stretch");
    let habits = vec![water.clone(), stretch];
    let now = Utc::now();

    let none = habit_statuses(&habits, &[]);
    assert!(none.iter().all(|s| !s.completed_today));

    let once = vec![log(1, NewLogEntry::habit_completion(&water, now))];
    assert!(habit_statuses(&habits, &once)[0].completed_today);

    let twice = vec![
        log(1, NewLogEntry::habit_completion(&water, now)),
        log(2, NewLogEntry::habit_completion(&water, now)),
    ];
    let statuses = habit_statuses(&habits, &twice);
    assert!(statuses[0].completed_today);
    assert!(!statuses[1].completed_today);
}

#[test]
fn test_mood_checkin_round_trip() {
    let prompt = MoodPrompt::fixed(0);
    let checkin = prompt.answer("🙂").unwrap();
    let entry = log(1, NewLogEntry::mood_checkin(&checkin, Utc::now()));

    assert_eq!(entry.habit_name.as_deref(), Some(MOOD_CHECKIN_NAME));
    assert!(entry.is_mood_checkin());
    assert!(mood_logged_today(&[entry.clone()]));
    assert_eq!(entry.mood_checkin(), Some(checkin));
}

#[test]
fn test_phrase_with_separator_decodes() {
    let checkin = MoodCheckIn::new("😐".to_string(), "Either | or?".to_string()).unwrap();
    let note = checkin.to_note();
    assert_eq!(note, "😐 | Either | or?");
    assert_eq!(MoodCheckIn::from_note(&note), Some(checkin));
}

#[test]
fn test_weekly_window() {
    let today = local_today();
    let now = Utc::now();
    let habit = stored_habit(1, "Read");

    let logs = vec![
        log(1, NewLogEntry::habit_completion(&habit, now)),
        log(2, NewLogEntry::habit_completion(&habit, now - Duration::days(3))),
        log(3, NewLogEntry::habit_completion(&habit, now - Duration::days(3))),
        // Outside the window
        log(4, NewLogEntry::habit_completion(&habit, now - Duration::days(9))),
    ];

    let stats = weekly_stats(&logs, today);
    assert_eq!(stats.len(), 7);
    assert_eq!(stats[6].date, today);
    assert_eq!(stats[6].count, 1);
    assert_eq!(stats[3].count, 2);
    assert_eq!(stats.iter().map(|s| s.count).sum::<u32>(), 3);
    assert!(stats.windows(2).all(|w| w[0].date < w[1].date));
}

#[test]
fn test_theme_ordinals() {
    assert_eq!(ThemeMode::default().ordinal(), 1);
    for theme in ThemeMode::ALL {
        assert_eq!(ThemeMode::from_ordinal(theme.ordinal()), Some(theme));
    }
    assert_eq!(ThemeMode::from_ordinal(5), None);
    assert_eq!(ThemeMode::from_ordinal(-1), None);
}
