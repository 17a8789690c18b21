/// Derived views over habits and logs
///
/// Nothing here is stored. "Completed today", "mood logged today" and the
/// weekly counts are recomputed from the current log rows each time.

use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use crate::domain::{local_date, start_of_local_day, Habit, LogEntry};

/// Number of calendar days in the stats window, today included
pub const STATS_WINDOW_DAYS: i64 = 7;

/// A habit together with whether it has been done today
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitStatus {
    pub habit: Habit,
    pub completed_today: bool,
}

/// Log count for one local calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStat {
    pub date: NaiveDate,
    /// Abbreviated weekday, e.g. "Mon"
    pub day_label: String,
    pub count: u32,
}

/// Pair every habit with its completion state
///
/// `todays_logs` must hold the logs since the start of the current local day.
/// Any number of matching rows counts as a single completion.
pub fn habit_statuses(habits: &[Habit], todays_logs: &[LogEntry]) -> Vec<HabitStatus> {
    habits
        .iter()
        .map(|habit| HabitStatus {
            habit: habit.clone(),
            completed_today: todays_logs.iter().any(|log| log.habit_id == Some(habit.id)),
        })
        .collect()
}

/// Whether any of today's logs is a mood-only check-in
pub fn mood_logged_today(todays_logs: &[LogEntry]) -> bool {
    todays_logs.iter().any(LogEntry::is_mood_checkin)
}

/// First instant of the stats window ending on `today`
pub fn stats_window_start(today: NaiveDate) -> DateTime<Utc> {
    start_of_local_day(today - Duration::days(STATS_WINDOW_DAYS - 1))
}

/// Bucket logs into the seven local days ending on `today`
///
/// Always returns exactly seven buckets, oldest first. Logs outside the
/// window are ignored.
pub fn weekly_stats(logs: &[LogEntry], today: NaiveDate) -> Vec<DailyStat> {
    let mut counts: HashMap<NaiveDate, u32> = HashMap::new();
    for log in logs {
        *counts.entry(local_date(log.timestamp)).or_insert(0) += 1;
    }

    (0..STATS_WINDOW_DAYS)
        .map(|i| {
            let date = today - Duration::days(STATS_WINDOW_DAYS - 1 - i);
            DailyStat {
                date,
                day_label: date.format("%a").to_string(),
                count: counts.get(&date).copied().unwrap_or(0),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HabitId, LogId, MoodCheckIn, NewLogEntry};

    fn habit(id: i64, name: &str) -> Habit {
        let mut habit = Habit::new(name.to_string(), false, None).unwrap();
        habit.id = HabitId(id);
        habit
    }

    fn log_at(id: i64, habit: &Habit, at: DateTime<Utc>) -> LogEntry {
        NewLogEntry::habit_completion(habit, at).into_entry(LogId(id))
    }

    #[test]
    fn test_completed_today_counts_once() {
        let read = habit(1, "Read");
        let walk = habit(2, "Walk");
        let now = Utc::now();
        let logs = vec![log_at(1, &read, now), log_at(2, &read, now)];

        let statuses = habit_statuses(&[read, walk], &logs);
        assert!(statuses[0].completed_today);
        assert!(!statuses[1].completed_today);
    }

    #[test]
    fn test_mood_logged_today() {
        let read = habit(1, "Read");
        let now = Utc::now();
        let mut logs = vec![log_at(1, &read, now)];
        assert!(!mood_logged_today(&logs));

        let checkin = MoodCheckIn::new("😊".to_string(), "Hi?".to_string()).unwrap();
        logs.push(NewLogEntry::mood_checkin(&checkin, now).into_entry(LogId(2)));
        assert!(mood_logged_today(&logs));
    }

    #[test]
    fn test_weekly_buckets() {
        let read = habit(1, "Read");
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let noon = |d: NaiveDate| start_of_local_day(d) + Duration::hours(12);

        let logs = vec![
            log_at(1, &read, noon(today)),
            log_at(2, &read, noon(today)),
            log_at(3, &read, noon(today - Duration::days(6))),
            log_at(4, &read, noon(today - Duration::days(3))),
            // Outside the window
            log_at(5, &read, noon(today - Duration::days(7))),
        ];

        let stats = weekly_stats(&logs, today);
        assert_eq!(stats.len(), 7);
        assert_eq!(stats[0].date, today - Duration::days(6));
        assert_eq!(stats[6].date, today);
        assert_eq!(stats[6].day_label, "Sun");
        let counts: Vec<u32> = stats.iter().map(|s| s.count).collect();
        assert_eq!(counts, vec![1, 0, 0, 1, 0, 0, 2]);
        assert_eq!(stats_window_start(today), start_of_local_day(today - Duration::days(6)));
    }

    #[test]
    fn test_weekly_buckets_empty() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let stats = weekly_stats(&[], today);
        assert_eq!(stats.len(), 7);
        assert!(stats.iter().all(|s| s.count == 0));
    }
}
