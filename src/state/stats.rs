/// Stats surface state: the weekly chart and the recent log list

use std::sync::Arc;
use std::time::Duration;

use crate::domain::{local_today, stats_window_start, weekly_stats, DailyStat, LogDetails, LogId};
use crate::state::{logged, LiveQuery};
use crate::storage::{EchoStorage, StorageError, StoreChange};

pub struct StatsState {
    storage: Arc<dyn EchoStorage>,
    weekly_stats: LiveQuery<Vec<DailyStat>>,
    recent_logs: LiveQuery<Vec<LogDetails>>,
}

impl StatsState {
    pub fn new(storage: Arc<dyn EchoStorage>, grace: Duration) -> Self {
        let weekly = LiveQuery::new(
            "weekly_stats",
            storage.clone(),
            &[StoreChange::Logs],
            grace,
            Vec::new(),
            |s| {
                let today = local_today();
                let logs = s.logs_since(stats_window_start(today))?;
                Ok(weekly_stats(&logs, today))
            },
        );

        // Joined rows change with the habits and moods they show too
        let recent = LiveQuery::new(
            "recent_logs",
            storage.clone(),
            &[StoreChange::Logs, StoreChange::Habits, StoreChange::Moods],
            grace,
            Vec::new(),
            |s| s.log_details_since(stats_window_start(local_today())),
        );

        Self {
            storage,
            weekly_stats: weekly,
            recent_logs: recent,
        }
    }

    /// Seven daily buckets ending today, oldest first
    pub fn weekly_stats(&self) -> &LiveQuery<Vec<DailyStat>> {
        &self.weekly_stats
    }

    /// Logs of the last seven days with habit and mood, newest first
    pub fn recent_logs(&self) -> &LiveQuery<Vec<LogDetails>> {
        &self.recent_logs
    }

    pub fn delete_log(&self, log_id: LogId) -> Result<(), StorageError> {
        logged("delete log", self.storage.delete_log(log_id))
    }
}
