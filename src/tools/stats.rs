/// Tools for the stats view
///
/// This module implements stats_weekly (a daily chart of the last seven
/// days) and logs_recent (the detailed log list).

use serde::Serialize;
use crate::domain::{local_date, DailyStat, LogDetails};
use crate::state::StatsState;
use crate::storage::StorageError;
use crate::timer::format_elapsed;

/// Response from stats_weekly
#[derive(Debug, Serialize)]
pub struct WeeklyStatsResponse {
    pub days: Vec<DailyStat>,
    pub total: u32,
    pub message: String,
}

/// Response from logs_recent
#[derive(Debug, Serialize)]
pub struct RecentLogsResponse {
    pub logs: Vec<LogDetails>,
    pub message: String,
}

/// Seven daily buckets ending today, with a bar per day
pub fn weekly_stats(stats: &StatsState) -> Result<WeeklyStatsResponse, StorageError> {
    let days = stats.weekly_stats().refresh()?;
    let total: u32 = days.iter().map(|d| d.count).sum();

    let message = if total == 0 {
        "📊 No activity in the last 7 days.".to_string()
    } else {
        let peak = days.iter().map(|d| d.count).max().unwrap_or(1).max(1);
        let bars = days
            .iter()
            .map(|d| {
                // Scale to at most 10 blocks
                let width = (d.count * 10 + peak - 1) / peak;
                format!("{} {:<10} {}", d.day_label, "█".repeat(width as usize), d.count)
            })
            .collect::<Vec<_>>()
            .join("\n");
        format!("📊 Last 7 days ({} logs)\n\n{}", total, bars)
    };

    Ok(WeeklyStatsResponse { days, total, message })
}

fn describe(details: &LogDetails) -> String {
    let log = &details.log;
    let when = log.timestamp.with_timezone(&chrono::Local).format("%a %H:%M");

    if let Some(checkin) = log.mood_checkin() {
        return format!("{} {} Mood check-in: \"{}\" (ID: {})", when, checkin.emoji, checkin.phrase, log.id);
    }

    let mut line = format!("{} {}", when, details.title());
    if let Some(mood) = &details.mood {
        line.push_str(&format!(" {} {}", mood.icon, mood.label));
    }
    if let Some(duration) = log.duration_ms {
        line.push_str(&format!(" ⏱️ {}", format_elapsed(duration)));
    }
    if let Some(note) = &log.note {
        line.push_str(&format!(" - {}", note));
    }
    line.push_str(&format!(" (ID: {})", log.id));
    line
}

/// Logs of the last seven days, newest first, grouped by day
pub fn recent_logs(stats: &StatsState) -> Result<RecentLogsResponse, StorageError> {
    let logs = stats.recent_logs().refresh()?;

    let message = if logs.is_empty() {
        "No logs in the last 7 days.".to_string()
    } else {
        let mut out = format!("🗒️ Recent logs ({})", logs.len());
        let mut current_day = None;
        for details in &logs {
            let day = local_date(details.log.timestamp);
            if current_day != Some(day) {
                out.push_str(&format!("\n\n{}", day.format("%A %d %B")));
                current_day = Some(day);
            }
            out.push('\n');
            out.push_str(&describe(details));
        }
        out
    };

    Ok(RecentLogsResponse { logs, message })
}
