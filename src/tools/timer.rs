/// Tools driving the session timer
///
/// This module implements timer_start, timer_pause, timer_stop, timer_reset,
/// timer_status and timer_finish. Commands go through the session controller,
/// so they are refused while it is still connecting to the timer service.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use crate::domain::{HabitId, LogEntry, MoodId};
use crate::state::{HabitManager, HomeState};
use crate::storage::StorageError;
use crate::timer::{SessionController, DEFAULT_SESSION_LABEL};

const NOT_CONNECTED: &str = "⏳ The timer is still connecting. Try again in a moment.";

/// The habit the current session is timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerSession {
    pub habit_id: HabitId,
    pub habit_name: String,
}

impl Default for TimerSession {
    fn default() -> Self {
        Self {
            habit_id: HabitId::UNSAVED,
            habit_name: DEFAULT_SESSION_LABEL.to_string(),
        }
    }
}

/// Parameters for starting a session
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct TimerStartParams {
    /// Habit to time (optional, defaults to 0 meaning no stored habit)
    #[serde(default)]
    pub habit_id: i64,
    /// Name to show and log (optional, defaults to the habit's name or "Habit")
    pub habit_name: Option<String>,
}

/// Parameters for finishing a session
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct TimerFinishParams {
    /// Mood to attach to the log (optional, 1-5)
    pub mood_id: Option<i64>,
    /// Note to attach to the log (optional)
    pub note: Option<String>,
}

/// Response from a timer command
#[derive(Debug, Serialize)]
pub struct TimerResponse {
    /// `false` when the command was dropped
    pub accepted: bool,
    pub message: String,
}

/// Response from timer_status
#[derive(Debug, Serialize)]
pub struct TimerStatusResponse {
    pub session: TimerSession,
    pub elapsed_ms: u64,
    pub elapsed: String,
    pub running: bool,
    pub message: String,
}

/// Response from timer_finish
#[derive(Debug, Serialize)]
pub struct TimerFinishResponse {
    pub log: Option<LogEntry>,
    pub message: String,
}

fn dropped() -> TimerResponse {
    TimerResponse {
        accepted: false,
        message: NOT_CONNECTED.to_string(),
    }
}

/// Start timing, or resume a paused or stopped session
///
/// The habit is only picked up for a fresh session; resuming keeps timing
/// the habit the session started with.
pub fn start_timer(
    controller: &SessionController,
    manager: &HabitManager,
    session: &mut TimerSession,
    params: TimerStartParams,
) -> Result<TimerResponse, StorageError> {
    if !controller.is_connected() {
        return Ok(dropped());
    }
    if controller.is_running() {
        return Ok(TimerResponse {
            accepted: true,
            message: format!("⏱️ Already timing '{}'", session.habit_name),
        });
    }

    let resuming = controller.elapsed_ms() > 0;
    if !resuming {
        let habit_id = HabitId(params.habit_id);
        let habit_name = match params.habit_name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ if habit_id.is_saved() => manager.get(habit_id)?.name,
            _ => DEFAULT_SESSION_LABEL.to_string(),
        };
        *session = TimerSession { habit_id, habit_name };
    }

    if !controller.start(&session.habit_name) {
        return Ok(dropped());
    }

    let message = if resuming {
        format!(
            "▶️ Resumed '{}' at {}",
            session.habit_name,
            controller.format_time(controller.elapsed_ms())
        )
    } else {
        format!("▶️ Started timing '{}'", session.habit_name)
    };
    Ok(TimerResponse { accepted: true, message })
}

pub fn pause_timer(controller: &SessionController) -> TimerResponse {
    if !controller.pause() {
        return dropped();
    }
    TimerResponse {
        accepted: true,
        message: format!("⏸️ Paused at {}", controller.format_time(controller.elapsed_ms())),
    }
}

/// Stop the session; the elapsed time is kept until reset or finish
pub fn stop_timer(controller: &SessionController) -> TimerResponse {
    if !controller.stop() {
        return dropped();
    }
    TimerResponse {
        accepted: true,
        message: format!("⏹️ Stopped at {}", controller.format_time(controller.elapsed_ms())),
    }
}

pub fn reset_timer(controller: &SessionController) -> TimerResponse {
    if !controller.reset() {
        return dropped();
    }
    TimerResponse {
        accepted: true,
        message: "🔄 Timer reset to 00:00".to_string(),
    }
}

pub fn timer_status(controller: &SessionController, session: &TimerSession) -> TimerStatusResponse {
    let elapsed_ms = controller.elapsed_ms();
    let running = controller.is_running();
    let elapsed = controller.format_time(elapsed_ms);

    let message = if !controller.is_connected() {
        NOT_CONNECTED.to_string()
    } else if running {
        format!("⏱️ Timing '{}': {}", session.habit_name, elapsed)
    } else if elapsed_ms > 0 {
        format!("⏸️ '{}' on hold at {}", session.habit_name, elapsed)
    } else {
        "Timer is ready. Start a session to begin.".to_string()
    };

    TimerStatusResponse {
        session: session.clone(),
        elapsed_ms,
        elapsed,
        running,
        message,
    }
}

/// End the session and log it
///
/// The logged duration is the value the service froze at when it handled the
/// stop. Nothing is logged for a session that never ran. If the log can't be
/// written the timer stays stopped with its time intact, so the call can be
/// retried.
pub async fn finish_timer(
    controller: &SessionController,
    home: &HomeState,
    session: &mut TimerSession,
    params: TimerFinishParams,
) -> Result<TimerFinishResponse, StorageError> {
    let not_connected = || TimerFinishResponse {
        log: None,
        message: NOT_CONNECTED.to_string(),
    };
    if !controller.is_connected() {
        return Ok(not_connected());
    }

    let elapsed_ms = match controller.stop_and_read().await {
        Some(millis) => millis,
        None => return Ok(not_connected()),
    };
    if elapsed_ms == 0 {
        return Ok(TimerFinishResponse {
            log: None,
            message: "Nothing to log, the timer hasn't run.".to_string(),
        });
    }

    let log = home.finish_session(
        session.habit_id,
        &session.habit_name,
        elapsed_ms,
        params.mood_id.map(MoodId),
        params.note,
    )?;
    controller.reset();

    let message = format!(
        "✅ Logged {} of '{}'",
        controller.format_time(elapsed_ms),
        session.habit_name
    );
    *session = TimerSession::default();

    Ok(TimerFinishResponse { log, message })
}
