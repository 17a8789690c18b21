/// Stopwatch state machine for one timed session
///
/// Pure bookkeeping: the caller passes in the current instant. Elapsed time
/// is always `base + (now - resumed_at)` against a monotonic clock, never a
/// sum of tick deltas, so ticks that fire late don't accumulate drift.
///
/// ```text
/// Idle -> Running <-> Paused
///            |          |
///            +-> Stopped <-+     (start from Stopped resumes)
/// ```

use std::time::Duration;
use serde::Serialize;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Running,
    Paused,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct Stopwatch {
    state: SessionState,
    /// Elapsed time banked before the current run
    base: Duration,
    /// When the current run began, only set while running
    resumed_at: Option<Instant>,
    /// Last computed elapsed time; what observers see
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            base: Duration::ZERO,
            resumed_at: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Running or paused: a session the user still has to finish
    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Running | SessionState::Paused)
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }

    /// Begin or resume timing. Returns `false` if already running.
    ///
    /// Whatever elapsed time is currently held carries over, so starting
    /// after a pause or a stop continues from there unless `reset` ran.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.is_running() {
            return false;
        }
        self.base = self.elapsed;
        self.resumed_at = Some(now);
        self.state = SessionState::Running;
        true
    }

    /// Recompute elapsed time; only moves while running
    pub fn tick(&mut self, now: Instant) -> Duration {
        if let (SessionState::Running, Some(resumed_at)) = (self.state, self.resumed_at) {
            self.elapsed = self.base + now.saturating_duration_since(resumed_at);
        }
        self.elapsed
    }

    /// Freeze at the last computed value. Returns `false` if not running.
    pub fn pause(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.resumed_at = None;
        self.state = SessionState::Paused;
        true
    }

    /// End the session, keeping the elapsed value for the caller to read
    pub fn stop(&mut self) {
        self.resumed_at = None;
        self.state = SessionState::Stopped;
    }

    /// Zero the elapsed time without changing state
    ///
    /// A running stopwatch counts on from zero starting `now`.
    pub fn reset(&mut self, now: Instant) {
        self.base = Duration::ZERO;
        self.elapsed = Duration::ZERO;
        if self.is_running() {
            self.resumed_at = Some(now);
        }
    }
}
