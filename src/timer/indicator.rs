/// The user-visible "session in progress" indicator
///
/// While a session is running or paused the timer service keeps one ongoing
/// notification posted and rewrites its text on every tick. Where that
/// notification ends up is behind the `Indicator` trait.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use serde::Serialize;

/// Channel every timer notification is posted on
pub const CHANNEL_ID: &str = "EchoTimerChannel";

/// The single id the timer notification is posted under
pub const NOTIFICATION_ID: u32 = 1;

/// Title shown on the timer notification
pub const NOTIFICATION_TITLE: &str = "Echo Timer";

/// A notification channel registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationChannel {
    pub id: &'static str,
    pub name: &'static str,
    pub low_importance: bool,
}

/// The channel the timer uses
pub const TIMER_CHANNEL: NotificationChannel = NotificationChannel {
    id: CHANNEL_ID,
    name: "Timer Channel",
    low_importance: true,
};

/// One posted notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: u32,
    pub channel_id: &'static str,
    pub title: String,
    pub text: String,
    /// Ongoing notifications can't be swiped away
    pub ongoing: bool,
}

impl Notification {
    /// The timer notification with the given body text
    pub fn timer(text: impl Into<String>) -> Self {
        Self {
            id: NOTIFICATION_ID,
            channel_id: CHANNEL_ID,
            title: NOTIFICATION_TITLE.to_string(),
            text: text.into(),
            ongoing: true,
        }
    }
}

/// Sink for the timer's notifications
///
/// Posting with an id that is already shown replaces it in place.
pub trait Indicator: Send + Sync {
    /// Register the channel; calling it again is harmless
    fn ensure_channel(&self, channel: &NotificationChannel);

    /// Show or replace a notification
    fn post(&self, notification: &Notification);

    /// Remove a notification if it is shown
    fn cancel(&self, id: u32);
}

/// Indicator that reports through the log
#[derive(Debug, Default)]
pub struct TracingIndicator {
    channel_created: AtomicBool,
}

impl TracingIndicator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Indicator for TracingIndicator {
    fn ensure_channel(&self, channel: &NotificationChannel) {
        if !self.channel_created.swap(true, Ordering::SeqCst) {
            tracing::info!(channel = channel.id, "Registered notification channel '{}'", channel.name);
        }
    }

    fn post(&self, notification: &Notification) {
        tracing::trace!(
            id = notification.id,
            title = %notification.title,
            "{}",
            notification.text
        );
    }

    fn cancel(&self, id: u32) {
        tracing::debug!(id, "Notification removed");
    }
}

/// Everything an indicator was asked to do, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndicatorEvent {
    ChannelCreated(&'static str),
    Posted(Notification),
    Cancelled(u32),
}

/// Indicator that keeps what it was told, for status queries and tests
#[derive(Debug, Default)]
pub struct RecordingIndicator {
    events: Mutex<Vec<IndicatorEvent>>,
    shown: Mutex<Option<Notification>>,
    channels: Mutex<Vec<&'static str>>,
}

impl RecordingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The notification currently shown, if any
    pub fn current(&self) -> Option<Notification> {
        self.shown.lock().ok().and_then(|shown| shown.clone())
    }

    pub fn events(&self) -> Vec<IndicatorEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Registered channel ids, each listed once
    pub fn channels(&self) -> Vec<&'static str> {
        self.channels.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, event: IndicatorEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl Indicator for RecordingIndicator {
    fn ensure_channel(&self, channel: &NotificationChannel) {
        if let Ok(mut channels) = self.channels.lock() {
            if channels.contains(&channel.id) {
                return;
            }
            channels.push(channel.id);
        }
        self.record(IndicatorEvent::ChannelCreated(channel.id));
    }

    fn post(&self, notification: &Notification) {
        if let Ok(mut shown) = self.shown.lock() {
            *shown = Some(notification.clone());
        }
        self.record(IndicatorEvent::Posted(notification.clone()));
    }

    fn cancel(&self, id: u32) {
        if let Ok(mut shown) = self.shown.lock() {
            if shown.as_ref().map(|n| n.id) == Some(id) {
                *shown = None;
            }
        }
        self.record(IndicatorEvent::Cancelled(id));
    }
}
