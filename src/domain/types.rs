/// Core types and enums used throughout the domain layer
///
/// This module defines the identifier newtypes, the theme preference enum and
/// the local-day helpers that Habit, LogEntry and the derived views share.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use std::fmt;

/// Unique identifier for a habit
///
/// Generated by the store on insert. A value of 0 means "not yet stored";
/// inserting a habit with id 0 lets SQLite assign the next row id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HabitId(pub i64);

impl HabitId {
    /// Placeholder id for a habit that has not been persisted yet
    pub const UNSAVED: HabitId = HabitId(0);

    /// Whether this id was assigned by the store
    pub fn is_saved(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one of the five seeded moods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoodId(pub i64);

impl fmt::Display for MoodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogId(pub i64);

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Colour themes the user can pick from
///
/// Persisted as its ordinal in the preference store, so the variant order
/// is part of the on-disk format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThemeMode {
    /// Follows the system wallpaper colours
    DarkMode1,
    /// Warm gold on dark
    DarkMode2,
    /// Cherry mocha dark
    CherryMocha,
    /// Light cream
    Light,
    /// Yellow, black and cream
    Yellow,
}

impl ThemeMode {
    pub const ALL: [ThemeMode; 5] = [
        ThemeMode::DarkMode1,
        ThemeMode::DarkMode2,
        ThemeMode::CherryMocha,
        ThemeMode::Light,
        ThemeMode::Yellow,
    ];

    /// Ordinal stored in the preference file
    pub fn ordinal(&self) -> i64 {
        match self {
            ThemeMode::DarkMode1 => 0,
            ThemeMode::DarkMode2 => 1,
            ThemeMode::CherryMocha => 2,
            ThemeMode::Light => 3,
            ThemeMode::Yellow => 4,
        }
    }

    /// Look up a theme by ordinal, `None` when out of range
    pub fn from_ordinal(ordinal: i64) -> Option<Self> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Get the display name for this theme
    pub fn display_name(&self) -> &'static str {
        match self {
            ThemeMode::DarkMode1 => "Dark (wallpaper)",
            ThemeMode::DarkMode2 => "Dark (warm gold)",
            ThemeMode::CherryMocha => "Cherry Mocha",
            ThemeMode::Light => "Light",
            ThemeMode::Yellow => "Yellow",
        }
    }

    /// Light themes need dark status bar icons
    pub fn is_light(&self) -> bool {
        matches!(self, ThemeMode::Light | ThemeMode::Yellow)
    }
}

impl Default for ThemeMode {
    fn default() -> Self {
        ThemeMode::DarkMode2
    }
}

/// The first instant of the given local calendar day, in UTC
pub fn start_of_local_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day_in(&Local, date)
}

/// The first instant of `date` in `zone`, in UTC
///
/// A DST gap can swallow midnight; the day then starts at the first local
/// minute that exists.
fn start_of_day_in<Tz: TimeZone>(zone: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    (0..24 * 60)
        .filter_map(|minute| midnight.checked_add_signed(Duration::minutes(minute)))
        .find_map(|local| zone.from_local_datetime(&local).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// The local calendar day a timestamp falls on
pub fn local_date(at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&Local).date_naive()
}

/// Today's local calendar date
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}
