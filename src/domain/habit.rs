/// Habit entity and related functionality
///
/// This module defines the core Habit struct that represents a user's habit
/// they want to track, along with its validation rules.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::domain::{HabitId, DomainError};

/// Colour new habits get when the caller doesn't choose one
pub const DEFAULT_HABIT_COLOR: u32 = 0xFFD0BCFF;

/// A habit represents something the user wants to do regularly
///
/// Timed habits are tracked with the session stopwatch, the rest are simple
/// checkboxes that get ticked off once a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    /// Store-assigned identifier, `HabitId::UNSAVED` before the first insert
    pub id: HabitId,
    /// Display name (e.g., "Read", "Morning Run")
    pub name: String,
    /// ARGB colour used when rendering the habit
    pub color: u32,
    /// Timer habit or plain checkbox habit
    pub is_timed: bool,
    /// When this habit was created
    pub created_at: DateTime<Utc>,
}

impl Habit {
    /// Create a new, not yet stored habit with validation
    pub fn new(name: String, is_timed: bool, color: Option<u32>) -> Result<Self, DomainError> {
        let name = Self::validate_name(&name)?;

        Ok(Self {
            id: HabitId::UNSAVED,
            name,
            color: color.unwrap_or(DEFAULT_HABIT_COLOR),
            is_timed,
            created_at: Utc::now(),
        })
    }

    /// Create a habit from existing data (used when loading from database)
    ///
    /// This constructor assumes data is already validated and is mainly used
    /// by the storage layer when loading habits from the database.
    pub fn from_existing(
        id: HabitId,
        name: String,
        color: u32,
        is_timed: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            color,
            is_timed,
            created_at,
        }
    }

    /// Build the full replacement record for an edit
    ///
    /// Habits are only ever changed by replacing the whole row, so an edit
    /// produces a copy with the same id and creation time.
    pub fn edited(
        &self,
        name: String,
        is_timed: bool,
        color: Option<u32>,
    ) -> Result<Self, DomainError> {
        let name = Self::validate_name(&name)?;

        Ok(Self {
            id: self.id,
            name,
            color: color.unwrap_or(self.color),
            is_timed,
            created_at: self.created_at,
        })
    }

    /// Short label for the kind of habit
    pub fn kind_label(&self) -> &'static str {
        if self.is_timed {
            "Timed"
        } else {
            "Simple Checkbox"
        }
    }

    /// Validate habit name according to business rules
    fn validate_name(name: &str) -> Result<String, DomainError> {
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Err(DomainError::InvalidHabitName(
                "Habit name cannot be empty".to_string()
            ));
        }

        if trimmed.chars().count() > 100 {
            return Err(DomainError::InvalidHabitName(
                "Habit name cannot be longer than 100 characters".to_string()
            ));
        }

        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_valid_habit() {
        let habit = Habit::new("  Read ".to_string(), true, None);

        assert!(habit.is_ok());
        let habit = habit.unwrap();
        assert_eq!(habit.name, "Read");
        assert!(habit.is_timed);
        assert_eq!(habit.color, DEFAULT_HABIT_COLOR);
        assert!(!habit.id.is_saved());
        assert_eq!(habit.kind_label(), "Timed");
    }

    #[test]
    fn test_invalid_habit_name() {
        assert!(Habit::new("".to_string(), false, None).is_err());
        assert!(Habit::new("   ".to_string(), false, None).is_err());
        assert!(Habit::new("x".repeat(101), false, None).is_err());
    }

    #[test]
    fn test_edit_keeps_identity() {
        let mut habit = Habit::new("Walk".to_string(), false, Some(0xFF112233)).unwrap();
        habit.id = HabitId(7);

        let edited = habit.edited("Evening Walk".to_string(), true, None).unwrap();
        assert_eq!(edited.id, HabitId(7));
        assert_eq!(edited.created_at, habit.created_at);
        assert_eq!(edited.color, 0xFF112233);
        assert_eq!(edited.name, "Evening Walk");
        assert!(edited.is_timed);
    }
}
